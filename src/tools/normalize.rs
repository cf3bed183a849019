//! Argument normalization before dispatch
//!
//! Local models are inconsistent about how they name and type tool
//! arguments. Each tool declares an [`ArgumentRule`]; the runtime applies it
//! to the raw model arguments before the tool sees them.

#[cfg(test)]
mod proptests;

use super::ToolError;
use crate::llm::POSITIONAL_ARGUMENT;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Keys accepted for a search value, in priority order
pub const SEARCH_ALIASES: [&str; 3] = ["search_term", POSITIONAL_ARGUMENT, "id"];

/// How a tool wants its raw arguments rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgumentRule {
    /// Forward the arguments unchanged
    #[default]
    Passthrough,
    /// Collapse `search_term` / `__arg1` / `id` into a single [`Lookup`]
    SearchTerm,
    /// Fill a missing `codename` from the most recent codename-bearing result
    RecoverCodename,
    /// Discard whatever the model sent
    NoArguments,
}

/// A search request resolved to either an id lookup or a text search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Identifier(i64),
    SearchTerm(String),
}

impl Lookup {
    pub fn to_args(&self) -> Value {
        match self {
            Lookup::Identifier(id) => json!({ "id": id }),
            Lookup::SearchTerm(term) => json!({ "search_term": term }),
        }
    }
}

/// An all-digit value too large for a Ghostwriter id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("id {0} is out of range")]
pub struct IdOutOfRange(pub String);

/// Classify a raw argument value.
///
/// Integers and digit-only strings are identifiers; any other string is a
/// search term. Null, booleans, arrays and objects carry no usable value.
pub fn classify(value: &Value) -> Result<Option<Lookup>, IdOutOfRange> {
    Ok(match value {
        Value::Number(n) => {
            if let Some(id) = n.as_i64() {
                Some(Lookup::Identifier(id))
            } else if n.is_u64() {
                return Err(IdOutOfRange(n.to_string()));
            } else {
                match n.as_f64() {
                    #[allow(clippy::cast_possible_truncation)]
                    Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => {
                        Some(Lookup::Identifier(f as i64))
                    }
                    _ => Some(Lookup::SearchTerm(n.to_string())),
                }
            }
        }
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            let id = s.parse().map_err(|_| IdOutOfRange(s.clone()))?;
            Some(Lookup::Identifier(id))
        }
        Value::String(s) => Some(Lookup::SearchTerm(s.clone())),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Classify the first alias holding a usable value
fn search_value(args: &Value) -> Option<Result<Lookup, IdOutOfRange>> {
    match args {
        Value::Object(map) => SEARCH_ALIASES.iter().find_map(|key| {
            map.get(*key)
                .filter(|v| !is_blank(v))
                .and_then(|v| classify(v).transpose())
        }),
        // A bare scalar payload is the positional argument
        Value::String(_) | Value::Number(_) if !is_blank(args) => classify(args).transpose(),
        _ => None,
    }
}

/// Resolve search-family arguments to a single [`Lookup`]
pub fn lookup(tool: &str, args: &Value) -> Result<Lookup, ToolError> {
    match search_value(args) {
        Some(Ok(lookup)) => Ok(lookup),
        Some(Err(e)) => Err(ToolError::validation(tool, e.to_string())),
        None => Err(ToolError::validation(
            tool,
            "a search value is required: provide search_term or id",
        )),
    }
}

/// Values remembered across tool results within one conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentMemory {
    pub last_known_codename: Option<String>,
}

impl ArgumentMemory {
    /// Rebuild memory by replaying earlier tool results in order
    pub fn replay<'a>(results: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut memory = Self::default();
        for result in results {
            memory.observe(result);
        }
        memory
    }

    /// Record a tool result. Only a top-level object with a string
    /// `codename` updates the memory; the most recent one wins.
    pub fn observe(&mut self, result: &Value) {
        if let Some(codename) = result.get("codename").and_then(Value::as_str) {
            if result.is_object() {
                self.last_known_codename = Some(codename.to_string());
            }
        }
    }
}

/// Apply a tool's argument rule to raw model arguments
pub fn normalize(
    tool: &str,
    rule: ArgumentRule,
    args: Value,
    memory: &ArgumentMemory,
) -> Result<Value, ToolError> {
    match rule {
        ArgumentRule::Passthrough => Ok(match args {
            Value::Null => Value::Object(Map::new()),
            other => other,
        }),
        ArgumentRule::NoArguments => Ok(Value::Object(Map::new())),
        ArgumentRule::SearchTerm => Ok(lookup(tool, &args)?.to_args()),
        ArgumentRule::RecoverCodename => Ok(recover_codename(tool, args, memory)),
    }
}

fn recover_codename(tool: &str, args: Value, memory: &ArgumentMemory) -> Value {
    let mut map = match args {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => return other,
    };

    let missing = map.get("codename").map_or(true, Value::is_null);
    if missing {
        map.remove("codename");
        if let Some(codename) = &memory.last_known_codename {
            tracing::debug!(tool, codename = %codename, "Recovered codename from earlier result");
            map.insert("codename".to_string(), Value::String(codename.clone()));
        }
    }

    Value::Object(map)
}
