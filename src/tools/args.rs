//! Shared parsing helpers for tool inputs
//!
//! Models frequently send numeric ids as strings, so integer fields accept
//! either a JSON integer or a digit-only string.

use super::ToolError;
use chrono::NaiveDate;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

fn coerce<E: de::Error>(raw: IntOrString) -> Result<i64, E> {
    match raw {
        IntOrString::Int(n) => Ok(n),
        #[allow(clippy::cast_possible_truncation)]
        IntOrString::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(f as i64),
        IntOrString::Float(f) => Err(E::custom(format!("expected an integer, got {f}"))),
        IntOrString::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("expected an integer, got {s:?}"))),
    }
}

/// `deserialize_with` target for required integer ids
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    coerce(IntOrString::deserialize(deserializer)?)
}

/// Deserialize a tool's input struct, mapping serde errors to a validation failure
pub fn parse_input<T: DeserializeOwned>(tool: &str, input: Value) -> Result<T, ToolError> {
    serde_json::from_value(input).map_err(|e| ToolError::validation(tool, format!("Invalid input: {e}")))
}

/// Parse an optional ISO date. Blank strings count as absent.
pub fn parse_date(
    tool: &str,
    field: &str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, ToolError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ToolError::validation(tool, format!("{field} must be an ISO date (YYYY-MM-DD), got {raw:?}"))
            }),
    }
}
