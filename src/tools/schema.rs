//! Declared input shapes for tools

use serde_json::{json, Map, Value};

/// JSON type of a declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    /// Accepts either an integer id or a string
    IntegerOrString,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub description: &'static str,
}

/// Ordered parameter list that renders to a JSON Schema object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSchema {
    params: Vec<Param>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn required(self, name: &'static str, ty: ParamType, description: &'static str) -> Self {
        self.param(name, ty, true, description)
    }

    #[must_use]
    pub fn optional(self, name: &'static str, ty: ParamType, description: &'static str) -> Self {
        self.param(name, ty, false, description)
    }

    fn param(
        mut self,
        name: &'static str,
        ty: ParamType,
        required: bool,
        description: &'static str,
    ) -> Self {
        self.params.push(Param {
            name,
            ty,
            required,
            description,
        });
        self
    }

    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            let ty = match param.ty {
                ParamType::String => json!("string"),
                ParamType::Integer => json!("integer"),
                ParamType::IntegerOrString => json!(["integer", "string"]),
            };
            properties.insert(
                param.name.to_string(),
                json!({ "type": ty, "description": param.description }),
            );
            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
