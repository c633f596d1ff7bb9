//! Compiled JSON Schemas.

use jsonschema::JSONSchema;
use schemars::JsonSchema;
use std::sync::Arc;
use taleweaver_error::{FlowError, FlowErrorKind, TaleweaverResult};

/// A JSON Schema compiled once and shared between executions.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taleweaver_flow::FlowSchema;
///
/// let schema = FlowSchema::new(json!({
///     "type": "object",
///     "required": ["userInput"],
///     "properties": {"userInput": {"type": "string"}}
/// })).unwrap();
///
/// assert!(schema.validate(&json!({"userInput": "go"})).is_ok());
/// let errors = schema.validate(&json!({"userInput": 7})).unwrap_err();
/// assert_eq!(errors.len(), 1);
/// ```
#[derive(Clone)]
pub struct FlowSchema {
    raw: serde_json::Value,
    compiled: Arc<JSONSchema>,
}

impl std::fmt::Debug for FlowSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowSchema").field("raw", &self.raw).finish()
    }
}

impl FlowSchema {
    /// Compile a raw schema document.
    ///
    /// # Errors
    ///
    /// Returns [`FlowErrorKind::InvalidSchema`] if `raw` is not a valid schema.
    pub fn new(raw: serde_json::Value) -> TaleweaverResult<Self> {
        let compiled = JSONSchema::compile(&raw)
            .map_err(|e| FlowError::new(FlowErrorKind::InvalidSchema(e.to_string())))?;
        Ok(Self {
            raw,
            compiled: Arc::new(compiled),
        })
    }

    /// Generate and compile the schema of a Rust type.
    ///
    /// # Errors
    ///
    /// Returns an error if the generated schema cannot be compiled.
    pub fn for_type<T: JsonSchema>() -> TaleweaverResult<Self> {
        let root = schemars::schema_for!(T);
        let raw = serde_json::to_value(root)
            .map_err(|e| FlowError::new(FlowErrorKind::Serialization(e.to_string())))?;
        Self::new(raw)
    }

    /// The schema document.
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    /// Validate an instance, collecting every violation.
    pub fn validate(&self, instance: &serde_json::Value) -> Result<(), Vec<String>> {
        self.compiled.validate(instance).map_err(|errors| {
            errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    #[allow(dead_code)]
    struct Input {
        user_input: String,
        #[serde(default)]
        clear_session: bool,
    }

    #[test]
    fn test_generated_schema_uses_wire_names() {
        let schema = FlowSchema::for_type::<Input>().unwrap();
        assert!(schema.validate(&json!({"userInput": "hi"})).is_ok());
        assert!(schema.validate(&json!({"user_input": "hi"})).is_err());
    }

    #[test]
    fn test_error_names_the_offending_path() {
        let schema = FlowSchema::for_type::<Input>().unwrap();
        let errors = schema
            .validate(&json!({"userInput": "hi", "clearSession": "yes"}))
            .unwrap_err();
        assert!(errors[0].contains("/clearSession"), "{:?}", errors);
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let err = FlowSchema::new(json!({"type": 12})).unwrap_err();
        let flow = err.as_flow().expect("flow error");
        assert!(matches!(flow.kind, FlowErrorKind::InvalidSchema(_)));
    }
}
