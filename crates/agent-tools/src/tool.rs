use agent_core::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Something an agent (or the CLI) can call with JSON parameters
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique within a registry
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the parameters object
    fn input_schema(&self) -> Value;

    async fn execute(&self, params: Value) -> Result<Value>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Serializable description of a tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Names listed under the schema's `required` key
    pub fn required_params(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Check that `params` is an object holding every required parameter
    pub fn validate(&self, params: &Value) -> Result<()> {
        let Some(object) = params.as_object() else {
            return Err(Error::InvalidParams(format!(
                "{}: parameters must be a JSON object",
                self.name
            )));
        };
        let missing: Vec<&str> = self
            .required_params()
            .into_iter()
            .filter(|name| object.get(*name).is_none_or(Value::is_null))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidParams(format!(
                "{}: missing required parameter(s): {}",
                self.name,
                missing.join(", ")
            )))
        }
    }
}
