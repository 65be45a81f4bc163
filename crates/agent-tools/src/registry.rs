use crate::{Tool, ToolDefinition};
use agent_core::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tools by name, listed in name order
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool; a later tool with the same name replaces the earlier one
    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = name.as_str(), "Replacing registered tool");
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    /// Validate `params` against the tool's schema, then run it
    pub async fn execute(&self, name: &str, params: Value) -> Result<Value> {
        let tool = self.get(name).ok_or_else(|| Error::UnknownTool {
            name: name.to_string(),
            available: self.names().collect::<Vec<_>>().join(", "),
        })?;
        tool.definition().validate(&params)?;
        debug!(tool = name, "Executing tool");
        tool.execute(params).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct PercentChange;

    #[async_trait]
    impl Tool for PercentChange {
        fn name(&self) -> &str {
            "percent_change"
        }

        fn description(&self) -> &str {
            "Percent change between two prices"
        }

        fn input_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "from": { "type": "number" },
                    "to": { "type": "number" }
                },
                "required": ["from", "to"]
            })
        }

        async fn execute(&self, params: Value) -> Result<Value> {
            let from = params["from"].as_f64().unwrap_or_default();
            let to = params["to"].as_f64().unwrap_or_default();
            Ok(json!({ "change_pct": (to - from) / from * 100.0 }))
        }
    }

    #[tokio::test]
    async fn test_execute_by_name() {
        let registry = ToolRegistry::new().with_tool(Arc::new(PercentChange));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["percent_change"]);

        let result = registry
            .execute("percent_change", json!({ "from": 200.0, "to": 210.0 }))
            .await
            .unwrap();
        assert_eq!(result["change_pct"], 5.0);
    }

    #[tokio::test]
    async fn test_missing_parameter_is_rejected() {
        let registry = ToolRegistry::new().with_tool(Arc::new(PercentChange));
        let err = registry
            .execute("percent_change", json!({ "from": 200.0 }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing required parameter(s): to"));
    }

    #[tokio::test]
    async fn test_unknown_tool_lists_available() {
        let registry = ToolRegistry::new().with_tool(Arc::new(PercentChange));
        let err = registry.execute("stock_data", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("Unknown tool 'stock_data'"));
        assert!(err.to_string().contains("percent_change"));
    }

    #[test]
    fn test_definitions() {
        let registry = ToolRegistry::new().with_tool(Arc::new(PercentChange));
        let definitions = registry.definitions();
        assert_eq!(definitions[0].name, "percent_change");
        assert_eq!(definitions[0].required_params(), vec!["from", "to"]);
    }
}
