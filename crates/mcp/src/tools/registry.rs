// MCP tool definitions and the registry that dispatches them

use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{CallToolResult, ToolSchema};
use std::collections::HashMap;
use std::sync::Arc;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with an arguments object
    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> GatewayResult<CallToolResult>;
}

/// Registry of available tools, listed in registration order
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a tool, replacing any earlier tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        if let Some(&index) = self.by_name.get(&name) {
            self.tools[index] = tool;
            return;
        }
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.by_name.get(name).map(|&index| self.tools[index].clone())
    }

    /// List all tool schemas
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Validate `tools/call` params and run the named tool
    pub async fn call(
        &self,
        name: Option<&serde_json::Value>,
        arguments: Option<&serde_json::Value>,
    ) -> GatewayResult<CallToolResult> {
        let name = match name {
            Some(serde_json::Value::String(name)) if !name.trim().is_empty() => name.as_str(),
            _ => {
                return Err(GatewayError::invalid_params(
                    "Tool name is required and must be a non-empty string",
                ))
            }
        };

        let tool = self
            .get(name)
            .ok_or_else(|| GatewayError::invalid_params(format!("Unknown tool: {}", name)))?;

        let arguments = match arguments {
            None | Some(serde_json::Value::Null) => serde_json::Map::new(),
            Some(serde_json::Value::Object(arguments)) => arguments.clone(),
            Some(_) => return Err(GatewayError::invalid_params("Arguments must be an object")),
        };

        tracing::debug!(tool = name, "Calling tool");
        tool.execute(arguments).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

/// Required string argument, trimmed and non-empty
pub fn required_string<'a>(
    arguments: &'a serde_json::Map<String, serde_json::Value>,
    name: &str,
) -> GatewayResult<&'a str> {
    match arguments.get(name) {
        Some(serde_json::Value::String(value)) if !value.trim().is_empty() => Ok(value.trim()),
        Some(serde_json::Value::String(_)) | None | Some(serde_json::Value::Null) => Err(
            GatewayError::invalid_params(format!(
                "{} parameter is required and must be a non-empty string",
                name
            )),
        ),
        Some(_) => Err(GatewayError::invalid_params(format!(
            "{} parameter must be a string",
            name
        ))),
    }
}

/// Required string argument, taken exactly as sent
pub fn required_exact_string<'a>(
    arguments: &'a serde_json::Map<String, serde_json::Value>,
    name: &str,
) -> GatewayResult<&'a str> {
    match arguments.get(name) {
        Some(serde_json::Value::String(value)) if !value.is_empty() => Ok(value),
        Some(serde_json::Value::String(_)) | None | Some(serde_json::Value::Null) => Err(
            GatewayError::invalid_params(format!(
                "{} parameter is required and must be a non-empty string",
                name
            )),
        ),
        Some(_) => Err(GatewayError::invalid_params(format!(
            "{} parameter must be a string",
            name
        ))),
    }
}

/// Optional string argument; blank strings count as absent
pub fn optional_string<'a>(
    arguments: &'a serde_json::Map<String, serde_json::Value>,
    name: &str,
) -> GatewayResult<Option<&'a str>> {
    match arguments.get(name) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(value)) => {
            let value = value.trim();
            Ok((!value.is_empty()).then_some(value))
        }
        Some(_) => Err(GatewayError::invalid_params(format!(
            "{} parameter must be a string",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool(&'static str);

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.0.to_string(),
                description: "Echo arguments".to_string(),
                input_schema: json_schema_object(json!({}), vec![]),
            }
        }

        async fn execute(
            &self,
            arguments: serde_json::Map<String, serde_json::Value>,
        ) -> GatewayResult<CallToolResult> {
            Ok(CallToolResult::text(serde_json::Value::Object(arguments).to_string()))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool("zeta")));
        registry.register(Arc::new(EchoTool("alpha")));
        registry
    }

    #[test]
    fn test_schemas_keep_registration_order() {
        let registry = registry();
        let names: Vec<String> = registry.list_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert!(registry.get("alpha").is_some());
        assert!(registry.get("beta").is_none());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = registry();
        registry.register(Arc::new(EchoTool("zeta")));
        assert_eq!(registry.list_schemas().len(), 2);
    }

    #[tokio::test]
    async fn test_call_validates_name_and_arguments() {
        let registry = registry();

        let err = registry.call(None, None).await.unwrap_err();
        assert_eq!(err.code(), -32602);

        let err = registry.call(Some(&json!("")), None).await.unwrap_err();
        assert_eq!(err.code(), -32602);

        let err = registry.call(Some(&json!("nope")), None).await.unwrap_err();
        assert_eq!(err.code(), -32602);
        assert_eq!(err.to_string(), "Unknown tool: nope");

        let err = registry
            .call(Some(&json!("alpha")), Some(&json!([1, 2])))
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32602);

        let ok = registry.call(Some(&json!("alpha")), None).await.unwrap();
        assert_eq!(ok, CallToolResult::text("{}"));
    }

    #[test]
    fn test_argument_helpers() {
        let args = json!({ "q": "  rust ", "blank": " ", "n": 3 });
        let args = args.as_object().unwrap();

        assert_eq!(required_string(args, "q").unwrap(), "rust");
        assert!(required_string(args, "blank").is_err());
        assert!(required_string(args, "missing").is_err());
        assert!(required_string(args, "n").is_err());

        assert_eq!(required_exact_string(args, "q").unwrap(), "  rust ");
        assert_eq!(required_exact_string(args, "blank").unwrap(), " ");
        assert!(required_exact_string(&serde_json::Map::new(), "q").is_err());
        assert!(required_exact_string(args, "n").is_err());

        assert_eq!(optional_string(args, "q").unwrap(), Some("rust"));
        assert_eq!(optional_string(args, "blank").unwrap(), None);
        assert_eq!(optional_string(args, "missing").unwrap(), None);
        assert!(optional_string(args, "n").is_err());
    }
}
