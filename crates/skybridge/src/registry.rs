//! Tool Registry
//!
//! Name-keyed table of [`ToolDescriptor`]s. Input and output schemas are
//! compiled into validators once, at registration.

use jsonschema::Validator;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::dispatch::InvocationResult;
use crate::types::error::McpError;
use crate::types::tool::Tool;

/// A tool handler: validated arguments in, result out.
pub type HandlerFn =
    Arc<dyn Fn(&Map<String, Value>) -> Result<InvocationResult, McpError> + Send + Sync>;

/// Everything the runtime knows about one tool.
#[derive(Clone)]
pub struct ToolDescriptor {
    tool: Tool,
    output_template: Option<String>,
    handler: HandlerFn,
}

impl ToolDescriptor {
    /// Descriptor with an untyped handler over the raw argument map.
    pub fn new<F>(tool: Tool, handler: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Result<InvocationResult, McpError> + Send + Sync + 'static,
    {
        Self {
            tool,
            output_template: None,
            handler: Arc::new(handler),
        }
    }

    /// Descriptor whose handler takes a typed request. Arguments that do not
    /// deserialize into `Req` are rejected as invalid.
    pub fn typed<Req, F>(tool: Tool, handler: F) -> Self
    where
        Req: DeserializeOwned,
        F: Fn(Req) -> Result<InvocationResult, McpError> + Send + Sync + 'static,
    {
        Self::new(tool, move |args| {
            let request: Req = serde_json::from_value(Value::Object(args.clone()))
                .map_err(|e| McpError::invalid_argument(e.to_string()))?;
            handler(request)
        })
    }

    /// Widget template rendered for this tool's results.
    pub fn with_output_template(mut self, template_id: impl Into<String>) -> Self {
        self.output_template = Some(template_id.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.tool.name
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    pub fn output_template(&self) -> Option<&str> {
        self.output_template.as_deref()
    }

    pub(crate) fn handler(&self) -> &HandlerFn {
        &self.handler
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.tool.name)
            .field("output_template", &self.output_template)
            .finish_non_exhaustive()
    }
}

/// A descriptor plus its compiled validators.
pub struct RegisteredTool {
    descriptor: ToolDescriptor,
    input: Validator,
    output: Option<Validator>,
}

impl RegisteredTool {
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Check arguments against the input schema.
    pub fn validate_input(&self, arguments: &Map<String, Value>) -> Result<(), McpError> {
        let instance = Value::Object(arguments.clone());
        let errors: Vec<String> = self
            .input
            .iter_errors(&instance)
            .map(|e| e.to_string())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(McpError::invalid_argument(errors.join("; ")))
        }
    }

    /// Check a structured payload against the output schema, if declared.
    pub fn validate_output(&self, structured: &Value) -> Result<(), McpError> {
        let Some(validator) = &self.output else {
            return Ok(());
        };
        let errors: Vec<String> = validator
            .iter_errors(structured)
            .map(|e| e.to_string())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(McpError::handler_failure(
                self.descriptor.name(),
                format!("output does not match schema: {}", errors.join("; ")),
            ))
        }
    }
}

/// Registry of tools in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Names are unique; schemas must compile.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), McpError> {
        let name = descriptor.name().to_string();
        if self.index.contains_key(&name) {
            return Err(McpError::DuplicateTool(name));
        }

        let input = compile(&name, "input", &descriptor.tool.input_schema.to_value())?;
        let output = descriptor
            .tool
            .output_schema
            .as_ref()
            .map(|schema| compile(&name, "output", &schema.to_value()))
            .transpose()?;

        tracing::debug!(tool = %name, has_output_schema = output.is_some(), "Registered tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            input,
            output,
        });
        Ok(())
    }

    /// Remove a tool, returning its descriptor.
    pub fn unregister(&mut self, name: &str) -> Result<ToolDescriptor, McpError> {
        let position = self
            .index
            .remove(name)
            .ok_or_else(|| McpError::UnknownTool(name.to_string()))?;
        let removed = self.tools.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Ok(removed.descriptor)
    }

    pub fn get(&self, name: &str) -> Result<&RegisteredTool, McpError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| McpError::UnknownTool(name.to_string()))
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn compile(tool: &str, which: &str, schema: &Value) -> Result<Validator, McpError> {
    jsonschema::validator_for(schema).map_err(|e| {
        McpError::invalid_argument(format!("{} schema for {} does not compile: {}", which, tool, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tool::ToolSchema;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct EchoRequest {
        message: String,
    }

    fn echo_schema() -> ToolSchema {
        ToolSchema::from_value(json!({
            "type": "object",
            "properties": { "message": { "type": "string" } },
            "required": ["message"],
            "additionalProperties": false
        }))
    }

    fn echo(name: &str) -> ToolDescriptor {
        ToolDescriptor::typed(
            Tool::new(name, "Echo a message").with_input_schema(echo_schema()),
            |req: EchoRequest| Ok(InvocationResult::new(req.message.clone(), json!({ "text": req.message }))),
        )
    }

    #[test]
    fn test_register_then_get() {
        let mut registry = ToolRegistry::new();
        registry
            .register(echo("echo").with_output_template("huggies-cards"))
            .unwrap();

        let tool = registry.get("echo").unwrap();
        assert_eq!(tool.descriptor().name(), "echo");
        assert_eq!(tool.descriptor().output_template(), Some("huggies-cards"));
        assert_eq!(
            tool.descriptor().tool().description.as_deref(),
            Some("Echo a message")
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("echo")).unwrap();
        let err = registry.register(echo("echo")).unwrap_err();
        assert_eq!(err, McpError::DuplicateTool("echo".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_unknown() {
        let registry = ToolRegistry::new();
        assert_eq!(
            registry.get("nope").err(),
            Some(McpError::UnknownTool("nope".into()))
        );
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(echo(name)).unwrap();
        }
        let names: Vec<_> = registry.list().map(|d| d.name().to_string()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_unregister_keeps_others_addressable() {
        let mut registry = ToolRegistry::new();
        for name in ["a", "b", "c"] {
            registry.register(echo(name)).unwrap();
        }
        registry.unregister("a").unwrap();

        assert!(registry.get("a").is_err());
        assert_eq!(registry.get("c").unwrap().descriptor().name(), "c");
        assert!(registry.unregister("a").is_err());
    }

    #[test]
    fn test_bad_schema_rejected() {
        let mut registry = ToolRegistry::new();
        let schema = ToolSchema::from_value(json!({
            "type": "object",
            "properties": { "n": { "type": 12 } }
        }));
        let descriptor = ToolDescriptor::new(
            Tool::new("broken", "Broken schema").with_input_schema(schema),
            |_| Ok(InvocationResult::new("", json!({}))),
        );
        let err = registry.register(descriptor).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn test_validate_input() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("echo")).unwrap();
        let tool = registry.get("echo").unwrap();

        let ok = json!({ "message": "hi" });
        assert!(tool.validate_input(ok.as_object().unwrap()).is_ok());

        let missing = Map::new();
        assert_eq!(
            tool.validate_input(&missing).unwrap_err().kind(),
            "invalid_argument"
        );

        let extra = json!({ "message": "hi", "extra": 1 });
        assert!(tool.validate_input(extra.as_object().unwrap()).is_err());

        let wrong_type = json!({ "message": 5 });
        assert!(tool.validate_input(wrong_type.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_validate_output() {
        let mut registry = ToolRegistry::new();
        let output = ToolSchema::from_value(json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        }));
        registry
            .register(ToolDescriptor::new(
                Tool::new("out", "Output checked").with_output_schema(output),
                |_| Ok(InvocationResult::new("", json!({}))),
            ))
            .unwrap();
        let tool = registry.get("out").unwrap();

        assert!(tool.validate_output(&json!({ "text": "ok" })).is_ok());
        let err = tool.validate_output(&json!({ "text": 1 })).unwrap_err();
        assert_eq!(err.kind(), "handler_failure");
    }
}
