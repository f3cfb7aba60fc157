use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::tool_models::{CallToolResult, ToolDefinition, ToolOutput};
use crate::core::slides::SlidesError;

/// A group of tools served by one backend.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definitions(&self) -> Vec<ToolDefinition>;

    async fn call(&self, name: &str, args: &Value) -> Result<ToolOutput, SlidesError>;
}

/// The requested tool is not advertised by any handler. This is a protocol
/// error, not a tool failure.
#[derive(Debug, Error)]
#[error("unknown tool: {0}")]
pub struct UnknownTool(pub String);

/// Routes `tools/call` requests by name.
pub struct ToolDispatcher {
    handlers: Vec<Arc<dyn ToolHandler>>,
    routes: HashMap<String, usize>,
    definitions: Vec<ToolDefinition>,
}

impl ToolDispatcher {
    pub fn new(handlers: Vec<Arc<dyn ToolHandler>>) -> Self {
        let mut routes = HashMap::new();
        let mut definitions = Vec::new();
        for (index, handler) in handlers.iter().enumerate() {
            for definition in handler.definitions() {
                if routes.insert(definition.name.clone(), index).is_some() {
                    tracing::warn!(tool = %definition.name, "Tool registered twice, last handler wins");
                    definitions.retain(|d: &ToolDefinition| d.name != definition.name);
                }
                definitions.push(definition);
            }
        }
        tracing::debug!(tools = definitions.len(), "Tool dispatcher ready");
        Self {
            handlers,
            routes,
            definitions,
        }
    }

    pub fn list(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Runs a tool. Tool failures come back as an error result so the host
    /// agent can see and react to them.
    pub async fn dispatch(&self, name: &str, args: &Value) -> Result<CallToolResult, UnknownTool> {
        let index = *self
            .routes
            .get(name)
            .ok_or_else(|| UnknownTool(name.to_string()))?;

        let started = std::time::Instant::now();
        match self.handlers[index].call(name, args).await {
            Ok(output) => {
                tracing::info!(tool = name, elapsed_ms = started.elapsed().as_millis() as u64, "Tool call succeeded");
                Ok(CallToolResult::success(output))
            }
            Err(err) => {
                tracing::warn!(tool = name, kind = err.kind(), error = %err, "Tool call failed");
                Ok(CallToolResult::failure(&err))
            }
        }
    }
}

/// Deserializes tool arguments, treating a missing object as `{}`.
pub fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T, SlidesError> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args.clone()
    };
    Ok(serde_json::from_value(args)?)
}
