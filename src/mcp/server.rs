use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::protocol::{
    JsonRpcRequest, JsonRpcResponse, DEFAULT_PROTOCOL_VERSION, INTERNAL_ERROR, INVALID_PARAMS,
    INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND, PARSE_ERROR,
};
use super::tools::ToolDispatcher;

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// MCP server over a line-oriented byte stream. Requests are handled one at
/// a time in arrival order.
pub struct McpServer {
    dispatcher: ToolDispatcher,
    name: String,
    version: String,
}

impl McpServer {
    pub fn new(dispatcher: ToolDispatcher, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            dispatcher,
            name: name.into(),
            version: version.into(),
        }
    }

    /// Serves until the reader reaches EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let Some(response) = self.handle_line(&line).await else {
                continue;
            };
            match response.to_line() {
                Ok(out) => {
                    writer.write_all(out.as_bytes()).await?;
                    writer.flush().await?;
                }
                Err(e) => tracing::error!(error = %e, "Failed to serialize response"),
            }
        }
        tracing::info!("Input closed, shutting down");
        Ok(())
    }

    /// Handles one frame. Notifications produce no response.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable frame");
                return Some(JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("parse error: {}", e)));
            }
        };
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(id, INVALID_REQUEST, format!("invalid request: {}", e)))
            }
        };
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(id, INVALID_REQUEST, "jsonrpc must be \"2.0\""));
        }

        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification received");
            return None;
        }

        let params = request.params.unwrap_or(Value::Null);
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize(&params)),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => match serde_json::to_value(self.dispatcher.list()) {
                Ok(tools) => JsonRpcResponse::success(id, json!({ "tools": tools })),
                Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
            },
            "tools/call" => self.call_tool(id, params).await,
            other => {
                tracing::debug!(method = other, "Unknown method");
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("method not found: {}", other))
            }
        };
        Some(response)
    }

    fn initialize(&self, params: &Value) -> Value {
        let protocol_version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);
        tracing::info!(protocol_version, "Client initialized session");
        json!({
            "protocolVersion": protocol_version,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": self.name, "version": self.version },
        })
    }

    async fn call_tool(&self, id: Value, params: Value) -> JsonRpcResponse {
        let params: CallParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("invalid tools/call params: {}", e))
            }
        };

        match self.dispatcher.dispatch(&params.name, &params.arguments).await {
            Ok(result) => match serde_json::to_value(result) {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
            },
            Err(unknown) => {
                tracing::warn!(tool = %unknown.0, "Call to unknown tool");
                JsonRpcResponse::error(id, INVALID_PARAMS, unknown.to_string())
            }
        }
    }
}
