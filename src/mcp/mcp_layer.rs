// The mcp module adapts the core services to the Model Context Protocol:
// JSON-RPC framing, the stdio server loop and the tool handlers.

#[path = "protocol.rs"]
pub mod protocol;

#[path = "server.rs"]
pub mod server;

#[path = "tools/mod.rs"]
pub mod tools;
