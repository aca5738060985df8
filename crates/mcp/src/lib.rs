// MCP (Model Context Protocol) gateway over the article store
// Exposes published articles as resources plus search and lookup tools

pub mod config;
pub mod envelope;
pub mod error;
pub mod format;
pub mod gateway;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use gateway::McpGateway;
pub use server::McpServer;
