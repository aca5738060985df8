//! Method routing for the MCP gateway.
//!
//! [`McpGateway::handle`] is the single entry point: raw bytes go in, and a
//! response envelope always comes out. Validation failures, unknown methods,
//! bad arguments and store faults are all rendered as error envelopes here and
//! never escape as panics or empty bodies.

use crate::config::GatewayConfig;
use crate::envelope::{parse_request, RejectedRequest};
use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{
    InitializeResult, JsonRpcRequest, JsonRpcResponse, ListResourcesResult, ListToolsResult,
    ReadResourceResult, ServerCapabilities, ServerInfo, MCP_PROTOCOL_VERSION,
};
use crate::resources::ResourceCatalog;
use crate::tools::{GetArticleTool, SearchArticlesTool, ToolRegistry};
use knowbase_core::query::QueryEngine;
use knowbase_core::storage::ArticleStore;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Written when even the error envelope cannot be serialized
const FALLBACK_RESPONSE: &str = r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error: failed to serialize response"}}"#;

/// Recognized gateway methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    ResourcesList,
    ResourcesRead,
    ToolsList,
    ToolsCall,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "initialize" => Some(Self::Initialize),
            "resources/list" => Some(Self::ResourcesList),
            "resources/read" => Some(Self::ResourcesRead),
            "tools/list" => Some(Self::ToolsList),
            "tools/call" => Some(Self::ToolsCall),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::ResourcesList => "resources/list",
            Self::ResourcesRead => "resources/read",
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
        }
    }
}

/// Stateless gateway over an article store
pub struct McpGateway {
    resources: ResourceCatalog,
    tools: ToolRegistry,
    server_info: ServerInfo,
}

impl McpGateway {
    /// Gateway with the article resources and the search and lookup tools
    pub fn new(store: Arc<dyn ArticleStore>, config: &GatewayConfig) -> Self {
        let resources = ResourceCatalog::new(store.clone(), config.preview_chars);

        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(SearchArticlesTool::new(
            QueryEngine::new(store),
            config.effective_search_page_size(),
            config.preview_chars,
        )));
        tools.register(Arc::new(GetArticleTool::new(resources.clone())));

        tracing::info!("Registered {} tools", tools.list_schemas().len());

        Self::from_parts(
            resources,
            tools,
            ServerInfo {
                name: config.server_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        )
    }

    pub fn from_parts(resources: ResourceCatalog, tools: ToolRegistry, server_info: ServerInfo) -> Self {
        Self {
            resources,
            tools,
            server_info,
        }
    }

    /// Handle one raw request body
    pub async fn handle(&self, body: &[u8]) -> JsonRpcResponse {
        let request = match parse_request(body) {
            Ok(request) => request,
            Err(RejectedRequest { id, error }) => {
                tracing::debug!("Rejected request envelope: {}", error);
                return JsonRpcResponse::error(id, error.to_rpc_error());
            }
        };

        match self.dispatch(&request).await {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(error) => {
                match &error {
                    GatewayError::Internal(cause) => {
                        tracing::error!(method = %request.method, "Gateway internal error: {:#}", cause)
                    }
                    other => tracing::debug!(method = %request.method, "Request failed: {}", other),
                }
                JsonRpcResponse::error(request.id, error.to_rpc_error())
            }
        }
    }

    /// Handle one raw request body and serialize the response
    pub async fn handle_bytes(&self, body: &[u8]) -> Vec<u8> {
        encode_response(&self.handle(body).await)
    }

    /// Error envelope for a body the transport could not deliver
    pub fn reject_bytes(&self, error: GatewayError) -> Vec<u8> {
        tracing::debug!("Rejected request body: {}", error);
        encode_response(&JsonRpcResponse::error(Value::Null, error.to_rpc_error()))
    }

    /// Route a validated request to its handler
    pub async fn dispatch(&self, request: &JsonRpcRequest) -> GatewayResult<Value> {
        let method = Method::from_name(&request.method)
            .ok_or_else(|| GatewayError::MethodNotFound(request.method.clone()))?;

        tracing::debug!(method = method.as_str(), "Dispatching request");

        match method {
            Method::Initialize => to_result(self.initialize()),
            Method::ResourcesList => to_result(ListResourcesResult {
                resources: self.resources.list()?,
            }),
            Method::ResourcesRead => {
                let uri = match request.params.get("uri") {
                    Some(Value::String(uri)) if !uri.is_empty() => uri,
                    _ => {
                        return Err(GatewayError::invalid_params(
                            "URI parameter is required and must be a non-empty string",
                        ))
                    }
                };
                to_result(ReadResourceResult {
                    contents: vec![self.resources.read(uri)?],
                })
            }
            Method::ToolsList => to_result(ListToolsResult {
                tools: self.tools.list_schemas(),
            }),
            Method::ToolsCall => {
                let result = self
                    .tools
                    .call(request.params.get("name"), request.params.get("arguments"))
                    .await?;
                to_result(result)
            }
        }
    }

    pub fn initialize(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: self.server_info.clone(),
        }
    }
}

fn encode_response(response: &JsonRpcResponse) -> Vec<u8> {
    serde_json::to_vec(response).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize response: {}", e);
        FALLBACK_RESPONSE.as_bytes().to_vec()
    })
}

fn to_result(value: impl Serialize) -> GatewayResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| GatewayError::Internal(anyhow::Error::new(e).context("Failed to serialize result")))
}
