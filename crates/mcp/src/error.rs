//! Gateway failure kinds and their JSON-RPC error codes.
//!
//! Every stage of request handling returns [`GatewayResult`]. The codes are part
//! of the wire contract: a not-found lookup is reported in the invalid-params
//! class, and store faults are always internal errors.

use crate::protocol::{
    JsonRpcError, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Classified gateway failure
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Body empty or not valid JSON
    #[error("{message}")]
    Parse {
        message: String,
        detail: Option<String>,
    },

    /// Envelope shape or version tag wrong
    #[error("{0}")]
    InvalidRequest(String),

    /// Method name not recognized
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Missing or malformed method or tool arguments
    #[error("{0}")]
    InvalidParams(String),

    /// Well-formed lookup that matched no visible article
    #[error("Article not found: {key}")]
    ArticleNotFound { field: &'static str, key: String },

    /// Store failure or any other fault
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl GatewayError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            detail: None,
        }
    }

    pub fn parse_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams(message.into())
    }

    pub fn article_not_found(field: &'static str, key: impl Into<String>) -> Self {
        Self::ArticleNotFound {
            field,
            key: key.into(),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::Parse { .. } => PARSE_ERROR,
            Self::InvalidRequest(_) => INVALID_REQUEST,
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) | Self::ArticleNotFound { .. } => INVALID_PARAMS,
            Self::Internal(_) => INTERNAL_ERROR,
        }
    }

    /// Render as the error object of a response envelope
    pub fn to_rpc_error(&self) -> JsonRpcError {
        let error = JsonRpcError::new(self.code(), self.to_string());
        match self {
            Self::Parse {
                detail: Some(detail),
                ..
            } => error.with_data(serde_json::Value::String(detail.clone())),
            Self::ArticleNotFound { field, key } => {
                error.with_data(serde_json::json!({ (*field): key }))
            }
            _ => error,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: "Parse error".to_string(),
            detail: Some(err.to_string()),
        }
    }
}
