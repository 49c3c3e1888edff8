//! REST client errors

use std::time::Duration;
use thiserror::Error;

use super::ResponseData;

/// Failure of a REST call
///
/// Non-2xx responses keep the status line and the best-effort parsed body.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("HTTP {status} {status_text}: {}", .data.summary())]
    Status {
        status: u16,
        status_text: String,
        data: ResponseData,
    },

    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("failed to decode response: {message}")]
    Decode { message: String },

    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid header: {name}")]
    InvalidHeader { name: String },

    #[error("failed to build HTTP client: {message}")]
    Client { message: String },
}

impl ApiError {
    /// HTTP status of an error response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn status_text(&self) -> Option<&str> {
        match self {
            Self::Status { status_text, .. } => Some(status_text),
            _ => None,
        }
    }

    /// Parsed body of an error response
    pub fn data(&self) -> Option<&ResponseData> {
        match self {
            Self::Status { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub(crate) fn decode(error: impl std::fmt::Display) -> Self {
        Self::Decode {
            message: error.to_string(),
        }
    }
}
