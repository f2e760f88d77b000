//! Error types for rendition providers.

use thiserror::Error;

use crate::client::ClientError;
use crate::media_type::MediaType;

/// Errors that can occur during a conversion. Never retried internally.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The provider does not offer the requested target.
    #[error("conversion from {source_type} to {target} is not supported")]
    UnsupportedTarget {
        source_type: MediaType,
        target: MediaType,
    },

    /// The remote call could not be performed.
    #[error("transform request failed: {0}")]
    Transport(#[source] ClientError),

    /// The remote service answered with a non-success status.
    #[error("transform service returned HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    /// Reading the input payload failed.
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// The response body broke off while streaming.
    #[error("failed to read converted content: {0}")]
    Stream(String),

    /// The request could not be built.
    #[error("invalid transform request: {0}")]
    InvalidRequest(String),
}

impl ConversionError {
    /// Creates a remote error, truncating long response bodies.
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        let mut message: String = body.into();
        if message.len() > MAX_MESSAGE_LEN {
            let mut cut = MAX_MESSAGE_LEN;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        Self::Remote { status, message }
    }

    /// Label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedTarget { .. } => "unsupported_target",
            Self::Transport(_) => "transport",
            Self::Remote { .. } => "remote",
            Self::Io(_) => "io",
            Self::Stream(_) => "stream",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

const MAX_MESSAGE_LEN: usize = 512;
