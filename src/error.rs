//! Error types for the map assembly pipeline.
//!
//! Errors are categorized by failure class: configuration errors are fatal
//! and never retried, network errors are retried up to the configured budget,
//! cache I/O and codec failures abort the run immediately.

use thiserror::Error;

/// Errors that can occur while fetching or rendering a world map.
#[derive(Debug, Error)]
pub enum PrinterError {
    /// A named cell has no entry in the bulk stats response
    #[error("map stats carry no entry for room {0}")]
    MissingRoomStats(String),

    /// A room owner id has no entry in the bulk users map
    #[error("map stats carry no player entry for owner id {0}")]
    MissingOwner(String),

    /// The mirrored quadrant layout cannot split an odd-sized world
    #[error("map size {width}x{height} is odd; the mirrored quadrant layout needs even dimensions")]
    OddMapSize { width: u32, height: u32 },

    /// HTTP request failed, non-2xx status, or malformed response
    #[error("network error: {0}")]
    Network(String),

    /// Response body was empty where content is required
    #[error("empty response body from {0}")]
    EmptyBody(String),

    /// Cache or filesystem failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Codec could not decode an input or produce required dimensions
    #[error("could not process image for {entity}: {message}")]
    Decode { entity: String, message: String },
}

impl PrinterError {
    /// Builds a [`PrinterError::Decode`] naming the offending entity.
    pub fn decode(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            entity: entity.into(),
            message: message.into(),
        }
    }
}
