//! Error taxonomy for editing, comparison and backend resolution.
//!
//! Every fallible operation returns [`GrafikaError`]. Errors are raised at the
//! call that detects them and are never retried internally; a failed operation
//! leaves the previously active surface intact.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse grouping of [`GrafikaError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// An operation needed an open image and none was set.
    NoActiveImage,
    /// Bad mode, name, geometry or value supplied by the caller.
    InvalidArgument,
    /// Every candidate backend failed its capability probe.
    NoBackendAvailable,
    /// Reading, decoding, encoding or writing failed.
    IoFailure,
}

#[derive(Error, Debug)]
pub enum GrafikaError {
    #[error("No image to edit")]
    NoActiveImage,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No supported backend (tried: {})", tried.join(", "))]
    NoBackendAvailable { tried: Vec<String> },

    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode '{}': {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Unusable font '{}': {message}", path.display())]
    Font { path: PathBuf, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GrafikaError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoActiveImage => ErrorCategory::NoActiveImage,
            Self::InvalidArgument(_) | Self::Config(ConfigError::Validation(_)) => {
                ErrorCategory::InvalidArgument
            }
            Self::NoBackendAvailable { .. } => ErrorCategory::NoBackendAvailable,
            Self::Io { .. }
            | Self::Decode { .. }
            | Self::Encode { .. }
            | Self::Font { .. }
            | Self::Config(_) => ErrorCategory::IoFailure,
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, GrafikaError>;
