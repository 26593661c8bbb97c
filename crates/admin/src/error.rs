//! Unified error handling for the data layer.

use shoebox_core::ValidationError;
use thiserror::Error;

use crate::fallback::FallbackError;
use crate::images::ImageError;
use crate::remote::RemoteError;

/// Error returned by the caller-facing operations.
///
/// Remote store failures never appear here: those are absorbed by serving
/// the request from the fallback store.
#[derive(Debug, Error)]
pub enum DataError {
    /// Input was rejected before reaching either store.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The fallback store failed.
    #[error("Local store error: {0}")]
    Fallback(#[from] FallbackError),

    /// Image upload failed.
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// Record not found.
    #[error("Not found: {kind} {id}")]
    NotFound { kind: &'static str, id: String },

    /// The remote client could not be constructed.
    #[error("Remote client error: {0}")]
    Remote(#[from] RemoteError),
}

impl DataError {
    /// Whether the failure was caused by the caller's input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound { .. } | Self::Image(ImageError::Empty)
        )
    }
}
