//! Remote store adapter.
//!
//! Talks to a PostgREST-style table API plus an object store. Every call is
//! stateless and returns a [`RemoteOutcome`]: the adapter never hands an
//! error back to its caller. Non-success outcomes are logged here and the
//! caller decides where to serve the request from instead.

mod client;

pub use client::RemoteClient;

use thiserror::Error;

use crate::schema::SchemaError;

/// Result of one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum RemoteOutcome<T> {
    /// The store served the request.
    Success(T),
    /// The store could not be reached or refused to serve the table.
    Unavailable(String),
    /// The store rejected the payload, or answered with something that does
    /// not fit the record shape.
    Invalid(String),
}

impl<T> RemoteOutcome<T> {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Failures inside the adapter, before they are folded into an outcome.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport failure, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body was not the expected JSON.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A row or payload did not fit the record shape.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Client could not be constructed.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl RemoteError {
    /// Whether the store looked at the request and refused its content.
    ///
    /// Auth failures and missing tables count as unavailability: the fallback
    /// store can still serve those requests.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        match self {
            Self::Api { status, .. } => matches!(*status, 400 | 409 | 422),
            Self::Parse(_) | Self::Schema(_) => true,
            Self::Http(_) | Self::Url(_) | Self::Config(_) => false,
        }
    }

    fn into_outcome<T>(self) -> RemoteOutcome<T> {
        if self.is_rejection() {
            RemoteOutcome::Invalid(self.to_string())
        } else {
            RemoteOutcome::Unavailable(self.to_string())
        }
    }
}

/// Fold an adapter result into an outcome, logging anything but success.
fn settle<T>(op: &'static str, table: &str, result: Result<T, RemoteError>) -> RemoteOutcome<T> {
    match result {
        Ok(value) => RemoteOutcome::Success(value),
        Err(e) => {
            let outcome = e.into_outcome();
            match &outcome {
                RemoteOutcome::Invalid(reason) => {
                    tracing::warn!(op, table, reason = %reason, "Remote store rejected request");
                }
                RemoteOutcome::Unavailable(reason) => {
                    tracing::warn!(op, table, reason = %reason, "Remote store unavailable");
                }
                RemoteOutcome::Success(_) => {}
            }
            outcome
        }
    }
}
