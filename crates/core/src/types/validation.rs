//! Validation errors for record input.

/// Errors raised when create or update input breaks a record invariant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required {
        /// Internal field name.
        field: &'static str,
    },
    /// A numeric field is below zero.
    #[error("{field} must not be negative")]
    Negative {
        /// Internal field name.
        field: &'static str,
    },
    /// An update carried no fields.
    #[error("update has no fields to change")]
    EmptyUpdate,
}
