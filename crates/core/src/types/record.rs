//! Shared shape of the two record kinds.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::validation::ValidationError;

/// A record kind managed by the data layer (users and products).
///
/// Storage code is written once against this trait: the fallback store keeps a
/// `Vec<R>` per kind and the services route every operation through it.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Typed identifier.
    type Id: Clone + PartialEq + std::fmt::Display + Send + Sync + From<String>;
    /// Creation input (everything except `id` and `created_at`).
    type New: Send + Sync;
    /// Partial update input.
    type Patch: Send + Sync;

    /// Human-readable kind name used in logs.
    const KIND: &'static str;

    /// The record's identifier.
    fn id(&self) -> &Self::Id;

    /// Build a record from creation input plus the store-assigned fields.
    fn create(id: Self::Id, created_at: DateTime<Utc>, new: Self::New) -> Self;

    /// Check creation input.
    ///
    /// # Errors
    ///
    /// Returns the first invariant the input breaks.
    fn validate_new(new: &Self::New) -> Result<(), ValidationError>;

    /// Check update input.
    ///
    /// # Errors
    ///
    /// Returns the first invariant the patch breaks.
    fn validate_patch(patch: &Self::Patch) -> Result<(), ValidationError>;

    /// Return a copy with the patch's set fields merged in.
    ///
    /// `id` and `created_at` are never changed by a patch.
    #[must_use]
    fn patched(&self, patch: &Self::Patch) -> Self;
}
