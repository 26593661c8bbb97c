//! Caller-facing operations over users and products.
//!
//! # Services
//!
//! - [`DataService`] - list/create/update/delete for one record kind, remote
//!   first with transparent fallback
//! - `users` - loyalty point awards
//! - `layer` - [`DataLayer`], the bundle handed to callers
//!
//! Callers never learn which store served a request. Remote failures are
//! logged by the adapter and the request is served locally; only validation
//! and fallback-store failures reach the caller.

mod layer;
pub mod users;

pub use layer::DataLayer;

use shoebox_core::{Product, User};
use tracing::instrument;

use crate::error::DataError;
use crate::fallback::{FallbackCollection, Seeded};
use crate::remote::{RemoteClient, RemoteOutcome};
use crate::schema::Mapped;

/// A record kind that both stores can hold.
pub trait Stored: Seeded + Mapped {}

impl<R: Seeded + Mapped> Stored for R {}

/// Users, remote first.
pub type UserService = DataService<User>;

/// Products, remote first.
pub type ProductService = DataService<Product>;

/// Remote-first operations for one record kind.
pub struct DataService<R> {
    remote: Option<RemoteClient>,
    local: FallbackCollection<R>,
}

impl<R> Clone for DataService<R> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            local: self.local.clone(),
        }
    }
}

impl<R> std::fmt::Debug for DataService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataService")
            .field("remote", &self.remote)
            .field("local", &self.local)
            .finish()
    }
}

impl<R: Stored> DataService<R> {
    #[must_use]
    pub const fn new(remote: Option<RemoteClient>, local: FallbackCollection<R>) -> Self {
        Self { remote, local }
    }

    /// Every record, newest first when served remotely; stored order
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns error only if the request falls back and the local store
    /// fails.
    #[instrument(skip(self), fields(kind = R::KIND))]
    pub async fn list(&self) -> Result<Vec<R>, DataError> {
        if let Some(remote) = &self.remote
            && let RemoteOutcome::Success(records) = remote.list::<R>().await
        {
            tracing::debug!(served_by = "remote", count = records.len(), "Listed records");
            return Ok(records);
        }

        let records = self.local.list().await?;
        tracing::debug!(served_by = "local", count = records.len(), "Listed records");
        Ok(records)
    }

    /// Look up one record by id.
    ///
    /// # Errors
    ///
    /// Same as [`Self::list`].
    pub async fn get(&self, id: &R::Id) -> Result<Option<R>, DataError> {
        Ok(self.list().await?.into_iter().find(|r| r.id() == id))
    }

    /// Create a record and return it with its assigned `id` and
    /// `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Validation`] for invalid input, checked before
    /// either store is touched, and [`DataError::Fallback`] if the local
    /// store fails.
    #[instrument(skip_all, fields(kind = R::KIND))]
    pub async fn create(&self, new: R::New) -> Result<R, DataError> {
        R::validate_new(&new)?;

        if let Some(remote) = &self.remote
            && let RemoteOutcome::Success(record) = remote.create::<R>(&new).await
        {
            tracing::debug!(served_by = "remote", id = %record.id(), "Created record");
            return Ok(record);
        }

        let record = self.local.create(new).await?;
        tracing::debug!(served_by = "local", id = %record.id(), "Created record");
        Ok(record)
    }

    /// Apply a partial update and return the record as written.
    ///
    /// `None` means the store that served the request holds no record with
    /// `id`; nothing was changed.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Validation`] for an empty or invalid patch and
    /// [`DataError::Fallback`] if the local store fails.
    #[instrument(skip(self, id, patch), fields(kind = R::KIND, id = %id))]
    pub async fn update(&self, id: &R::Id, patch: &R::Patch) -> Result<Option<R>, DataError> {
        R::validate_patch(patch)?;

        if let Some(remote) = &self.remote
            && let RemoteOutcome::Success(updated) = remote.update::<R>(id, patch).await
        {
            tracing::debug!(served_by = "remote", found = updated.is_some(), "Updated record");
            return Ok(updated);
        }

        let updated = self.local.update(id, patch).await?;
        tracing::debug!(served_by = "local", found = updated.is_some(), "Updated record");
        Ok(updated)
    }

    /// Derive a patch from the current record with `id` and write it back.
    ///
    /// The read and the write go to the same store. If the remote store
    /// serves the read but not the write, `change` is applied again to the
    /// local record, so a value read remotely never lands in the local store.
    /// Returns `None` when the serving store has no record with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Validation`] if the derived patch is invalid and
    /// [`DataError::Fallback`] if the local store fails.
    #[instrument(skip(self, id, change), fields(kind = R::KIND, id = %id))]
    pub async fn modify<F>(&self, id: &R::Id, change: F) -> Result<Option<R>, DataError>
    where
        F: Fn(&R) -> R::Patch + Send + Sync,
    {
        if let Some(remote) = &self.remote
            && let RemoteOutcome::Success(records) = remote.list::<R>().await
        {
            let Some(current) = records.into_iter().find(|r| r.id() == id) else {
                tracing::debug!(served_by = "remote", found = false, "Modified record");
                return Ok(None);
            };
            let patch = change(&current);
            R::validate_patch(&patch)?;

            if let RemoteOutcome::Success(updated) = remote.update::<R>(id, &patch).await {
                tracing::debug!(served_by = "remote", found = updated.is_some(), "Modified record");
                return Ok(updated);
            }
        }

        let updated = self
            .local
            .modify(id, |current| {
                let patch = change(current);
                R::validate_patch(&patch)?;
                Ok::<_, DataError>(patch)
            })
            .await?;
        tracing::debug!(served_by = "local", found = updated.is_some(), "Modified record");
        Ok(updated)
    }

    /// Delete a record. An unknown `id` is a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Fallback`] if the request falls back and the
    /// local store fails.
    #[instrument(skip(self, id), fields(kind = R::KIND, id = %id))]
    pub async fn delete(&self, id: &R::Id) -> Result<(), DataError> {
        if let Some(remote) = &self.remote
            && remote.delete::<R>(id).await.is_success()
        {
            tracing::debug!(served_by = "remote", "Deleted record");
            return Ok(());
        }

        let removed = self.local.delete(id).await?;
        tracing::debug!(served_by = "local", removed, "Deleted record");
        Ok(())
    }

    /// Whether a remote store is configured for this kind.
    #[must_use]
    pub const fn has_remote(&self) -> bool {
        self.remote.is_some()
    }
}
