//! User-specific operations.

use shoebox_core::{Record, User, UserId, UserPatch};
use tracing::instrument;

use super::UserService;
use crate::error::DataError;

/// Points added by the dashboard's quick award action.
pub const DEFAULT_AWARD: u32 = 100;

impl UserService {
    /// Add loyalty points to a user and return the record as written.
    ///
    /// The balance is read from and written back to the same store, saturating
    /// at `u32::MAX`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if the store that serves the write has
    /// no user with `id`, plus anything [`UserService::modify`] returns.
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn award_points(&self, id: &UserId, points: u32) -> Result<User, DataError> {
        let updated = self
            .modify(id, |user| UserPatch::points(user.points.saturating_add(points)))
            .await?
            .ok_or_else(|| DataError::NotFound {
                kind: User::KIND,
                id: id.to_string(),
            })?;

        tracing::info!(points = updated.points, "Awarded loyalty points");
        Ok(updated)
    }
}
