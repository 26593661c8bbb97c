//! One record kind persisted as a single JSON array.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::instrument;

use super::FallbackError;
use super::seed::Seeded;
use super::storage::{KeyValueStore, LocalStorage};

/// Length of synthesised record ids.
const ID_LEN: usize = 9;

/// Read-modify-write access to one kind's collection.
///
/// Every mutation reads the whole array, applies the change and writes the
/// whole array back. Clones share a lock, so mutations within one process
/// never interleave. Separate processes racing on the same file get last
/// write wins.
pub struct FallbackCollection<R> {
    storage: LocalStorage,
    write_lock: Arc<Mutex<()>>,
    _kind: PhantomData<fn() -> R>,
}

impl<R> Clone for FallbackCollection<R> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            write_lock: Arc::clone(&self.write_lock),
            _kind: PhantomData,
        }
    }
}

impl<R> std::fmt::Debug for FallbackCollection<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackCollection")
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

impl<R: Seeded> FallbackCollection<R> {
    #[must_use]
    pub fn new(storage: LocalStorage) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
            _kind: PhantomData,
        }
    }

    /// The stored collection, or the seed collection if nothing was stored
    /// yet.
    ///
    /// # Errors
    ///
    /// Returns error if storage cannot be read or holds malformed JSON.
    #[instrument(skip(self), fields(key = R::STORAGE_KEY))]
    pub async fn list(&self) -> Result<Vec<R>, FallbackError> {
        self.load().await
    }

    /// Look up one record.
    ///
    /// # Errors
    ///
    /// Returns error if storage cannot be read or holds malformed JSON.
    pub async fn get(&self, id: &R::Id) -> Result<Option<R>, FallbackError> {
        Ok(self.load().await?.into_iter().find(|r| r.id() == id))
    }

    /// Prepend a new record with a synthesised id and the current time.
    ///
    /// # Errors
    ///
    /// Returns error if storage cannot be read or written.
    #[instrument(skip_all, fields(key = R::STORAGE_KEY))]
    pub async fn create(&self, new: R::New) -> Result<R, FallbackError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let id = unused_id(&records);
        let record = R::create(R::Id::from(id), Utc::now(), new);
        records.insert(0, record.clone());

        self.store(&records).await?;
        tracing::debug!(id = %record.id(), "Created fallback record");
        Ok(record)
    }

    /// Merge a patch into the record with `id`.
    ///
    /// Returns the updated record, or `None` if no record has that id; the
    /// stored collection is left untouched in that case.
    ///
    /// # Errors
    ///
    /// Returns error if storage cannot be read or written.
    #[instrument(skip(self, id, patch), fields(key = R::STORAGE_KEY, id = %id))]
    pub async fn update(&self, id: &R::Id, patch: &R::Patch) -> Result<Option<R>, FallbackError> {
        self.rewrite(id, |record| Ok::<_, FallbackError>(record.patched(patch)))
            .await
    }

    /// Derive a patch from the current record with `id` and merge it in,
    /// holding the write lock across the read and the write.
    ///
    /// Returns the updated record, or `None` if no record has that id.
    ///
    /// # Errors
    ///
    /// Returns whatever `change` returns, or a storage failure.
    #[instrument(skip(self, id, change), fields(key = R::STORAGE_KEY, id = %id))]
    pub async fn modify<E>(
        &self,
        id: &R::Id,
        change: impl FnOnce(&R) -> Result<R::Patch, E>,
    ) -> Result<Option<R>, E>
    where
        E: From<FallbackError>,
    {
        self.rewrite(id, |record| Ok(record.patched(&change(record)?)))
            .await
    }

    async fn rewrite<E>(
        &self,
        id: &R::Id,
        replace: impl FnOnce(&R) -> Result<R, E>,
    ) -> Result<Option<R>, E>
    where
        E: From<FallbackError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let Some(slot) = records.iter_mut().find(|r| r.id() == id) else {
            return Ok(None);
        };
        let updated = replace(&*slot)?;
        *slot = updated.clone();

        self.store(&records).await?;
        Ok(Some(updated))
    }

    /// Remove the record with `id`. Returns whether one was removed.
    ///
    /// # Errors
    ///
    /// Returns error if storage cannot be read or written.
    #[instrument(skip(self, id), fields(key = R::STORAGE_KEY, id = %id))]
    pub async fn delete(&self, id: &R::Id) -> Result<bool, FallbackError> {
        let _guard = self.write_lock.lock().await;
        let records = self.load().await?;
        let before = records.len();

        let records: Vec<R> = records.into_iter().filter(|r| r.id() != id).collect();
        let removed = records.len() != before;

        if removed {
            self.store(&records).await?;
        }
        Ok(removed)
    }

    async fn load(&self) -> Result<Vec<R>, FallbackError> {
        match self.storage.get(R::STORAGE_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| FallbackError::Malformed {
                key: R::STORAGE_KEY,
                source,
            }),
            None => R::seed().map_err(|source| FallbackError::Seed {
                kind: R::KIND,
                source,
            }),
        }
    }

    async fn store(&self, records: &[R]) -> Result<(), FallbackError> {
        let raw = serde_json::to_string(records).map_err(|source| FallbackError::Encode {
            key: R::STORAGE_KEY,
            source,
        })?;
        self.storage.set(R::STORAGE_KEY, raw).await
    }
}

/// Random base-36 id not used by any record in `records`.
fn unused_id<R: Seeded>(records: &[R]) -> String {
    loop {
        let id = random_id();
        if !records.iter().any(|r| r.id().to_string() == id) {
            return id;
        }
    }
}

fn random_id() -> String {
    let mut rng = rand::rng();
    std::iter::repeat_with(|| char::from_digit(rng.random_range(0..36), 36))
        .flatten()
        .take(ID_LEN)
        .collect()
}
