//! HTTP client for the hosted table and object store.

use std::fmt::Display;
use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::instrument;
use url::Url;

use super::{RemoteError, RemoteOutcome, settle};
use crate::config::RemoteConfig;
use crate::schema::Mapped;

/// Single-row responses instead of one-element arrays.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Longest error body kept in a failure reason.
const MAX_ERROR_BODY: usize = 200;

/// Remote store client.
///
/// Built explicitly from a [`RemoteConfig`] and cheap to clone; every clone
/// shares one connection pool.
#[derive(Clone)]
pub struct RemoteClient {
    inner: Arc<RemoteClientInner>,
}

struct RemoteClientInner {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl RemoteClient {
    /// Create a new remote store client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();

        let mut api_key = HeaderValue::from_str(config.api_key_str())
            .map_err(|e| RemoteError::Config(format!("Invalid API key format: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key_str()))
            .map_err(|e| RemoteError::Config(format!("Invalid API key format: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(RemoteClientInner {
                client,
                config: config.clone(),
            }),
        })
    }

    /// Configuration this client was built from.
    #[must_use]
    pub fn config(&self) -> &RemoteConfig {
        &self.inner.config
    }

    /// List every row of `R`'s table, newest first.
    ///
    /// Rows that do not fit the record shape are skipped with a warning.
    #[instrument(skip(self), fields(kind = R::KIND))]
    pub async fn list<R: Mapped>(&self) -> RemoteOutcome<Vec<R>> {
        let table = R::table(self.config());
        settle("list", table, self.try_list::<R>(table).await)
    }

    /// Insert one row and return it as stored, with its assigned `id` and
    /// `created_at`.
    #[instrument(skip_all, fields(kind = R::KIND))]
    pub async fn create<R: Mapped>(&self, new: &R::New) -> RemoteOutcome<R> {
        let table = R::table(self.config());
        settle("create", table, self.try_create::<R>(table, new).await)
    }

    /// Apply a partial update and return the row as stored. An unknown `id`
    /// matches no rows and succeeds with `None`.
    #[instrument(skip(self, id, patch), fields(kind = R::KIND, id = %id))]
    pub async fn update<R: Mapped>(
        &self,
        id: &R::Id,
        patch: &R::Patch,
    ) -> RemoteOutcome<Option<R>> {
        let table = R::table(self.config());
        settle("update", table, self.try_update::<R>(table, id, patch).await)
    }

    /// Delete one row. An unknown `id` matches no rows and still succeeds.
    #[instrument(skip(self, id), fields(kind = R::KIND, id = %id))]
    pub async fn delete<R: Mapped>(&self, id: &R::Id) -> RemoteOutcome<()> {
        let table = R::table(self.config());
        settle("delete", table, self.try_delete(table, id).await)
    }

    /// Upload an object into the image bucket and return its public URL.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_object(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> RemoteOutcome<String> {
        let bucket = &self.config().image_bucket;
        settle(
            "upload",
            bucket,
            self.try_upload(bucket, path, content_type, bytes).await,
        )
    }

    /// Public URL of an object in the image bucket.
    ///
    /// # Errors
    ///
    /// Returns error if the path does not form a valid URL.
    pub fn public_url(&self, path: &str) -> Result<Url, RemoteError> {
        let bucket = &self.config().image_bucket;
        Ok(self
            .config()
            .base_url
            .join(&format!("storage/v1/object/public/{bucket}/{path}"))?)
    }

    // =========================================================================
    // Requests
    // =========================================================================

    async fn try_list<R: Mapped>(&self, table: &str) -> Result<Vec<R>, RemoteError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");

        let response = self.inner.client.get(url).send().await?;
        let rows: Vec<Value> = json_body(response).await?;

        let schema = R::schema();
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match schema.decode::<R>(row) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(table, error = %e, "Skipping malformed row"),
            }
        }
        Ok(records)
    }

    async fn try_create<R: Mapped>(&self, table: &str, new: &R::New) -> Result<R, RemoteError> {
        let body = R::schema().encode(new)?;
        let url = self.table_url(table)?;

        let response = self
            .inner
            .client
            .post(url)
            .header("Prefer", "return=representation")
            .header(ACCEPT, SINGLE_OBJECT)
            .json(&body)
            .send()
            .await?;
        let row: Value = json_body(response).await?;

        Ok(R::schema().decode(row)?)
    }

    async fn try_update<R: Mapped>(
        &self,
        table: &str,
        id: &R::Id,
        patch: &R::Patch,
    ) -> Result<Option<R>, RemoteError> {
        let mut body = R::schema().encode(patch)?;
        body.extend(R::write_only(patch));

        let response = self
            .inner
            .client
            .patch(self.row_url(table, id)?)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        let rows: Vec<Value> = json_body(response).await?;

        // `id` is the primary key: at most one row matches.
        match rows.into_iter().next() {
            Some(row) => Ok(Some(R::schema().decode(row)?)),
            None => Ok(None),
        }
    }

    async fn try_delete(&self, table: &str, id: &impl Display) -> Result<(), RemoteError> {
        let response = self
            .inner
            .client
            .delete(self.row_url(table, id)?)
            .send()
            .await?;
        empty_body(response).await
    }

    async fn try_upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, RemoteError> {
        let url = self
            .config()
            .base_url
            .join(&format!("storage/v1/object/{bucket}/{path}"))?;

        let response = self
            .inner
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        empty_body(response).await?;

        Ok(self.public_url(path)?.into())
    }

    // =========================================================================
    // URLs
    // =========================================================================

    fn table_url(&self, table: &str) -> Result<Url, RemoteError> {
        Ok(self.config().base_url.join(&format!("rest/v1/{table}"))?)
    }

    fn row_url(&self, table: &str, id: &impl Display) -> Result<Url, RemoteError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }
}

/// Check the status and parse the JSON body.
async fn json_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, RemoteError> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    response
        .json()
        .await
        .map_err(|e| RemoteError::Parse(format!("Failed to parse response: {e}")))
}

/// Check the status and discard the body.
async fn empty_body(response: reqwest::Response) -> Result<(), RemoteError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(api_error(response).await)
    }
}

async fn api_error(response: reqwest::Response) -> RemoteError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or(body);
    RemoteError::Api {
        status,
        message: message.chars().take(MAX_ERROR_BODY).collect(),
    }
}
