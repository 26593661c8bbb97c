//! The bundle of services handed to callers.

use shoebox_core::{Product, ProductId, ProductPatch, Record};

use super::{ProductService, UserService};
use crate::config::ShoeboxConfig;
use crate::error::DataError;
use crate::fallback::{FallbackCollection, LocalStorage};
use crate::images::{ImageStore, ImageUpload};
use crate::remote::RemoteClient;

/// Users, products and images over one remote client and one local store.
#[derive(Debug, Clone)]
pub struct DataLayer {
    users: UserService,
    products: ProductService,
    images: ImageStore,
}

impl DataLayer {
    /// Wire every service to the same remote client and local storage.
    #[must_use]
    pub fn new(remote: Option<RemoteClient>, storage: LocalStorage) -> Self {
        Self {
            users: UserService::new(remote.clone(), FallbackCollection::new(storage.clone())),
            products: ProductService::new(remote.clone(), FallbackCollection::new(storage)),
            images: ImageStore::new(remote),
        }
    }

    /// Build from configuration, keeping fallback files in the configured
    /// data directory.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Remote`] if the remote client cannot be built.
    pub fn from_config(config: &ShoeboxConfig) -> Result<Self, DataError> {
        Self::with_storage(config, LocalStorage::file(&config.data_dir))
    }

    /// Build from configuration with explicit local storage.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Remote`] if the remote client cannot be built.
    pub fn with_storage(config: &ShoeboxConfig, storage: LocalStorage) -> Result<Self, DataError> {
        let remote = match config.remote() {
            Some(remote) => {
                tracing::info!(base_url = %remote.base_url, "Remote store configured");
                Some(RemoteClient::new(remote)?)
            }
            None => {
                tracing::info!("Remote store not configured, using local fallback store only");
                None
            }
        };
        Ok(Self::new(remote, storage))
    }

    #[must_use]
    pub const fn users(&self) -> &UserService {
        &self.users
    }

    #[must_use]
    pub const fn products(&self) -> &ProductService {
        &self.products
    }

    #[must_use]
    pub const fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Upload an image and return a URL usable as a product's `image_url`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Image`] for an empty file.
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<String, DataError> {
        Ok(self.images.upload(upload).await?)
    }

    /// Upload an image and point a product's `image_url` at it.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Image`] for an empty file,
    /// [`DataError::NotFound`] if no product has `id` and anything
    /// [`ProductService::update`] returns. The uploaded image is kept even
    /// when the product is missing.
    pub async fn set_product_image(
        &self,
        id: &ProductId,
        upload: ImageUpload,
    ) -> Result<String, DataError> {
        let url = self.upload_image(upload).await?;
        let patch = ProductPatch {
            image_url: Some(url.clone()),
            ..ProductPatch::default()
        };
        self.products
            .update(id, &patch)
            .await?
            .ok_or_else(|| DataError::NotFound {
                kind: Product::KIND,
                id: id.to_string(),
            })?;
        Ok(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::images::SESSION_PREFIX;

    #[tokio::test]
    async fn test_from_local_config_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShoeboxConfig::local_only(dir.path());
        let layer = DataLayer::from_config(&config).unwrap();
        assert!(!layer.users().has_remote());

        layer.products().delete(&ProductId::new("1")).await.unwrap();
        assert!(dir.path().join("mock_products.json").exists());
        assert!(!dir.path().join("mock_users.json").exists());
    }

    #[tokio::test]
    async fn test_set_product_image_without_remote() {
        let layer = DataLayer::new(None, LocalStorage::memory());
        let id = ProductId::new("3");
        let url = layer
            .set_product_image(&id, ImageUpload::new("trainer.png", vec![0x89, 0x50]))
            .await
            .unwrap();
        assert!(url.starts_with(SESSION_PREFIX));

        let product = layer.products().get(&id).await.unwrap().unwrap();
        assert_eq!(product.image_url.as_deref(), Some(url.as_str()));
        assert!(layer.images().session().resolve(&url).await.is_some());
    }

    #[tokio::test]
    async fn test_set_image_on_missing_product() {
        let layer = DataLayer::new(None, LocalStorage::memory());
        let err = layer
            .set_product_image(
                &ProductId::new("missing"),
                ImageUpload::new("trainer.png", vec![0x89, 0x50]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::NotFound { kind: "product", .. }));
    }
}
