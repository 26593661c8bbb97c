//! Product records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::record::Record;
use super::stock::{SizeRun, StockPatch};
use super::validation::ValidationError;

/// A catalogue item with per-size stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Unit price in the store currency. Carried as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub colour: String,
    #[serde(flatten)]
    pub stock: SizeRun,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Units on hand across all sizes.
    #[must_use]
    pub fn total_stock(&self) -> u64 {
        self.stock.total()
    }

    /// Whether at least one size has stock.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock.in_stock()
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub sku: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub colour: String,
    #[serde(flatten)]
    pub stock: SizeRun,
}

impl NewProduct {
    /// Check creation input before it reaches either store.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] for a blank title or SKU and
    /// [`ValidationError::Negative`] for a price below zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Required { field: "title" });
        }
        if self.sku.trim().is_empty() {
            return Err(ValidationError::Required { field: "sku" });
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(ValidationError::Negative { field: "price" });
        }
        Ok(())
    }
}

/// Partial update for a product. Only set fields are serialised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    /// Counter changes for individual sizes.
    #[serde(flatten)]
    pub stock: StockPatch,
}

impl ProductPatch {
    /// Whether the patch changes anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.price.is_none()
            && self.sku.is_none()
            && self.category.is_none()
            && self.colour.is_none()
            && self.stock.is_empty()
    }

    /// Check update input before it reaches either store.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyUpdate`] for a patch with no fields,
    /// [`ValidationError::Required`] when title or SKU is set to a blank value
    /// and [`ValidationError::Negative`] for a price below zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ValidationError::Required { field: "title" });
        }
        if self.sku.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ValidationError::Required { field: "sku" });
        }
        if self
            .price
            .is_some_and(|p| p.is_sign_negative() && !p.is_zero())
        {
            return Err(ValidationError::Negative { field: "price" });
        }
        Ok(())
    }
}

impl Record for Product {
    type Id = ProductId;
    type New = NewProduct;
    type Patch = ProductPatch;

    const KIND: &'static str = "product";

    fn validate_new(new: &NewProduct) -> Result<(), ValidationError> {
        new.validate()
    }

    fn validate_patch(patch: &ProductPatch) -> Result<(), ValidationError> {
        patch.validate()
    }

    fn id(&self) -> &ProductId {
        &self.id
    }

    fn create(id: ProductId, created_at: DateTime<Utc>, new: NewProduct) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            image_url: new.image_url,
            price: new.price,
            sku: new.sku,
            category: new.category,
            colour: new.colour,
            stock: new.stock,
            created_at,
        }
    }

    fn patched(&self, patch: &ProductPatch) -> Self {
        let mut product = self.clone();
        if let Some(title) = &patch.title {
            product.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            product.description = Some(description.clone());
        }
        if let Some(image_url) = &patch.image_url {
            product.image_url = Some(image_url.clone());
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(sku) = &patch.sku {
            product.sku.clone_from(sku);
        }
        if let Some(category) = &patch.category {
            product.category.clone_from(category);
        }
        if let Some(colour) = &patch.colour {
            product.colour.clone_from(colour);
        }
        patch.stock.apply_to(&mut product.stock);
        product
    }
}
