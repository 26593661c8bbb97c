//! Aggregate counts for the dashboard overview.

use serde::Serialize;
use shoebox_core::{Product, User};

use crate::error::DataError;
use crate::services::DataLayer;

/// Headline numbers shown on the overview page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_users: usize,
    pub total_products: usize,
    pub products_in_stock: usize,
    pub products_out_of_stock: usize,
    /// Units on hand across every product and size.
    pub total_units: u64,
    /// Loyalty points held across every user.
    pub total_points: u64,
}

impl DashboardStats {
    /// Load both collections concurrently and summarise them.
    ///
    /// # Errors
    ///
    /// Returns error if either collection cannot be loaded.
    pub async fn collect(layer: &DataLayer) -> Result<Self, DataError> {
        let (users, products) = tokio::try_join!(layer.users().list(), layer.products().list())?;
        Ok(Self::from_records(&users, &products))
    }

    #[must_use]
    pub fn from_records(users: &[User], products: &[Product]) -> Self {
        let products_in_stock = products.iter().filter(|p| p.in_stock()).count();
        Self {
            total_users: users.len(),
            total_products: products.len(),
            products_in_stock,
            products_out_of_stock: products.len() - products_in_stock,
            total_units: products.iter().map(Product::total_stock).sum(),
            total_points: users.iter().map(|u| u64::from(u.points)).sum(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fallback::LocalStorage;
    use shoebox_core::{ProductId, ProductPatch, Size, StockPatch};

    #[tokio::test]
    async fn test_seed_stats() {
        let layer = DataLayer::new(None, LocalStorage::memory());
        let stats = DashboardStats::collect(&layer).await.unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                total_users: 5,
                total_products: 3,
                products_in_stock: 3,
                products_out_of_stock: 0,
                total_units: 29 + 27 + 60,
                total_points: 120 + 450 + 50 + 800,
            }
        );
    }

    #[tokio::test]
    async fn test_sold_out_product_counts_as_out_of_stock() {
        let layer = DataLayer::new(None, LocalStorage::memory());
        let patch = ProductPatch {
            stock: Size::ALL
                .into_iter()
                .fold(StockPatch::default(), |patch, size| patch.with(size, 0)),
            ..ProductPatch::default()
        };
        layer
            .products()
            .update(&ProductId::new("2"), &patch)
            .await
            .unwrap();

        let stats = DashboardStats::collect(&layer).await.unwrap();
        assert_eq!(stats.products_in_stock, 2);
        assert_eq!(stats.products_out_of_stock, 1);
        assert_eq!(stats.total_units, 29 + 60);
    }
}
