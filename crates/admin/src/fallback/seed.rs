//! First-run collections served before anything has been written locally.

use shoebox_core::{Product, Record, User};

/// A record kind the fallback store can hold.
pub trait Seeded: Record {
    /// Storage key holding the serialised collection.
    const STORAGE_KEY: &'static str;

    /// Raw JSON of the first-run collection.
    const SEED_JSON: &'static str;

    /// Parse the first-run collection.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the bundled seed does not fit the record
    /// shape.
    fn seed() -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(Self::SEED_JSON)
    }
}

impl Seeded for User {
    const STORAGE_KEY: &'static str = "mock_users";
    const SEED_JSON: &'static str = include_str!("../../seed/users.json");
}

impl Seeded for Product {
    const STORAGE_KEY: &'static str = "mock_products";
    const SEED_JSON: &'static str = include_str!("../../seed/products.json");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use shoebox_core::Role;

    #[test]
    fn test_user_seed() {
        let users = User::seed().unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Alice Johnson",
                "Bob Smith",
                "Super Admin",
                "Charlie Brown",
                "Diana Prince"
            ]
        );
        assert_eq!(users[0].points, 120);
        assert_eq!(users[2].role, Role::Admin);
    }

    #[test]
    fn test_product_seed() {
        let products = Product::seed().unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[0].sku, "SH-001");
        assert_eq!(products[0].total_stock(), 29);
        assert_eq!(products[2].total_stock(), 60);
        assert!(products.iter().all(Product::in_stock));
    }
}
