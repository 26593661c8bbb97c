//! Search and pagination over loaded collections.

use shoebox_core::{Product, User};

/// Rows per page of the user table.
pub const USERS_PAGE_SIZE: usize = 7;

/// Rows per page of the product table.
pub const PRODUCTS_PAGE_SIZE: usize = 10;

/// Free-text user search.
///
/// Matches name, email, city and country case-insensitively, and the two
/// phone numbers as plain substrings. A blank query matches everyone.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    needle: String,
}

impl UserFilter {
    #[must_use]
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.trim().to_lowercase(),
        }
    }

    #[must_use]
    pub fn matches(&self, user: &User) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        [&user.name, &user.email, &user.city, &user.country]
            .iter()
            .any(|field| field.to_lowercase().contains(&self.needle))
            || user.phone1.contains(&self.needle)
            || user.phone2.contains(&self.needle)
    }

    /// Keep the matching users, in order.
    #[must_use]
    pub fn apply(&self, users: Vec<User>) -> Vec<User> {
        users.into_iter().filter(|u| self.matches(u)).collect()
    }
}

/// Free-text product search over title, SKU and category.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    needle: String,
}

impl ProductFilter {
    #[must_use]
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.trim().to_lowercase(),
        }
    }

    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.needle.is_empty()
            || [&product.title, &product.sku, &product.category]
                .iter()
                .any(|field| field.to_lowercase().contains(&self.needle))
    }

    /// Keep the matching products, in order.
    #[must_use]
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served.
    pub number: usize,
    /// At least 1, even for an empty collection.
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    /// Cut page `number` out of `items`.
    ///
    /// Page numbers are 1-based and clamped into range, so page 0 serves
    /// page 1 and anything past the end serves the last page.
    #[must_use]
    pub fn of(items: Vec<T>, number: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_items = items.len();
        let total_pages = total_items.div_ceil(page_size).max(1);
        let number = number.clamp(1, total_pages);

        let items = items
            .into_iter()
            .skip((number - 1) * page_size)
            .take(page_size)
            .collect();

        Self {
            items,
            number,
            total_pages,
            total_items,
        }
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fallback::Seeded;

    #[test]
    fn test_user_filter() {
        let users = User::seed().unwrap();

        let names = |query: &str| -> Vec<String> {
            UserFilter::new(query)
                .apply(users.clone())
                .into_iter()
                .map(|u| u.name)
                .collect()
        };

        assert_eq!(names("").len(), 5);
        assert_eq!(names("ALICE"), ["Alice Johnson"]);
        assert_eq!(names("usa"), ["Alice Johnson", "Super Admin"]);
        assert_eq!(names("555-99"), ["Super Admin"]);
        assert_eq!(names("0200"), ["Diana Prince"]);
        assert!(names("nobody").is_empty());
    }

    #[test]
    fn test_product_filter() {
        let products = Product::seed().unwrap();
        let filter = ProductFilter::new("sh-002");
        let hits = filter.apply(products.clone());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.first().unwrap().title, "Urban Sneaker");

        assert_eq!(ProductFilter::new("footwear").apply(products).len(), 3);
    }

    #[test]
    fn test_pages() {
        let items: Vec<u32> = (1..=16).collect();

        let first = Page::of(items.clone(), 1, USERS_PAGE_SIZE);
        assert_eq!(first.items, (1..=7).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);
        assert!(!first.has_previous());
        assert!(first.has_next());

        let last = Page::of(items.clone(), 3, USERS_PAGE_SIZE);
        assert_eq!(last.items, [15, 16]);
        assert!(!last.has_next());

        assert_eq!(Page::of(items.clone(), 0, USERS_PAGE_SIZE).number, 1);
        assert_eq!(Page::of(items, 99, USERS_PAGE_SIZE).number, 3);
    }

    #[test]
    fn test_empty_collection_has_one_page() {
        let page = Page::of(Vec::<u32>::new(), 4, USERS_PAGE_SIZE);
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_items, 0);
        assert!(page.items.is_empty());
    }
}
