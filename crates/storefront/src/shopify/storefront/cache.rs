//! Cache types for Storefront API responses.

use wrapsody_core::CollectionId;

use crate::shopify::types::{Collection, Product, ProductPage};

/// Cache key for catalog listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products {
        first: i64,
    },
    Collections {
        first: i64,
        products_first: i64,
    },
    CollectionProducts {
        id: CollectionId,
        first: i64,
        after: Option<String>,
    },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<Product>),
    Collections(Vec<Collection>),
    ProductPage(Box<ProductPage>),
}
