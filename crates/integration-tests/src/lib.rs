//! Integration tests for Wrapsody.
//!
//! Every test talks to real services and is `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Storefront tests need SHOPIFY_STORE and SHOPIFY_STOREFRONT_PUBLIC_TOKEN,
//! # account tests also FIREBASE_API_KEY (or FIREBASE_AUTH_EMULATOR_HOST),
//! # profile tests USERS_DATABASE_URL with migrations applied.
//! cargo test -p wrapsody-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_catalog` - collections, pagination, random product
//! - `storefront_cart` - cart mutations against a real cart
//! - `accounts` - login flow and profile directory

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use wrapsody_storefront::shopify::StorefrontClient;
use wrapsody_storefront::{CartSession, LocalStore, StorefrontConfig};

/// Configuration from the environment; panics with the missing variable.
#[must_use]
pub fn live_config() -> StorefrontConfig {
    StorefrontConfig::from_env().expect("Live tests need storefront configuration")
}

/// A session against the configured store with in-memory local state.
#[must_use]
pub fn live_session(config: &StorefrontConfig) -> CartSession {
    CartSession::new(
        Arc::new(StorefrontClient::new(&config.shopify)),
        LocalStore::in_memory(),
        None,
    )
}
