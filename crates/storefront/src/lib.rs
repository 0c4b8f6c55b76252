//! Wrapsody storefront library.
//!
//! Cart session, account flows and the Storefront API client behind the
//! `wrapsody` command-line front end.
//!
//! # Modules
//!
//! - `session` - cart slot, catalog browsing and checkout hand-off
//! - `services` - identity provider client and account flows
//! - `shopify` - Storefront GraphQL client and domain types
//! - `db` - profile documents in `PostgreSQL` or memory
//! - `local_store` - device-local persisted state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod local_store;
pub mod services;
pub mod session;
pub mod shopify;

pub use checkout::{CheckoutError, CheckoutEvent, CheckoutSurface};
pub use config::StorefrontConfig;
pub use error::AppError;
pub use local_store::{LocalState, LocalStore};
pub use services::auth::AccountService;
pub use session::CartSession;
