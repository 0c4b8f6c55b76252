//! Account services.
//!
//! - `identity` - email/password accounts at the identity provider
//! - `auth` - signup, login and account management across identity,
//!   profile directory, storefront and local state

pub mod auth;
pub mod identity;
