//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - Static GraphQL documents composed from shared fragments, executed through
//!   `graphql_client`'s `GraphQLQuery` contract
//! - Shopify is source of truth - NO local sync, direct API calls
//! - In-memory caching via `moka` for catalog responses (5 minute TTL)
//!
//! # Operations
//!
//! - Customer signup and access token creation
//! - Order history per customer access token
//! - Cart create, lines add/update/remove
//! - Products, collections and collection pagination
//!
//! # Example
//!
//! ```rust,ignore
//! use wrapsody_storefront::shopify::{CartLineInput, StorefrontClient};
//!
//! let client = StorefrontClient::new(&config.shopify);
//!
//! let products = client.get_products(250).await?;
//! let cart = client.create_cart(vec![CartLineInput {
//!     merchandise_id: products[0].variants[0].id.clone(),
//!     quantity: 1,
//! }]).await?;
//! ```

mod storefront;
pub mod types;

pub use storefront::StorefrontClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Credentials or customer access token rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Mutation rejected its input.
    #[error("Validation failed: {}", format_user_errors(.0))]
    Validation(Vec<UserError>),
}

/// Coarse classification of a [`ShopifyError`] for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport, protocol or upstream failure.
    Network,
    /// Bad credentials or token.
    Authorization,
    /// Input rejected by the API.
    Validation,
    /// Requested entity does not exist.
    NotFound,
}

impl ShopifyError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) | Self::GraphQL(_) | Self::Parse(_) | Self::RateLimited(_) => {
                ErrorKind::Network
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Authorization,
            Self::Validation(_) => ErrorKind::Validation,
        }
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

impl GraphQLError {
    /// An error with only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }
    }
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_user_errors(errors: &[UserError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::NotFound("cart".to_string());
        assert_eq!(err.to_string(), "Not found: cart");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError::message("Field not found"),
            GraphQLError::message("Invalid ID"),
        ];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_graphql_error_empty_messages() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 5, column: 10 }],
            path: vec![
                serde_json::Value::String("products".to_string()),
                serde_json::Value::Number(0.into()),
            ],
        }];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: path: products.0 at line 5:10"
        );
    }

    #[test]
    fn test_graphql_error_no_details() {
        let err = ShopifyError::GraphQL(vec![GraphQLError::message("")]);
        assert_eq!(err.to_string(), "GraphQL errors: [error 1]: (no details)");
    }

    #[test]
    fn test_graphql_error_empty_vec() {
        let err = ShopifyError::GraphQL(vec![]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let err = ShopifyError::Validation(vec![
            UserError {
                code: Some("TAKEN".to_string()),
                field: vec!["input".to_string(), "email".to_string()],
                message: "Email has already been taken".to_string(),
            },
            UserError {
                code: None,
                field: vec![],
                message: "Password is too short".to_string(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: input.email: Email has already been taken; Password is too short"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ShopifyError::RateLimited(60).kind(), ErrorKind::Network);
        assert_eq!(ShopifyError::GraphQL(vec![]).kind(), ErrorKind::Network);
        assert_eq!(
            ShopifyError::Unauthorized("bad token".to_string()).kind(),
            ErrorKind::Authorization
        );
        assert_eq!(ShopifyError::Validation(vec![]).kind(), ErrorKind::Validation);
        assert_eq!(
            ShopifyError::NotFound("cart".to_string()).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ShopifyError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
