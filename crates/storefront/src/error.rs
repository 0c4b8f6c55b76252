//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side failures to
//! Sentry before the front end shows an alert. Front ends should surface
//! errors through [`AppError::report`] and [`AppError::alert_message`].

use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::local_store::StoreError;
use crate::services::auth::AuthError;
use crate::services::identity::IdentityError;
use crate::shopify::{ErrorKind, ShopifyError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Account operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Identity provider call failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Local state could not be read or written.
    #[error("Local state error: {0}")]
    Store(#[from] StoreError),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Checkout hand-off failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the failure is ours (or a dependency's) rather than the
    /// user's. Only these are sent to Sentry.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Store(_) | Self::Config(_) | Self::Internal(_) => true,
            Self::Shopify(err) => matches!(err.kind(), ErrorKind::Network),
            Self::Auth(err) => err.is_internal(),
            Self::Identity(err) => matches!(
                err,
                IdentityError::Http(_) | IdentityError::Api { .. } | IdentityError::Parse(_)
            ),
            Self::Checkout(err) => matches!(err, CheckoutError::Surface(_)),
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    /// Capture to Sentry (server-side failures only) and log.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Operation failed"
            );
        } else {
            tracing::warn!(error = %self, "Operation rejected");
        }
    }

    /// Text for the alert shown to the user.
    ///
    /// Internal error details are not exposed.
    #[must_use]
    pub fn alert_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            Self::Store(_) => "Failed to save settings on this device.".to_string(),
            Self::Config(_) => "The app is not configured correctly.".to_string(),
            Self::Auth(err) => err.alert_message(),
            Self::Identity(err) => AuthError::alert_message_for_identity(err),
            Self::Shopify(err) => match err.kind() {
                ErrorKind::Authorization => "Please log in again.".to_string(),
                ErrorKind::Validation => err.to_string(),
                ErrorKind::NotFound => "That item is no longer available.".to_string(),
                ErrorKind::Network => "The store is unavailable. Please try again.".to_string(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::NoCart => "Your cart is empty.".to_string(),
                CheckoutError::Unavailable => "Checkout is not available here.".to_string(),
                CheckoutError::InvalidUrl(_) | CheckoutError::Surface(_) => {
                    "Checkout failed to open. Please try again.".to_string()
                }
            },
            Self::NotFound(what) => format!("{what} was not found."),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("variant_id", "gid://shopify/ProductVariant/1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
