//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::local_store::StoreError;
use crate::services::identity::IdentityError;
use crate::shopify::{ErrorKind, ShopifyError};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] wrapsody_core::EmailError),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// New password is shorter than the provider accepts.
    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),

    /// Signup without accepting the EULA.
    #[error("EULA not accepted")]
    EulaNotAccepted,

    /// Re-authentication with the current password failed.
    #[error("current password is incorrect")]
    CurrentPasswordIncorrect,

    /// Identity provider error.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Storefront error.
    #[error("storefront error: {0}")]
    Storefront(#[from] ShopifyError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Local state could not be written.
    #[error("local state error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Text for the alert shown to the customer.
    #[must_use]
    pub fn alert_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
            Self::PasswordMismatch => "Passwords do not match.".to_string(),
            Self::PasswordTooShort(min) => {
                format!("Password must be at least {min} characters long.")
            }
            Self::EulaNotAccepted => {
                "You must accept the End User License Agreement.".to_string()
            }
            Self::CurrentPasswordIncorrect => "Current password is incorrect.".to_string(),
            Self::Identity(err) => Self::alert_message_for_identity(err),
            Self::Storefront(err) => match err.kind() {
                ErrorKind::Authorization => {
                    "Failed to log in with Shopify. Please check your credentials.".to_string()
                }
                ErrorKind::Validation => err.to_string(),
                ErrorKind::Network | ErrorKind::NotFound => {
                    "The store is unavailable. Please try again.".to_string()
                }
            },
            Self::Repository(_) => "Failed to save user information.".to_string(),
            Self::Store(_) => "Failed to save settings on this device.".to_string(),
        }
    }

    /// Alert text for an identity provider error.
    #[must_use]
    pub fn alert_message_for_identity(err: &IdentityError) -> String {
        match err {
            IdentityError::EmailExists => "An account with this email already exists.".to_string(),
            IdentityError::InvalidCredentials => "Invalid email or password.".to_string(),
            IdentityError::WeakPassword(detail) if !detail.is_empty() => detail.clone(),
            IdentityError::WeakPassword(_) => "Password is too weak.".to_string(),
            IdentityError::SessionExpired | IdentityError::RecentLoginRequired => {
                "Your session has expired. Please log in again.".to_string()
            }
            IdentityError::TooManyAttempts => {
                "Too many attempts. Please try again later.".to_string()
            }
            IdentityError::UserDisabled => "This account has been disabled.".to_string(),
            IdentityError::Http(_) | IdentityError::Api { .. } | IdentityError::Parse(_) => {
                "Unable to reach the sign-in service. Please try again.".to_string()
            }
        }
    }

    /// Whether the error is a fault on our side rather than bad input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Repository(_) | Self::Store(_))
    }
}
