//! Account service.
//!
//! Ties the identity provider, the profile directory, the storefront session
//! and the local store together for signup, login and account management.
//!
//! Login is two-phase: the identity provider is asked first, and only when
//! it accepts the credentials is anything written locally. The customer is
//! marked logged in only when the storefront login succeeds as well.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use wrapsody_core::Email;

use crate::db::{NewUserProfile, RepositoryError, UserDirectory};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::local_store::LocalStore;
use crate::services::identity::{
    IdentityError, IdentityProvider, IdentitySession, refresh_token_of,
};
use crate::session::CartSession;
use crate::shopify::{Customer, CustomerAccessToken};

/// Minimum password length accepted by the identity provider.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Signup form contents.
#[derive(Clone)]
pub struct SignUpForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
    pub accepted_eula: bool,
}

impl std::fmt::Debug for SignUpForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpForm")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("accepted_eula", &self.accepted_eula)
            .finish_non_exhaustive()
    }
}

/// Password change form contents.
#[derive(Clone)]
pub struct PasswordChange {
    pub email: String,
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Account service.
pub struct AccountService {
    identity: Arc<dyn IdentityProvider>,
    directory: Arc<dyn UserDirectory>,
    session: CartSession,
    current: RwLock<Option<IdentitySession>>,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        directory: Arc<dyn UserDirectory>,
        session: CartSession,
    ) -> Self {
        Self {
            identity,
            directory,
            session,
            current: RwLock::new(None),
        }
    }

    fn store(&self) -> &LocalStore {
        self.session.store()
    }

    /// The cart session behind this service.
    #[must_use]
    pub const fn session(&self) -> &CartSession {
        &self.session
    }

    // =========================================================================
    // Signup and login
    // =========================================================================

    /// Register an account with the identity provider, the profile
    /// directory and the storefront, in that order.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch` or `AuthError::EulaNotAccepted`
    /// before contacting anything, otherwise the first failing step.
    #[instrument(skip_all, fields(email = %form.email))]
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<Customer, AuthError> {
        let email = Email::parse(&form.email)?;

        if form.password != form.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        if !form.accepted_eula {
            return Err(AuthError::EulaNotAccepted);
        }

        let identity = self
            .identity
            .sign_up(email.as_str(), &form.password)
            .await?;
        info!(local_id = %identity.local_id, "Identity account created");

        self.directory
            .upsert(&NewUserProfile {
                email: email.clone(),
                first_name: form.first_name.clone(),
                last_name: form.last_name.clone(),
                has_accepted_eula: Some(form.accepted_eula),
            })
            .await?;

        let customer = self
            .session
            .create_customer(
                email.as_str(),
                &form.first_name,
                &form.last_name,
                &form.password,
            )
            .await?;

        Ok(customer)
    }

    /// Log in with email and password.
    ///
    /// A rejected identity login leaves local state untouched.
    ///
    /// # Errors
    ///
    /// Returns the identity error if the credentials are rejected, or
    /// `AuthError::Storefront` if the storefront login fails afterwards.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        stay_logged_in: bool,
    ) -> Result<CustomerAccessToken, AuthError> {
        let email = Email::parse(email)?;
        let identity = self.identity.sign_in(email.as_str(), password).await?;

        let refresh_token = refresh_token_of(&identity);
        let saved_email = email.as_str().to_string();
        self.store()
            .update(move |state| {
                if stay_logged_in {
                    state.stay_logged_in = true;
                    state.saved_email = Some(saved_email);
                    state.saved_refresh_token = Some(refresh_token);
                } else {
                    state.clear_saved_credentials();
                }
            })
            .await?;

        let local_id = identity.local_id.clone();
        *self.current.write().await = Some(identity);

        let token = self.session.login_customer(email.as_str(), password).await?;

        self.store()
            .update(|state| state.is_user_logged_in = true)
            .await?;
        set_sentry_user(&local_id, Some(email.as_str()));
        info!("Customer logged in");

        Ok(token)
    }

    /// Restore a remembered login.
    ///
    /// Returns `Ok(false)` when nothing is remembered. A rejected refresh
    /// forgets the remembered credentials.
    ///
    /// # Errors
    ///
    /// Returns the identity error if the refresh fails.
    #[instrument(skip(self))]
    pub async fn auto_login(&self) -> Result<bool, AuthError> {
        let state = self.store().snapshot().await;
        let (true, Some(refresh_token)) = (state.stay_logged_in, state.saved_refresh_token) else {
            return Ok(false);
        };

        match self.identity.refresh(&refresh_token).await {
            Ok(mut identity) => {
                identity.email = identity.email.or(state.saved_email);
                let rotated = refresh_token_of(&identity);
                self.store()
                    .update(move |state| state.saved_refresh_token = Some(rotated))
                    .await?;
                if let Some(email) = identity.email.as_deref() {
                    set_sentry_user(&identity.local_id, Some(email));
                }
                *self.current.write().await = Some(identity);
                info!("Restored remembered login");
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "Remembered login rejected, forgetting it");
                self.store()
                    .update(|state| {
                        state.clear_saved_credentials();
                        state.is_user_logged_in = false;
                    })
                    .await?;
                Err(e.into())
            }
        }
    }

    /// Sign out and forget the storefront token and remembered login.
    ///
    /// # Errors
    ///
    /// Returns an error if local state cannot be written.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        *self.current.write().await = None;
        self.store()
            .update(|state| {
                state.clear_customer();
                state.is_user_logged_in = false;
                state.clear_saved_credentials();
            })
            .await?;
        self.session.reset_cart().await;
        clear_sentry_user();
        info!("Customer logged out");
        Ok(())
    }

    /// Whether an identity session is active in this process.
    pub async fn is_signed_in(&self) -> bool {
        self.current.read().await.is_some()
    }

    // =========================================================================
    // Password and account management
    // =========================================================================

    /// Email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is invalid or the provider rejects it.
    #[instrument(skip(self))]
    pub async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        self.identity.send_password_reset(email.as_str()).await?;
        info!("Password reset email sent");
        Ok(())
    }

    /// Change the password after re-authenticating with the current one.
    ///
    /// The identity account changes first, then the storefront customer, so
    /// both logins keep accepting the same password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch` or `AuthError::PasswordTooShort`
    /// for a bad new password, `AuthError::CurrentPasswordIncorrect` if
    /// re-authentication fails, or the provider's or storefront's error.
    #[instrument(skip_all, fields(email = %change.email))]
    pub async fn update_password(&self, change: &PasswordChange) -> Result<(), AuthError> {
        let email = Email::parse(&change.email)?;

        if change.new_password != change.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        if change.new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::PasswordTooShort(MIN_PASSWORD_LENGTH));
        }

        let identity = self.reauthenticate(&email, &change.current_password).await?;
        let updated = self
            .identity
            .update_password(identity.id_token.expose_secret(), &change.new_password)
            .await?;

        let rotated = refresh_token_of(&updated);
        self.store()
            .update(move |state| {
                if state.stay_logged_in {
                    state.saved_refresh_token = Some(rotated);
                }
            })
            .await?;
        *self.current.write().await = Some(updated);

        self.session
            .update_customer_password(
                email.as_str(),
                &change.current_password,
                &change.new_password,
            )
            .await?;

        info!("Password updated");
        Ok(())
    }

    /// Delete the identity account and its profile, then sign out locally.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CurrentPasswordIncorrect` if re-authentication
    /// fails, or the provider's or directory's error.
    #[instrument(skip(self, password))]
    pub async fn delete_account(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let identity = self.reauthenticate(&email, password).await?;

        self.identity
            .delete_account(identity.id_token.expose_secret())
            .await?;

        if !self.directory.delete(&email).await? {
            warn!("No profile document to delete");
        }

        self.logout().await?;
        info!("Account deleted");
        Ok(())
    }

    async fn reauthenticate(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<IdentitySession, AuthError> {
        match self.identity.sign_in(email.as_str(), password).await {
            Ok(identity) => Ok(identity),
            Err(IdentityError::InvalidCredentials) => {
                Err(AuthError::CurrentPasswordIncorrect)
            }
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Whether the account has accepted the EULA. Unknown accounts have not.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory lookup fails.
    pub async fn eula_status(&self, email: &str) -> Result<bool, AuthError> {
        let email = Email::parse(email)?;
        Ok(self
            .directory
            .find_by_email(&email)
            .await?
            .is_some_and(|profile| profile.has_accepted_eula))
    }

    /// Record EULA acceptance, creating a bare profile if none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory write fails.
    #[instrument(skip(self))]
    pub async fn accept_eula(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        match self.directory.set_eula_accepted(&email, true).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => {
                self.directory
                    .upsert(&NewUserProfile {
                        email,
                        first_name: String::new(),
                        last_name: String::new(),
                        has_accepted_eula: Some(true),
                    })
                    .await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// "First Last" from the profile, if one exists with a name.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory lookup fails.
    pub async fn display_name(&self, email: &str) -> Result<Option<String>, AuthError> {
        let email = Email::parse(email)?;
        Ok(self
            .directory
            .find_by_email(&email)
            .await?
            .and_then(|profile| profile.display_name()))
    }
}
