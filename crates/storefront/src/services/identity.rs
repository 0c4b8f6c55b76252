//! Identity Toolkit client for email/password accounts.
//!
//! Accounts live with the identity provider; this crate only keeps the
//! refresh token when the customer asks to stay logged in. Requests go to the
//! REST endpoints directly:
//!
//! - `accounts:signUp`, `accounts:signInWithPassword`
//! - `accounts:sendOobCode` (password reset email)
//! - `accounts:update`, `accounts:delete`
//! - secure token `token` exchange for refreshing a session

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::IdentityConfig;

/// Errors returned by the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An account already exists for the email.
    #[error("an account already exists for this email")]
    EmailExists,

    /// Wrong email or password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Password rejected by the provider's policy.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Refresh token expired or revoked.
    #[error("session expired")]
    SessionExpired,

    /// Sensitive operation needs a recent sign-in.
    #[error("recent sign-in required")]
    RecentLoginRequired,

    /// Too many failed attempts.
    #[error("too many attempts, try again later")]
    TooManyAttempts,

    /// Account disabled by an administrator.
    #[error("account disabled")]
    UserDisabled,

    /// Any other error code.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl IdentityError {
    /// Map a provider error code such as `WEAK_PASSWORD : Password should be...`.
    fn from_code(status: u16, message: &str) -> Self {
        let (code, detail) = message.split_once(" : ").unwrap_or((message, ""));
        match code.trim() {
            "EMAIL_EXISTS" => Self::EmailExists,
            "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
                Self::InvalidCredentials
            }
            "WEAK_PASSWORD" => Self::WeakPassword(detail.trim().to_string()),
            "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "INVALID_ID_TOKEN" | "USER_NOT_FOUND" => {
                Self::SessionExpired
            }
            "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => Self::RecentLoginRequired,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "USER_DISABLED" => Self::UserDisabled,
            _ => Self::Api {
                status,
                message: message.to_string(),
            },
        }
    }
}

/// A signed-in identity.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone)]
pub struct IdentitySession {
    /// Provider user id.
    pub local_id: String,
    /// Account email; absent after a token refresh.
    pub email: Option<String>,
    /// Short-lived token for account operations.
    pub id_token: SecretString,
    /// Long-lived token for [`IdentityProvider::refresh`].
    pub refresh_token: SecretString,
}

impl std::fmt::Debug for IdentitySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentitySession")
            .field("local_id", &self.local_id)
            .field("email", &self.email)
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Email/password identity operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account.
    async fn sign_up(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError>;

    /// Sign in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError>;

    /// Exchange a refresh token for a fresh session.
    async fn refresh(&self, refresh_token: &str) -> Result<IdentitySession, IdentityError>;

    /// Email a password reset link.
    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;

    /// Change the password of the signed-in account.
    async fn update_password(
        &self,
        id_token: &str,
        new_password: &str,
    ) -> Result<IdentitySession, IdentityError>;

    /// Delete the signed-in account.
    async fn delete_account(&self, id_token: &str) -> Result<(), IdentityError>;
}

// =============================================================================
// REST client
// =============================================================================

/// Identity Toolkit REST client.
#[derive(Clone)]
pub struct FirebaseIdentity {
    client: reqwest::Client,
    api_key: String,
    identity_base_url: String,
    token_base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePasswordRequest<'a> {
    id_token: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdTokenRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
}

/// The token endpoint answers in `snake_case`.
#[derive(Deserialize)]
struct TokenResponse {
    user_id: String,
    id_token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl From<AccountResponse> for IdentitySession {
    fn from(response: AccountResponse) -> Self {
        Self {
            local_id: response.local_id,
            email: response.email,
            id_token: SecretString::from(response.id_token),
            refresh_token: SecretString::from(response.refresh_token),
        }
    }
}

impl FirebaseIdentity {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            identity_base_url: config.identity_base_url.trim_end_matches('/').to_string(),
            token_base_url: config.token_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn accounts_url(&self, method: &str) -> String {
        format!("{}/v1/accounts:{method}", self.identity_base_url)
    }

    /// Append the API key to an endpoint URL.
    fn with_key(&self, endpoint: &str) -> Result<Url, IdentityError> {
        Url::parse_with_params(endpoint, &[("key", self.api_key.as_str())])
            .map_err(|e| IdentityError::Parse(format!("invalid endpoint {endpoint}: {e}")))
    }

    /// POST a JSON body to an `accounts:*` endpoint.
    async fn post_account<B, R>(&self, method: &str, body: &B) -> Result<R, IdentityError>
    where
        B: Serialize + Sync + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.with_key(&self.accounts_url(method))?)
            .json(body)
            .send()
            .await?;

        Self::read_response(response).await
    }

    async fn read_response<R>(response: reqwest::Response) -> Result<R, IdentityError>
    where
        R: for<'de> Deserialize<'de>,
    {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map_or(text, |envelope| envelope.error.message);
            return Err(IdentityError::from_code(status.as_u16(), &message));
        }

        serde_json::from_str(&text).map_err(|e| IdentityError::Parse(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError> {
        let response: AccountResponse = self
            .post_account(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        Ok(response.into())
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError> {
        let response: AccountResponse = self
            .post_account(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        Ok(response.into())
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<IdentitySession, IdentityError> {
        let response = self
            .client
            .post(self.with_key(&format!("{}/v1/token", self.token_base_url))?)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let token: TokenResponse = Self::read_response(response).await?;
        Ok(IdentitySession {
            local_id: token.user_id,
            email: None,
            id_token: SecretString::from(token.id_token),
            refresh_token: SecretString::from(token.refresh_token),
        })
    }

    #[instrument(skip(self))]
    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let _: serde_json::Value = self
            .post_account(
                "sendOobCode",
                &OobCodeRequest {
                    request_type: "PASSWORD_RESET",
                    email,
                },
            )
            .await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn update_password(
        &self,
        id_token: &str,
        new_password: &str,
    ) -> Result<IdentitySession, IdentityError> {
        let response: AccountResponse = self
            .post_account(
                "update",
                &UpdatePasswordRequest {
                    id_token,
                    password: new_password,
                    return_secure_token: true,
                },
            )
            .await?;
        Ok(response.into())
    }

    #[instrument(skip_all)]
    async fn delete_account(&self, id_token: &str) -> Result<(), IdentityError> {
        let _: serde_json::Value = self
            .post_account("delete", &IdTokenRequest { id_token })
            .await?;
        Ok(())
    }
}

/// Expose a session's refresh token for persisting.
#[must_use]
pub fn refresh_token_of(session: &IdentitySession) -> String {
    session.refresh_token.expose_secret().to_string()
}

// =============================================================================
// In-memory provider for tests
// =============================================================================
