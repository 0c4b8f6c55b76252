//! User profile directory.
//!
//! Profiles are looked up by email. Lookups compare the lowercased address, so
//! `Ada@Example.com` and `ada@example.com` find the same document.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use wrapsody_core::Email;

use super::RepositoryError;

/// A stored profile document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Email as the customer typed it at signup.
    pub email: Email,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Whether the customer accepted the EULA.
    pub has_accepted_eula: bool,
}

impl UserProfile {
    /// "First Last", or `None` when both names are blank.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// Fields for creating or updating a profile.
///
/// `has_accepted_eula: None` keeps whatever is stored (false for new
/// profiles).
#[derive(Debug, Clone)]
pub struct NewUserProfile {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub has_accepted_eula: Option<bool>,
}

/// Storage for profile documents.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Create the profile or merge into the existing one.
    async fn upsert(&self, profile: &NewUserProfile) -> Result<UserProfile, RepositoryError>;

    /// Find the profile for an email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, RepositoryError>;

    /// Record EULA acceptance.
    ///
    /// Returns `RepositoryError::NotFound` if no profile exists.
    async fn set_eula_accepted(&self, email: &Email, accepted: bool)
    -> Result<(), RepositoryError>;

    /// Delete a profile. Returns whether one existed.
    async fn delete(&self, email: &Email) -> Result<bool, RepositoryError>;
}

// =============================================================================
// PostgreSQL
// =============================================================================

/// Profile directory in `PostgreSQL`.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    email: String,
    first_name: String,
    last_name: String,
    has_accepted_eula: bool,
}

impl TryFrom<UserRow> for UserProfile {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            has_accepted_eula: row.has_accepted_eula,
        })
    }
}

impl PgUserDirectory {
    /// Create a directory over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn upsert(&self, profile: &NewUserProfile) -> Result<UserProfile, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO storefront_users (document_key, email, first_name, last_name, has_accepted_eula)
            VALUES ($1, $2, $3, $4, COALESCE($5, FALSE))
            ON CONFLICT (document_key) DO UPDATE SET
                email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                has_accepted_eula = COALESCE($5, storefront_users.has_accepted_eula),
                updated_at = NOW()
            RETURNING email, first_name, last_name, has_accepted_eula
            ",
        )
        .bind(profile.email.document_key())
        .bind(profile.email.as_str())
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.has_accepted_eula)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT email, first_name, last_name, has_accepted_eula
            FROM storefront_users
            WHERE document_key = $1
            ",
        )
        .bind(email.document_key())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn set_eula_accepted(
        &self,
        email: &Email,
        accepted: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront_users
            SET has_accepted_eula = $2, updated_at = NOW()
            WHERE document_key = $1
            ",
        )
        .bind(email.document_key())
        .bind(accepted)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, email: &Email) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront_users WHERE document_key = $1")
            .bind(email.document_key())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// In memory
// =============================================================================

/// Profile directory kept in process memory.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    documents: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryUserDirectory {
    /// An empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn upsert(&self, profile: &NewUserProfile) -> Result<UserProfile, RepositoryError> {
        let mut documents = self.documents.write().await;
        let key = profile.email.document_key();
        let has_accepted_eula = profile.has_accepted_eula.unwrap_or_else(|| {
            documents
                .get(&key)
                .is_some_and(|existing| existing.has_accepted_eula)
        });
        let stored = UserProfile {
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            has_accepted_eula,
        };
        documents.insert(key, stored.clone());
        Ok(stored)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self
            .documents
            .read()
            .await
            .get(&email.document_key())
            .cloned())
    }

    async fn set_eula_accepted(
        &self,
        email: &Email,
        accepted: bool,
    ) -> Result<(), RepositoryError> {
        let mut documents = self.documents.write().await;
        let profile = documents
            .get_mut(&email.document_key())
            .ok_or(RepositoryError::NotFound)?;
        profile.has_accepted_eula = accepted;
        Ok(())
    }

    async fn delete(&self, email: &Email) -> Result<bool, RepositoryError> {
        Ok(self
            .documents
            .write()
            .await
            .remove(&email.document_key())
            .is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    fn new_profile(address: &str, eula: Option<bool>) -> NewUserProfile {
        NewUserProfile {
            email: email(address),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            has_accepted_eula: eula,
        }
    }

    #[tokio::test]
    async fn test_lookup_ignores_case() {
        let directory = InMemoryUserDirectory::new();
        directory
            .upsert(&new_profile("Ada@Example.com", Some(true)))
            .await
            .unwrap();

        let found = directory
            .find_by_email(&email("ada@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.email.as_str(), "Ada@Example.com");
        assert!(found.has_accepted_eula);
    }

    #[tokio::test]
    async fn test_upsert_keeps_eula_unless_provided() {
        let directory = InMemoryUserDirectory::new();
        directory
            .upsert(&new_profile("ada@example.com", Some(true)))
            .await
            .unwrap();

        let merged = directory
            .upsert(&new_profile("ada@example.com", None))
            .await
            .unwrap();
        assert!(merged.has_accepted_eula);

        let revoked = directory
            .upsert(&new_profile("ada@example.com", Some(false)))
            .await
            .unwrap();
        assert!(!revoked.has_accepted_eula);

        let fresh = directory
            .upsert(&new_profile("grace@example.com", None))
            .await
            .unwrap();
        assert!(!fresh.has_accepted_eula);
    }

    #[tokio::test]
    async fn test_set_eula_requires_profile() {
        let directory = InMemoryUserDirectory::new();
        let err = directory
            .set_eula_accepted(&email("nobody@example.com"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete() {
        let directory = InMemoryUserDirectory::new();
        directory
            .upsert(&new_profile("ada@example.com", None))
            .await
            .unwrap();

        assert!(directory.delete(&email("ADA@example.com")).await.unwrap());
        assert!(!directory.delete(&email("ada@example.com")).await.unwrap());
        assert!(
            directory
                .find_by_email(&email("ada@example.com"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_display_name() {
        let mut profile = UserProfile {
            email: email("ada@example.com"),
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            has_accepted_eula: false,
        };
        assert_eq!(profile.display_name().as_deref(), Some("Ada Lovelace"));

        profile.last_name = String::new();
        assert_eq!(profile.display_name().as_deref(), Some("Ada"));

        profile.first_name = "  ".to_string();
        assert_eq!(profile.display_name(), None);
    }
}
