//! Account flows against live services.
//!
//! These tests require:
//! - Storefront and identity configuration (see `wrapsody_storefront::config`)
//! - `USERS_DATABASE_URL` with migrations applied, for directory tests
//!
//! Run with: cargo test -p wrapsody-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use wrapsody_core::Email;
use wrapsody_integration_tests::{live_config, live_session};
use wrapsody_storefront::AccountService;
use wrapsody_storefront::db::{self, NewUserProfile, PgUserDirectory, UserDirectory};
use wrapsody_storefront::services::identity::FirebaseIdentity;

#[tokio::test]
#[ignore = "Requires Shopify credentials"]
async fn test_login_with_wrong_password_changes_nothing() {
    let config = live_config();
    let session = live_session(&config);
    let store = session.store().clone();
    let accounts = AccountService::new(
        Arc::new(FirebaseIdentity::new(&config.identity).unwrap()),
        Arc::new(db::InMemoryUserDirectory::new()),
        session,
    );

    let result = accounts
        .login("nobody@wrapsody.invalid", "definitely-wrong", true)
        .await;
    assert!(result.is_err());

    let state = store.snapshot().await;
    assert!(!state.stay_logged_in);
    assert!(!state.is_user_logged_in);
    assert!(state.customer_access_token.is_none());
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL with migrations applied"]
async fn test_pg_directory_round_trip() {
    let config = live_config();
    let url = config
        .users_database_url
        .as_ref()
        .expect("USERS_DATABASE_URL must be set");
    let directory = PgUserDirectory::new(db::create_pool(url).await.unwrap());

    let email = Email::parse("Integration.Test@Wrapsody.invalid").unwrap();
    directory
        .upsert(&NewUserProfile {
            email: email.clone(),
            first_name: "Integration".to_string(),
            last_name: "Test".to_string(),
            has_accepted_eula: None,
        })
        .await
        .unwrap();

    let lower = Email::parse("integration.test@wrapsody.invalid").unwrap();
    let profile = directory.find_by_email(&lower).await.unwrap().unwrap();
    assert!(!profile.has_accepted_eula);

    directory.set_eula_accepted(&lower, true).await.unwrap();
    let profile = directory.find_by_email(&email).await.unwrap().unwrap();
    assert!(profile.has_accepted_eula);

    assert!(directory.delete(&email).await.unwrap());
}
