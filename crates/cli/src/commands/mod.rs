//! CLI command implementations.

pub mod account;
pub mod catalog;
pub mod migrate;
mod render;
pub mod shop;

use std::sync::Arc;

use wrapsody_storefront::db::{
    self, InMemoryUserDirectory, PgUserDirectory, RepositoryError, UserDirectory,
};
use wrapsody_storefront::services::identity::FirebaseIdentity;
use wrapsody_storefront::shopify::StorefrontClient;
use wrapsody_storefront::{
    AccountService, AppError, CartSession, CheckoutSurface, LocalStore, StorefrontConfig,
};

use self::shop::TerminalCheckout;

/// Everything a command needs, wired from configuration.
pub struct Context {
    pub session: CartSession,
    pub accounts: AccountService,
}

impl Context {
    /// Open local state, connect clients and restore a remembered login.
    ///
    /// # Errors
    ///
    /// Returns an error if local state cannot be read, the users database
    /// is unreachable, or a client fails to build.
    pub async fn load(
        config: &StorefrontConfig,
        checkout: Option<&Arc<TerminalCheckout>>,
    ) -> Result<Self, AppError> {
        let store = LocalStore::open_or_in_memory(config.state_path.as_deref()).await?;

        let client = StorefrontClient::new(&config.shopify);
        let checkout = checkout.map(|surface| Arc::clone(surface) as Arc<dyn CheckoutSurface>);
        let session = CartSession::new(Arc::new(client), store, checkout);

        let directory: Arc<dyn UserDirectory> = match &config.users_database_url {
            Some(url) => {
                let pool = db::create_pool(url)
                    .await
                    .map_err(RepositoryError::from)?;
                tracing::debug!("Users database pool created");
                Arc::new(PgUserDirectory::new(pool))
            }
            None => {
                tracing::info!("No users database configured, profiles kept in memory");
                Arc::new(InMemoryUserDirectory::new())
            }
        };

        let identity = Arc::new(FirebaseIdentity::new(&config.identity)?);
        let accounts = AccountService::new(identity, directory, session.clone());

        match accounts.auto_login().await {
            Ok(true) => tracing::info!("Signed in with remembered login"),
            Ok(false) => {}
            Err(e) => AppError::from(e).report(),
        }

        Ok(Self { session, accounts })
    }
}
