//! Cart session.
//!
//! A [`CartSession`] owns one cart slot and fronts the storefront for
//! everything a shopper does: signing up, logging in, browsing, editing the
//! cart and handing off to checkout.
//!
//! # Ordering
//!
//! Every cart mutation takes a ticket from a monotonic counter *before* its
//! request is sent. When the response arrives it replaces the slot only if
//! its ticket is newer than the ticket of the last applied response, so a
//! slow response can never overwrite the result of a request issued after it.
//! Subscribers are notified while the slot is still locked, and the checkout
//! surface is only ever moved forward to a newer ticket.
//!
//! # Example
//!
//! ```rust,ignore
//! let session = CartSession::new(Arc::new(client), store, None);
//! let cart = session.add_item(variant_id).await?;
//! let cart = session.adjust_quantity(cart.lines[0].id.clone(), 1).await?;
//! ```

mod api;
#[cfg(test)]
pub(crate) mod fake;
pub mod plan;

pub use api::StorefrontApi;
pub use plan::{CartAction, CartIntent, MIN_LINE_QUANTITY};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use rand::seq::IndexedRandom;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use wrapsody_core::{CartLineId, CollectionId, VariantId};

use crate::checkout::{CheckoutError, CheckoutEvent, CheckoutSurface};
use crate::local_store::LocalStore;
use crate::shopify::{
    Cart, Collection, Customer, CustomerAccessToken, CustomerCreateInput, Order, Product,
    ProductPage, ShopifyError,
};

/// Orders requested per customer.
pub const ORDERS_PAGE_SIZE: i64 = 250;
/// Products a random pick is drawn from.
pub const RANDOM_PRODUCT_POOL: i64 = 250;
/// Collections listed.
pub const COLLECTIONS_PAGE_SIZE: i64 = 250;
/// Products fetched with each listed collection.
pub const COLLECTION_PREVIEW_SIZE: i64 = 10;

/// One shopper's cart plus the storefront behind it. Cheap to clone.
#[derive(Clone)]
pub struct CartSession {
    inner: Arc<CartSessionInner>,
}

struct CartSessionInner {
    api: Arc<dyn StorefrontApi>,
    store: LocalStore,
    checkout: Option<Arc<dyn CheckoutSurface>>,
    slot: RwLock<CartSlot>,
    next_ticket: AtomicU64,
    changes: watch::Sender<Option<Cart>>,
    /// Ticket of the cart the checkout surface last saw.
    surfaced_ticket: Mutex<u64>,
}

#[derive(Default)]
struct CartSlot {
    cart: Option<Cart>,
    applied_ticket: u64,
}

impl CartSession {
    /// Create a session with an empty cart slot.
    #[must_use]
    pub fn new(
        api: Arc<dyn StorefrontApi>,
        store: LocalStore,
        checkout: Option<Arc<dyn CheckoutSurface>>,
    ) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            inner: Arc::new(CartSessionInner {
                api,
                store,
                checkout,
                slot: RwLock::new(CartSlot::default()),
                next_ticket: AtomicU64::new(0),
                changes,
                surfaced_ticket: Mutex::new(0),
            }),
        }
    }

    /// The local store this session persists to.
    #[must_use]
    pub fn store(&self) -> &LocalStore {
        &self.inner.store
    }

    /// Watch the cart slot. The receiver sees every applied change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Cart>> {
        self.inner.changes.subscribe()
    }

    // =========================================================================
    // Customer
    // =========================================================================

    /// Create a storefront customer.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Validation` listing rejected fields, or a
    /// transport error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn create_customer(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: &str,
    ) -> Result<Customer, ShopifyError> {
        let input = CustomerCreateInput {
            email: email.to_string(),
            password: password.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };

        match self.inner.api.create_customer(input).await {
            Ok(customer) => {
                info!(customer_id = %customer.id, "Created storefront customer");
                Ok(customer)
            }
            Err(ShopifyError::Validation(errors)) => {
                for e in &errors {
                    warn!(
                        field = %e.field.join("."),
                        code = e.code.as_deref().unwrap_or(""),
                        message = %e.message,
                        "Customer signup rejected"
                    );
                }
                Err(ShopifyError::Validation(errors))
            }
            Err(e) => {
                error!(error = %e, "Customer signup failed");
                Err(e)
            }
        }
    }

    /// Log a customer in and remember the access token.
    ///
    /// Past orders are prefetched in the background; the prefetch result is
    /// only logged.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Unauthorized` for rejected credentials, or a
    /// transport error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login_customer(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let token = self
            .inner
            .api
            .create_customer_access_token(email, password)
            .await
            .inspect_err(|e| warn!(error = %e, "Storefront login failed"))?;

        if let Err(e) = self.inner.store.remember_customer(token.clone(), email).await {
            error!(error = %e, "Failed to persist customer access token");
        }

        let session = self.clone();
        let prefetch_token = token.clone();
        tokio::spawn(async move {
            match session.fetch_past_orders(&prefetch_token).await {
                Ok(orders) => info!(count = orders.len(), "Prefetched past orders"),
                Err(e) => warn!(error = %e, "Past orders prefetch failed"),
            }
        });

        Ok(token)
    }

    /// Change the storefront customer's password.
    ///
    /// Uses the token from the last login when it was issued to `email` and
    /// is still valid, otherwise signs in with `current_password` for a
    /// one-off token. A stored token is replaced by the one Shopify issues
    /// with the change.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Unauthorized` if the current password is
    /// rejected, `ShopifyError::Validation` if the new one is, or a transport
    /// error.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn update_customer_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let stored = self
            .inner
            .store
            .customer_access_token_for(email)
            .await
            .filter(|token| !token.is_expired_at(Utc::now()));

        let token = match &stored {
            Some(token) => token.clone(),
            None => {
                self.inner
                    .api
                    .create_customer_access_token(email, current_password)
                    .await?
            }
        };

        let replacement = self
            .inner
            .api
            .update_customer_password(&token.access_token, new_password)
            .await
            .inspect_err(|e| warn!(error = %e, "Storefront password update failed"))?;

        if stored.is_some()
            && let Err(e) = self
                .inner
                .store
                .remember_customer(replacement.clone(), email)
                .await
        {
            error!(error = %e, "Failed to persist customer access token");
        }

        info!("Storefront password updated");
        Ok(replacement)
    }

    /// Fetch a customer's orders, newest first.
    ///
    /// An empty list means the customer has no orders.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Unauthorized` for an expired or unknown token,
    /// or a transport error.
    #[instrument(skip_all)]
    pub async fn fetch_past_orders(
        &self,
        token: &CustomerAccessToken,
    ) -> Result<Vec<Order>, ShopifyError> {
        if token.is_expired_at(Utc::now()) {
            return Err(ShopifyError::Unauthorized(
                "Customer access token has expired".to_string(),
            ));
        }

        self.inner
            .api
            .customer_orders(&token.access_token, ORDERS_PAGE_SIZE)
            .await
    }

    /// Fetch past orders with the token from the last login.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Unauthorized` if nobody is logged in, otherwise
    /// as [`fetch_past_orders`](Self::fetch_past_orders).
    pub async fn fetch_stored_past_orders(&self) -> Result<Vec<Order>, ShopifyError> {
        let token = self
            .inner
            .store
            .customer_access_token()
            .await
            .ok_or_else(|| ShopifyError::Unauthorized("Not logged in".to_string()))?;
        self.fetch_past_orders(&token).await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The current cart, if one exists.
    pub async fn cart(&self) -> Option<Cart> {
        self.inner.slot.read().await.cart.clone()
    }

    /// The hosted checkout URL of the current cart.
    pub async fn checkout_url(&self) -> Option<String> {
        self.inner
            .slot
            .read()
            .await
            .cart
            .as_ref()
            .map(|cart| cart.checkout_url.clone())
    }

    /// Add one unit of a variant, creating the cart if needed.
    ///
    /// Like every cart mutation, returns the cart the session holds afterwards.
    /// If a newer mutation landed first, that is the newer cart; if the cart
    /// was reset meanwhile, it is the server's response.
    ///
    /// # Errors
    ///
    /// Returns the storefront error; the cart slot is left unchanged.
    #[instrument(skip(self), fields(variant_id = %variant_id))]
    pub async fn add_item(&self, variant_id: VariantId) -> Result<Cart, ShopifyError> {
        self.mutate(CartIntent::Add(variant_id)).await
    }

    /// Set a line's quantity. Quantities below one are raised to one.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` without a cart, otherwise the
    /// storefront error; the cart slot is left unchanged.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn update_quantity(
        &self,
        line_id: CartLineId,
        quantity: i64,
    ) -> Result<Cart, ShopifyError> {
        self.mutate(CartIntent::Update { line_id, quantity }).await
    }

    /// Step a line's quantity up or down from its current value, never
    /// below one.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` without a cart or for an unknown line,
    /// otherwise the storefront error.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn adjust_quantity(
        &self,
        line_id: CartLineId,
        delta: i64,
    ) -> Result<Cart, ShopifyError> {
        self.mutate(CartIntent::Adjust { line_id, delta }).await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` without a cart, otherwise the
    /// storefront error.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn remove_item(&self, line_id: CartLineId) -> Result<Cart, ShopifyError> {
        self.mutate(CartIntent::Remove(line_id)).await
    }

    /// Forget the cart. Nothing is deleted server-side.
    pub async fn reset_cart(&self) {
        let ticket = self.take_ticket();
        {
            let mut slot = self.inner.slot.write().await;
            slot.cart = None;
            slot.applied_ticket = slot.applied_ticket.max(ticket);
            self.inner.changes.send_replace(None);
        }
        debug!(ticket, "Cart reset");
        self.sync_checkout(ticket, None).await;
    }

    fn take_ticket(&self) -> u64 {
        self.inner.next_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn mutate(&self, intent: CartIntent) -> Result<Cart, ShopifyError> {
        let action = {
            let slot = self.inner.slot.read().await;
            plan::plan(slot.cart.as_ref(), intent)
        };

        let ticket = match &action {
            CartAction::Reject { reason } => {
                warn!(reason = %reason, "Cart action rejected");
                return Err(ShopifyError::NotFound(reason.clone()));
            }
            _ => self.take_ticket(),
        };

        let api = &self.inner.api;
        let result = match action {
            CartAction::Create { lines } => api.cart_create(lines).await,
            CartAction::LinesAdd { cart_id, lines } => api.cart_lines_add(&cart_id, lines).await,
            CartAction::LinesUpdate { cart_id, lines } => {
                api.cart_lines_update(&cart_id, lines).await
            }
            CartAction::LinesRemove { cart_id, line_ids } => {
                api.cart_lines_remove(&cart_id, line_ids).await
            }
            CartAction::Reject { reason } => Err(ShopifyError::NotFound(reason)),
        };

        match result {
            Ok(cart) => Ok(self.apply(ticket, cart).await),
            Err(e) => {
                error!(error = %e, ticket, "Cart mutation failed");
                Err(e)
            }
        }
    }

    /// Store a mutation response unless a newer one has already landed.
    ///
    /// Returns the cart held afterwards.
    async fn apply(&self, ticket: u64, cart: Cart) -> Cart {
        {
            let mut slot = self.inner.slot.write().await;
            if ticket <= slot.applied_ticket {
                debug!(
                    ticket,
                    applied_ticket = slot.applied_ticket,
                    "Dropping stale cart response"
                );
                return slot.cart.clone().unwrap_or(cart);
            }
            slot.applied_ticket = ticket;
            slot.cart = Some(cart.clone());
            self.inner.changes.send_replace(Some(cart.clone()));
        }

        debug!(
            ticket,
            cart_id = %cart.id,
            total_quantity = cart.total_quantity,
            "Applied cart response"
        );

        self.sync_checkout(ticket, Some(&cart)).await;
        cart
    }

    /// Move the checkout surface to the cart of `ticket`, unless it already
    /// shows a newer one.
    async fn sync_checkout(&self, ticket: u64, cart: Option<&Cart>) {
        let Some(surface) = &self.inner.checkout else {
            return;
        };

        let mut surfaced = self.inner.surfaced_ticket.lock().await;
        if ticket <= *surfaced {
            debug!(ticket, surfaced_ticket = *surfaced, "Checkout already newer");
            return;
        }
        *surfaced = ticket;

        surface.invalidate().await;
        if let Some(cart) = cart {
            match Url::parse(&cart.checkout_url) {
                Ok(url) => surface.preload(&url).await,
                Err(e) => warn!(error = %e, "Cart has an invalid checkout URL"),
            }
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// One page of a collection's products. Pass the previous page's
    /// [`next_cursor`](ProductPage::next_cursor) as `after`.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` for an unknown collection, or a
    /// transport error.
    #[instrument(skip(self), fields(collection_id = %collection_id))]
    pub async fn fetch_products(
        &self,
        collection_id: &CollectionId,
        after: Option<&str>,
        page_size: i64,
    ) -> Result<ProductPage, ShopifyError> {
        self.inner
            .api
            .collection_products(collection_id, page_size, after)
            .await
    }

    /// Collections, each with a preview of its products.
    ///
    /// # Errors
    ///
    /// Returns a transport error.
    pub async fn fetch_collections(&self) -> Result<Vec<Collection>, ShopifyError> {
        self.inner
            .api
            .collections(COLLECTIONS_PAGE_SIZE, COLLECTION_PREVIEW_SIZE)
            .await
    }

    /// A random product from the start of the catalog.
    ///
    /// # Errors
    ///
    /// Returns a transport error.
    pub async fn random_product(&self) -> Result<Option<Product>, ShopifyError> {
        let products = self.inner.api.products(RANDOM_PRODUCT_POOL).await?;
        Ok(products.choose(&mut rand::rng()).cloned())
    }

    /// Seed an empty session with the first variant of a random product.
    ///
    /// Returns the new cart, or `None` if the session already had a cart or
    /// the catalog is empty.
    ///
    /// # Errors
    ///
    /// Returns the storefront error from the product lookup or cart creation.
    pub async fn inject_random_cart_item(&self) -> Result<Option<Cart>, ShopifyError> {
        if self.inner.slot.read().await.cart.is_some() {
            return Ok(None);
        }

        let Some(variant_id) = self
            .random_product()
            .await?
            .and_then(|product| product.first_variant().map(|v| v.id.clone()))
        else {
            debug!("No product to seed the cart with");
            return Ok(None);
        };

        self.add_item(variant_id).await.map(Some)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Present checkout for the current cart and react to its events until
    /// the surface closes.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Unavailable` without a surface,
    /// `CheckoutError::NoCart` without a cart, or the surface's error.
    pub async fn checkout(&self) -> Result<(), CheckoutError> {
        let surface = self
            .inner
            .checkout
            .clone()
            .ok_or(CheckoutError::Unavailable)?;
        let url = Url::parse(&self.checkout_url().await.ok_or(CheckoutError::NoCart)?)?;

        let (events, mut received) = mpsc::unbounded_channel();
        let presenting = surface.present(&url, events);
        let handling = async {
            while let Some(event) = received.recv().await {
                self.handle_checkout_event(event).await;
            }
        };

        let (result, ()) = tokio::join!(presenting, handling);
        result
    }

    /// React to one checkout event.
    pub async fn handle_checkout_event(&self, event: CheckoutEvent) {
        match event {
            CheckoutEvent::Completed { order_id } => {
                info!(order_id = ?order_id, "Checkout completed");
                self.reset_cart().await;
            }
            CheckoutEvent::Canceled => debug!("Checkout canceled"),
            CheckoutEvent::Failed {
                message,
                recoverable,
            } => error!(message = %message, recoverable, "Checkout failed"),
            CheckoutEvent::Pixel { name, data } => {
                debug!(name = %name, data = %data, "Checkout pixel event");
            }
            CheckoutEvent::LinkClicked { url } => info!(url = %url, "Checkout link clicked"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;
    use chrono::Duration;
    use tokio::sync::oneshot;
    use wrapsody_core::OrderId;

    use super::fake::{COLLECTION_GID, FakeStorefront};
    use super::*;
    use crate::shopify::ErrorKind;

    fn session_with(fake: FakeStorefront) -> (CartSession, Arc<FakeStorefront>) {
        let fake = Arc::new(fake);
        let session = CartSession::new(fake.clone(), LocalStore::in_memory(), None);
        (session, fake)
    }

    fn variant(i: usize) -> VariantId {
        VariantId::from_resource_id(i)
    }

    /// Checkout surface that replays a scripted list of events.
    struct ScriptedCheckout {
        script: Vec<CheckoutEvent>,
        log: Mutex<Vec<String>>,
    }

    impl ScriptedCheckout {
        fn new(script: Vec<CheckoutEvent>) -> Arc<Self> {
            Arc::new(Self {
                script,
                log: Mutex::new(vec![]),
            })
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CheckoutSurface for ScriptedCheckout {
        async fn preload(&self, checkout_url: &Url) {
            self.log.lock().unwrap().push(format!("preload {checkout_url}"));
        }

        async fn present(
            &self,
            checkout_url: &Url,
            events: mpsc::UnboundedSender<CheckoutEvent>,
        ) -> Result<(), CheckoutError> {
            self.log.lock().unwrap().push(format!("present {checkout_url}"));
            for event in self.script.clone() {
                events
                    .send(event)
                    .map_err(|e| CheckoutError::Surface(e.to_string()))?;
            }
            Ok(())
        }

        async fn invalidate(&self) {
            self.log.lock().unwrap().push("invalidate".to_string());
        }
    }

    /// Checkout surface whose first invalidation is slow.
    struct SlowCheckout {
        slowed: AtomicBool,
        log: Mutex<Vec<String>>,
    }

    impl SlowCheckout {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                slowed: AtomicBool::new(false),
                log: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait]
    impl CheckoutSurface for SlowCheckout {
        async fn preload(&self, checkout_url: &Url) {
            self.log.lock().unwrap().push(format!("preload {checkout_url}"));
        }

        async fn present(
            &self,
            _checkout_url: &Url,
            _events: mpsc::UnboundedSender<CheckoutEvent>,
        ) -> Result<(), CheckoutError> {
            Ok(())
        }

        async fn invalidate(&self) {
            if !self.slowed.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            self.log.lock().unwrap().push("invalidate".to_string());
        }
    }

    #[tokio::test]
    async fn test_add_without_cart_creates_single_line() {
        let (session, fake) = session_with(FakeStorefront::new(3));

        let cart = session.add_item(variant(2)).await.unwrap();

        assert_eq!(fake.cart_count(), 1);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 1);
        assert_eq!(cart.lines[0].merchandise.id, variant(2));
        assert_eq!(session.cart().await, Some(cart));
    }

    #[tokio::test]
    async fn test_sequential_mutations_match_arithmetic() {
        let (session, fake) = session_with(FakeStorefront::new(3));

        session.add_item(variant(1)).await.unwrap();
        let cart = session.add_item(variant(2)).await.unwrap();
        assert_eq!(fake.cart_count(), 1);
        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.total_quantity, 2);

        let first = cart.line_for_variant(&variant(1)).unwrap().id.clone();
        let second = cart.line_for_variant(&variant(2)).unwrap().id.clone();

        let cart = session.update_quantity(first.clone(), 4).await.unwrap();
        assert_eq!(cart.total_quantity, 5);

        let cart = session.adjust_quantity(second.clone(), 1).await.unwrap();
        assert_eq!(cart.total_quantity, 6);

        let cart = session.adjust_quantity(first.clone(), -1).await.unwrap();
        assert_eq!(cart.line(&first).unwrap().quantity, 3);
        assert_eq!(cart.total_quantity, 5);

        let cart = session.remove_item(second).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.total_quantity, 3);
        assert_eq!(session.cart().await.unwrap().total_quantity, 3);
    }

    #[tokio::test]
    async fn test_update_never_goes_below_one() {
        let (session, _) = session_with(FakeStorefront::new(1));
        let cart = session.add_item(variant(1)).await.unwrap();
        let line = cart.lines[0].id.clone();

        for requested in [0, -5] {
            let cart = session.update_quantity(line.clone(), requested).await.unwrap();
            assert_eq!(cart.line(&line).unwrap().quantity, 1);
        }

        let cart = session.adjust_quantity(line.clone(), -1).await.unwrap();
        assert_eq!(cart.line(&line).unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_line_mutations_without_cart_fail_without_calling_api() {
        let (session, fake) = session_with(FakeStorefront::new(1));
        let line = CartLineId::from_resource_id(1);

        let err = session.update_quantity(line.clone(), 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = session.remove_item(line).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(fake.cart_calls.load(Ordering::SeqCst), 0);
        assert!(session.cart().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_slot_unchanged() {
        let (session, _) = session_with(FakeStorefront::new(1));
        let before = session.add_item(variant(1)).await.unwrap();

        let err = session
            .update_quantity(CartLineId::from_resource_id(999), 3)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.cart().await, Some(before));
    }

    #[tokio::test]
    async fn test_reset_cart_clears_slot() {
        let (session, _) = session_with(FakeStorefront::new(1));
        session.add_item(variant(1)).await.unwrap();

        session.reset_cart().await;

        assert!(session.cart().await.is_none());
        assert!(session.checkout_url().await.is_none());
    }

    #[tokio::test]
    async fn test_stale_response_does_not_overwrite_newer_cart() {
        let (session, fake) = session_with(FakeStorefront::new(1));
        let cart = session.add_item(variant(1)).await.unwrap();
        let line = cart.lines[0].id.clone();

        let (release, gate) = oneshot::channel();
        fake.hold_next_cart_response(gate);

        let slow = session.update_quantity(line.clone(), 5);
        let fast = async {
            let result = session.update_quantity(line.clone(), 2).await;
            let _ = release.send(());
            result
        };
        let (slow, fast) = tokio::join!(slow, fast);

        // Both requests succeeded; the older one answered last and gets the
        // newer cart back.
        assert_eq!(slow.unwrap().line(&line).unwrap().quantity, 2);
        assert_eq!(fast.unwrap().line(&line).unwrap().quantity, 2);
        assert_eq!(
            session.cart().await.unwrap().line(&line).unwrap().quantity,
            2
        );
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_response() {
        let (session, fake) = session_with(FakeStorefront::new(1));

        let (release, gate) = oneshot::channel();
        fake.hold_next_cart_response(gate);

        let add = session.add_item(variant(1));
        let reset = async {
            session.reset_cart().await;
            let _ = release.send(());
        };
        let (added, ()) = tokio::join!(add, reset);

        assert!(added.is_ok());
        assert!(session.cart().await.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_end_on_newest_cart_while_surface_is_slow() {
        let surface = SlowCheckout::new();
        let session = CartSession::new(
            Arc::new(FakeStorefront::new(1)),
            LocalStore::in_memory(),
            Some(surface.clone()),
        );
        let cart = session.add_item(variant(1)).await.unwrap();
        let line = cart.lines[0].id.clone();
        let changes = session.subscribe();
        surface.slowed.store(false, Ordering::SeqCst);

        let (older, newer) = tokio::join!(
            session.update_quantity(line.clone(), 5),
            session.update_quantity(line.clone(), 2)
        );
        older.unwrap();
        newer.unwrap();

        let slot = session.cart().await.unwrap().line(&line).unwrap().quantity;
        let watched = changes
            .borrow()
            .as_ref()
            .unwrap()
            .line(&line)
            .unwrap()
            .quantity;
        assert_eq!(slot, 2);
        assert_eq!(watched, 2);
    }

    #[tokio::test]
    async fn test_reset_leaves_no_preloaded_checkout_behind() {
        let surface = SlowCheckout::new();
        let session = CartSession::new(
            Arc::new(FakeStorefront::new(1)),
            LocalStore::in_memory(),
            Some(surface.clone()),
        );
        let changes = session.subscribe();

        let (added, ()) = tokio::join!(session.add_item(variant(1)), session.reset_cart());
        added.unwrap();

        assert!(session.cart().await.is_none());
        assert!(changes.borrow().is_none());
        let log = surface.log.lock().unwrap().clone();
        assert_eq!(log.last().map(String::as_str), Some("invalidate"));
    }

    #[tokio::test]
    async fn test_subscribers_see_applied_carts() {
        let (session, _) = session_with(FakeStorefront::new(1));
        let mut changes = session.subscribe();

        session.add_item(variant(1)).await.unwrap();
        changes.changed().await.unwrap();
        assert_eq!(changes.borrow_and_update().as_ref().unwrap().total_quantity, 1);

        session.reset_cart().await;
        changes.changed().await.unwrap();
        assert!(changes.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_pagination_pages_are_disjoint() {
        let (session, _) = session_with(FakeStorefront::new(7));
        let collection = CollectionId::new(COLLECTION_GID);

        let mut seen = HashSet::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;
        loop {
            let page = session
                .fetch_products(&collection, cursor.as_deref(), 3)
                .await
                .unwrap();
            pages += 1;
            for product in &page.products {
                assert!(seen.insert(product.id.clone()), "duplicate {}", product.id);
            }
            match page.next_cursor() {
                Some(next) => cursor = Some(next.to_string()),
                None => break,
            }
        }

        assert_eq!(pages, 3);
        assert_eq!(seen.len(), 7);
    }

    #[tokio::test]
    async fn test_fetch_products_unknown_collection() {
        let (session, _) = session_with(FakeStorefront::new(2));
        let err = session
            .fetch_products(&CollectionId::from_resource_id(404), None, 10)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_fetch_collections_includes_preview() {
        let (session, _) = session_with(FakeStorefront::new(30));
        let collections = session.fetch_collections().await.unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(
            collections[0].products.len(),
            usize::try_from(COLLECTION_PREVIEW_SIZE).unwrap()
        );
    }

    #[tokio::test]
    async fn test_random_product() {
        let (session, _) = session_with(FakeStorefront::new(5));
        let product = session.random_product().await.unwrap().unwrap();
        assert!(product.title.starts_with("Product "));

        let (empty, _) = session_with(FakeStorefront::new(0));
        assert!(empty.random_product().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inject_random_cart_item_only_seeds_empty_session() {
        let (session, fake) = session_with(FakeStorefront::new(5));

        let seeded = session.inject_random_cart_item().await.unwrap().unwrap();
        assert_eq!(seeded.total_quantity, 1);

        assert!(session.inject_random_cart_item().await.unwrap().is_none());
        assert_eq!(fake.cart_count(), 1);
        assert_eq!(session.cart().await.unwrap().total_quantity, 1);
    }

    #[tokio::test]
    async fn test_login_persists_token() {
        let fake = FakeStorefront::new(1).with_customer("ada@example.com", "correct horse");
        let (session, _) = session_with(fake);

        let token = session
            .login_customer("ada@example.com", "correct horse")
            .await
            .unwrap();

        assert_eq!(session.store().customer_access_token().await, Some(token));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let fake = FakeStorefront::new(1).with_customer("ada@example.com", "correct horse");
        let (session, _) = session_with(fake);

        let err = session
            .login_customer("ada@example.com", "wrong")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(session.store().customer_access_token().await.is_none());
    }

    #[tokio::test]
    async fn test_create_customer_duplicate_is_validation_error() {
        let fake = FakeStorefront::new(1).with_customer("ada@example.com", "pw");
        let (session, _) = session_with(fake);

        let err = session
            .create_customer("ada@example.com", "Ada", "Lovelace", "another pw")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let customer = session
            .create_customer("grace@example.com", "Grace", "Hopper", "pw")
            .await
            .unwrap();
        assert_eq!(customer.first_name.as_deref(), Some("Grace"));
    }

    #[tokio::test]
    async fn test_update_customer_password() {
        let fake = FakeStorefront::new(1).with_customer("ada@example.com", "old password");
        let (session, _) = session_with(fake);

        session
            .update_customer_password("ada@example.com", "old password", "new password")
            .await
            .unwrap();
        assert!(session.store().customer_access_token().await.is_none());

        let err = session
            .login_customer("ada@example.com", "old password")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        session
            .login_customer("ada@example.com", "new password")
            .await
            .unwrap();

        let err = session
            .update_customer_password("grace@example.com", "pw", "new password")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_update_customer_password_ignores_other_customers_token() {
        let fake = FakeStorefront::new(1)
            .with_customer("ada@example.com", "pw-a")
            .with_customer("grace@example.com", "pw-g");
        let (session, _) = session_with(fake);
        session.login_customer("ada@example.com", "pw-a").await.unwrap();

        session
            .update_customer_password("grace@example.com", "pw-g", "new pw")
            .await
            .unwrap();

        assert_eq!(
            session.store().snapshot().await.customer_email.as_deref(),
            Some("ada@example.com")
        );
        assert!(session.login_customer("ada@example.com", "new pw").await.is_err());
        assert!(session.login_customer("ada@example.com", "pw-a").await.is_ok());

        let err = session
            .update_customer_password("grace@example.com", "wrong", "other pw")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(session.login_customer("grace@example.com", "new pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_past_orders_empty_versus_failure() {
        let fake = FakeStorefront::new(1)
            .with_customer("ada@example.com", "pw")
            .with_customer("grace@example.com", "pw")
            .with_orders("grace@example.com", 3);
        let (session, _) = session_with(fake);

        let ada = session.login_customer("ada@example.com", "pw").await.unwrap();
        assert!(session.fetch_past_orders(&ada).await.unwrap().is_empty());

        let grace = session
            .login_customer("grace@example.com", "pw")
            .await
            .unwrap();
        let orders = session.fetch_past_orders(&grace).await.unwrap();
        assert_eq!(orders.len(), 3);
        assert!(orders[0].processed_at > orders[2].processed_at);

        let bogus = CustomerAccessToken {
            access_token: "nope".to_string(),
            expires_at: Utc::now() + Duration::days(1),
        };
        let err = session.fetch_past_orders(&bogus).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let expired = CustomerAccessToken {
            expires_at: Utc::now() - Duration::days(1),
            ..grace
        };
        let err = session.fetch_past_orders(&expired).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_stored_past_orders_requires_login() {
        let (session, _) = session_with(FakeStorefront::new(1));
        let err = session.fetch_stored_past_orders().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_checkout_completion_clears_cart() {
        let surface = ScriptedCheckout::new(vec![
            CheckoutEvent::Pixel {
                name: "checkout_started".to_string(),
                data: serde_json::json!({}),
            },
            CheckoutEvent::Completed {
                order_id: Some(OrderId::from_resource_id(1001)),
            },
        ]);
        let session = CartSession::new(
            Arc::new(FakeStorefront::new(1)),
            LocalStore::in_memory(),
            Some(surface.clone()),
        );
        let cart = session.add_item(variant(1)).await.unwrap();

        session.checkout().await.unwrap();

        assert!(session.cart().await.is_none());
        let log = surface.log();
        assert!(log.contains(&format!("preload {}", cart.checkout_url)));
        assert!(log.contains(&format!("present {}", cart.checkout_url)));
        assert_eq!(log.last().map(String::as_str), Some("invalidate"));
    }

    #[tokio::test]
    async fn test_checkout_cancel_keeps_cart() {
        let surface = ScriptedCheckout::new(vec![CheckoutEvent::Canceled]);
        let session = CartSession::new(
            Arc::new(FakeStorefront::new(1)),
            LocalStore::in_memory(),
            Some(surface),
        );
        let cart = session.add_item(variant(1)).await.unwrap();

        session.checkout().await.unwrap();

        assert_eq!(session.cart().await, Some(cart));
    }

    #[tokio::test]
    async fn test_checkout_requires_cart_and_surface() {
        let (without_surface, _) = session_with(FakeStorefront::new(1));
        assert!(matches!(
            without_surface.checkout().await,
            Err(CheckoutError::Unavailable)
        ));

        let session = CartSession::new(
            Arc::new(FakeStorefront::new(1)),
            LocalStore::in_memory(),
            Some(ScriptedCheckout::new(vec![])),
        );
        assert!(matches!(session.checkout().await, Err(CheckoutError::NoCart)));
    }
}
