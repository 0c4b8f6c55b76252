//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client`'s query contract with `reqwest` 0.13 for HTTP.
//! Caches product and collection listings using `moka` (5-minute TTL).

mod cache;
mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::SecretString;
use tracing::{debug, instrument};
use wrapsody_core::{CartId, CartLineId, CollectionId};

use crate::config::{ShopifyStorefrontConfig, expose};
use crate::shopify::types::{
    Cart, CartLineInput, CartLineUpdateInput, Collection, Customer, CustomerAccessToken,
    CustomerCreateInput, Order, Product, ProductPage,
};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use cache::{CacheKey, CacheValue};
use conversions::{
    convert_access_token, convert_cart, convert_collection, convert_customer, convert_order,
    convert_product, convert_product_page, convert_user_errors,
};
use queries::fragments::CartPayload;
use queries::{
    CartCreate, CartLinesAdd, CartLinesRemove, CartLinesUpdate, CollectionProducts, Collections,
    CustomerAccessTokenCreate, CustomerCreate, CustomerOrders, CustomerPasswordUpdate, Products,
    cart_create, cart_lines_add, cart_lines_remove, cart_lines_update, collection_products,
    collections, customer_access_token_create, customer_create, customer_orders,
    customer_password_update, products,
};

/// Header carrying a public (client-safe) Storefront token.
const PUBLIC_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";
/// Header carrying a private (server-side) Storefront token.
const PRIVATE_TOKEN_HEADER: &str = "Shopify-Storefront-Private-Token";

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides typed access to customers, orders, carts, products and
/// collections. Product and collection listings are cached for 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    token_header: &'static str,
    access_token: SecretString,
    country: Option<String>,
    cache: Cache<CacheKey, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// Uses the private token when one is configured, the public token
    /// otherwise.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let (token_header, access_token) = config.storefront_private_token.as_ref().map_or_else(
            || {
                (
                    PUBLIC_TOKEN_HEADER,
                    SecretString::from(config.storefront_public_token.clone()),
                )
            },
            |private| (PRIVATE_TOKEN_HEADER, private.clone()),
        );

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint(),
                token_header,
                access_token,
                country: Some(config.country.clone()),
                cache,
            }),
        }
    }

    /// The country sent with `@inContext`.
    #[must_use]
    pub fn country(&self) -> Option<&str> {
        self.inner.country.as_deref()
    }

    fn country_variable(&self) -> Option<String> {
        self.inner.country.clone()
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(self.inner.token_header, expose(&self.inner.access_token))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "Shopify API returned non-success status"
            );
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(ShopifyError::Unauthorized(format!(
                    "Storefront API rejected the access token (HTTP {status})"
                )));
            }
            return Err(ShopifyError::GraphQL(vec![GraphQLError::message(format!(
                "HTTP {status}: {}",
                truncate(&response_text, 200)
            ))]));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = request_body.operation_name,
                    body = %truncate(&response_text, 500),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }

    // =========================================================================
    // Customer Methods
    // =========================================================================

    /// Create a customer account.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Validation` carrying every rejected field, or
    /// an error if the API request fails.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_customer(
        &self,
        input: CustomerCreateInput,
    ) -> Result<Customer, ShopifyError> {
        let data = self
            .execute::<CustomerCreate>(customer_create::Variables { input })
            .await?;

        let payload = data.customer_create.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError::message("Failed to create customer")])
        })?;

        if !payload.customer_user_errors.is_empty() {
            return Err(ShopifyError::Validation(convert_user_errors(
                payload.customer_user_errors,
            )));
        }

        payload.customer.map(convert_customer).ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError::message("Failed to create customer")])
        })
    }

    /// Exchange email and password for a customer access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Unauthorized` if the credentials are rejected,
    /// or an error if the API request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn create_customer_access_token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let variables = customer_access_token_create::Variables {
            input: customer_access_token_create::Input {
                email: email.to_string(),
                password: password.to_string(),
            },
        };

        let data = self.execute::<CustomerAccessTokenCreate>(variables).await?;

        let payload = data.customer_access_token_create.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError::message(
                "Failed to create customer access token",
            )])
        })?;

        if !payload.customer_user_errors.is_empty() {
            return Err(ShopifyError::Unauthorized(
                payload
                    .customer_user_errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; "),
            ));
        }

        payload
            .customer_access_token
            .map(convert_access_token)
            .ok_or_else(|| ShopifyError::Unauthorized("No access token returned".to_string()))
    }

    /// Change the logged-in customer's password.
    ///
    /// Shopify revokes the old access token; the returned token replaces it.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Validation` if the password is rejected,
    /// `ShopifyError::Unauthorized` if the token is no longer valid, or an
    /// error if the API request fails.
    #[instrument(skip_all)]
    pub async fn update_customer_password(
        &self,
        customer_access_token: &str,
        password: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let variables = customer_password_update::Variables {
            customer_access_token: customer_access_token.to_string(),
            customer: customer_password_update::Input {
                password: password.to_string(),
            },
        };

        let data = self.execute::<CustomerPasswordUpdate>(variables).await?;

        let payload = data.customer_update.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError::message(
                "Failed to update customer password",
            )])
        })?;

        if !payload.customer_user_errors.is_empty() {
            return Err(ShopifyError::Validation(convert_user_errors(
                payload.customer_user_errors,
            )));
        }

        payload
            .customer_access_token
            .map(convert_access_token)
            .ok_or_else(|| ShopifyError::Unauthorized("Customer access token was rejected".to_string()))
    }

    /// Get a customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Unauthorized` if the token does not resolve to
    /// a customer, or an error if the API request fails.
    #[instrument(skip(self, customer_access_token))]
    pub async fn get_customer_orders(
        &self,
        customer_access_token: &str,
        first: i64,
    ) -> Result<Vec<Order>, ShopifyError> {
        let variables = customer_orders::Variables {
            customer_access_token: customer_access_token.to_string(),
            first,
        };

        let data = self.execute::<CustomerOrders>(variables).await?;

        let customer = data.customer.ok_or_else(|| {
            ShopifyError::Unauthorized("Customer access token is invalid or expired".to_string())
        })?;

        let orders: Vec<Order> = customer
            .orders
            .nodes
            .into_iter()
            .map(convert_order)
            .collect();

        debug!(count = orders.len(), "Fetched customer orders");
        Ok(orders)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Create a new cart with the given lines.
    ///
    /// # Errors
    ///
    /// Returns an error if cart creation fails or user errors are returned.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        let variables = cart_create::Variables {
            input: cart_create::CartInput { lines },
            country: self.country_variable(),
        };

        let data = self.execute::<CartCreate>(variables).await?;
        cart_from_payload(data.cart_create, "create cart")
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_cart_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = cart_lines_add::Variables {
            cart_id: cart_id.clone(),
            lines,
            country: self.country_variable(),
        };

        let data = self.execute::<CartLinesAdd>(variables).await?;
        cart_from_payload(data.cart_lines_add, "add to cart")
    }

    /// Update cart line quantities.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_cart_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = cart_lines_update::Variables {
            cart_id: cart_id.clone(),
            lines,
            country: self.country_variable(),
        };

        let data = self.execute::<CartLinesUpdate>(variables).await?;
        cart_from_payload(data.cart_lines_update, "update cart lines")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_cart_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError> {
        let variables = cart_lines_remove::Variables {
            cart_id: cart_id.clone(),
            line_ids,
            country: self.country_variable(),
        };

        let data = self.execute::<CartLinesRemove>(variables).await?;
        cart_from_payload(data.cart_lines_remove, "remove from cart")
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get the first `first` products of the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self, first: i64) -> Result<Vec<Product>, ShopifyError> {
        let cache_key = CacheKey::Products { first };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let variables = products::Variables {
            first,
            country: self.country_variable(),
        };

        let data = self.execute::<Products>(variables).await?;
        let products: Vec<Product> = data
            .products
            .nodes
            .into_iter()
            .map(convert_product)
            .collect();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get the first `first` collections, each with its first
    /// `products_first` products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(
        &self,
        first: i64,
        products_first: i64,
    ) -> Result<Vec<Collection>, ShopifyError> {
        let cache_key = CacheKey::Collections {
            first,
            products_first,
        };

        if let Some(CacheValue::Collections(collections)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for collections");
            return Ok(collections);
        }

        let variables = collections::Variables {
            first,
            products_first,
            country: self.country_variable(),
        };

        let data = self.execute::<Collections>(variables).await?;
        let collections: Vec<Collection> = data
            .collections
            .nodes
            .into_iter()
            .map(convert_collection)
            .collect();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Collections(collections.clone()))
            .await;

        Ok(collections)
    }

    /// Get one page of a collection's products.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` for an unknown collection, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(collection_id = %collection_id))]
    pub async fn get_collection_products(
        &self,
        collection_id: &CollectionId,
        first: i64,
        after: Option<&str>,
    ) -> Result<ProductPage, ShopifyError> {
        let cache_key = CacheKey::CollectionProducts {
            id: collection_id.clone(),
            first,
            after: after.map(String::from),
        };

        if let Some(CacheValue::ProductPage(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for collection products");
            return Ok(*page);
        }

        let variables = collection_products::Variables {
            id: collection_id.clone(),
            first,
            after: after.map(String::from),
            country: self.country_variable(),
        };

        let data = self.execute::<CollectionProducts>(variables).await?;
        let page = data
            .collection
            .map(|c| convert_product_page(c.products))
            .ok_or_else(|| {
                ShopifyError::NotFound(format!("Collection not found: {collection_id}"))
            })?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::ProductPage(Box::new(page.clone())))
            .await;

        Ok(page)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

/// Unwrap a cart mutation payload.
fn cart_from_payload(payload: Option<CartPayload>, action: &str) -> Result<Cart, ShopifyError> {
    let Some(payload) = payload else {
        return Err(ShopifyError::GraphQL(vec![GraphQLError::message(format!(
            "Failed to {action}"
        ))]));
    };

    if !payload.user_errors.is_empty() {
        return Err(ShopifyError::Validation(convert_user_errors(
            payload.user_errors,
        )));
    }

    payload
        .cart
        .map(convert_cart)
        .ok_or_else(|| ShopifyError::NotFound(format!("Cart not returned by {action}")))
}

fn convert_graphql_error(e: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: e.message,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                    graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
