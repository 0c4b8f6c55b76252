//! The storefront operations the session depends on.

use async_trait::async_trait;
use wrapsody_core::{CartId, CartLineId, CollectionId};

use crate::shopify::{
    Cart, CartLineInput, CartLineUpdateInput, Collection, Customer, CustomerAccessToken,
    CustomerCreateInput, Order, Product, ProductPage, ShopifyError, StorefrontClient,
};

/// Storefront calls made by [`CartSession`](super::CartSession).
///
/// Implemented by [`StorefrontClient`]; tests substitute an in-memory store.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn create_customer(&self, input: CustomerCreateInput) -> Result<Customer, ShopifyError>;

    async fn create_customer_access_token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerAccessToken, ShopifyError>;

    async fn update_customer_password(
        &self,
        customer_access_token: &str,
        password: &str,
    ) -> Result<CustomerAccessToken, ShopifyError>;

    /// The customer's orders, newest first.
    async fn customer_orders(
        &self,
        customer_access_token: &str,
        first: i64,
    ) -> Result<Vec<Order>, ShopifyError>;

    async fn cart_create(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError>;

    async fn cart_lines_add(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError>;

    async fn cart_lines_update(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError>;

    async fn cart_lines_remove(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError>;

    async fn products(&self, first: i64) -> Result<Vec<Product>, ShopifyError>;

    async fn collections(
        &self,
        first: i64,
        products_first: i64,
    ) -> Result<Vec<Collection>, ShopifyError>;

    async fn collection_products(
        &self,
        collection_id: &CollectionId,
        first: i64,
        after: Option<&str>,
    ) -> Result<ProductPage, ShopifyError>;
}

#[async_trait]
impl StorefrontApi for StorefrontClient {
    async fn create_customer(&self, input: CustomerCreateInput) -> Result<Customer, ShopifyError> {
        Self::create_customer(self, input).await
    }

    async fn create_customer_access_token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        Self::create_customer_access_token(self, email, password).await
    }

    async fn update_customer_password(
        &self,
        customer_access_token: &str,
        password: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        Self::update_customer_password(self, customer_access_token, password).await
    }

    async fn customer_orders(
        &self,
        customer_access_token: &str,
        first: i64,
    ) -> Result<Vec<Order>, ShopifyError> {
        self.get_customer_orders(customer_access_token, first).await
    }

    async fn cart_create(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        self.create_cart(lines).await
    }

    async fn cart_lines_add(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        self.add_cart_lines(cart_id, lines).await
    }

    async fn cart_lines_update(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        self.update_cart_lines(cart_id, lines).await
    }

    async fn cart_lines_remove(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError> {
        self.remove_cart_lines(cart_id, line_ids).await
    }

    async fn products(&self, first: i64) -> Result<Vec<Product>, ShopifyError> {
        self.get_products(first).await
    }

    async fn collections(
        &self,
        first: i64,
        products_first: i64,
    ) -> Result<Vec<Collection>, ShopifyError> {
        self.get_collections(first, products_first).await
    }

    async fn collection_products(
        &self,
        collection_id: &CollectionId,
        first: i64,
        after: Option<&str>,
    ) -> Result<ProductPage, ShopifyError> {
        self.get_collection_products(collection_id, first, after)
            .await
    }
}
