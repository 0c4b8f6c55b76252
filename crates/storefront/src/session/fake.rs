//! Deterministic in-memory storefront for tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use tokio::sync::oneshot;
use wrapsody_core::{
    CartId, CartLineId, CollectionId, CurrencyCode, CustomerId, FulfillmentStatus, Money,
    OrderId, ProductId, VariantId,
};

use super::api::StorefrontApi;
use crate::shopify::{
    Cart, CartCost, CartLine, CartLineInput, CartLineUpdateInput, CartMerchandise,
    CartMerchandiseProduct, Collection, Customer, CustomerAccessToken, CustomerCreateInput,
    Order, OrderLineItem, PageInfo, Product, ProductPage, ProductVariant, ShopifyError, UserError,
};

pub const COLLECTION_GID: &str = "gid://shopify/Collection/1";

#[derive(Default)]
struct ServerCart {
    lines: Vec<(CartLineId, VariantId, i64)>,
}

#[derive(Default)]
struct State {
    carts: HashMap<CartId, ServerCart>,
    customers: HashMap<String, (String, CustomerId)>,
    orders: HashMap<String, Vec<Order>>,
    next_id: u64,
}

/// In-memory storefront with a fixed catalog of `product_count` products,
/// each with a single variant priced at 5.00 USD.
pub struct FakeStorefront {
    product_count: usize,
    state: Mutex<State>,
    held_response: Mutex<Option<oneshot::Receiver<()>>>,
    pub cart_calls: AtomicUsize,
}

impl FakeStorefront {
    pub fn new(product_count: usize) -> Self {
        Self {
            product_count,
            state: Mutex::new(State::default()),
            held_response: Mutex::new(None),
            cart_calls: AtomicUsize::new(0),
        }
    }

    /// Register a customer that can log in.
    pub fn with_customer(self, email: &str, password: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = CustomerId::from_resource_id(state.next_id);
            state
                .customers
                .insert(email.to_string(), (password.to_string(), id));
        }
        self
    }

    /// Give a customer past orders, oldest first.
    pub fn with_orders(self, email: &str, count: usize) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let orders = (0..count)
                .map(|i| Order {
                    id: OrderId::from_resource_id(1000 + i),
                    name: format!("#{}", 1000 + i),
                    processed_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
                        + Duration::days(i64::try_from(i).unwrap()),
                    fulfillment_status: FulfillmentStatus::Fulfilled,
                    total_price: price(),
                    subtotal: None,
                    total_tax: None,
                    total_shipping: None,
                    line_items: vec![OrderLineItem {
                        title: "Kraft Paper".to_string(),
                        quantity: 1,
                        variant: None,
                    }],
                })
                .collect();
            state.orders.insert(email.to_string(), orders);
        }
        self
    }

    /// The next cart mutation is applied server-side immediately, but its
    /// response is withheld until `gate` fires.
    pub fn hold_next_cart_response(&self, gate: oneshot::Receiver<()>) {
        *self.held_response.lock().unwrap() = Some(gate);
    }

    pub fn cart_count(&self) -> usize {
        self.state.lock().unwrap().carts.len()
    }

    pub fn token_for(email: &str) -> String {
        format!("token-for-{email}")
    }

    fn product(&self, index: usize) -> Product {
        Product {
            id: ProductId::from_resource_id(index),
            handle: format!("product-{index}"),
            title: format!("Product {index}"),
            description: String::new(),
            vendor: "Wrapsody".to_string(),
            tags: vec![],
            product_type: "Paper".to_string(),
            featured_image: None,
            images: vec![],
            variants: vec![ProductVariant {
                id: VariantId::from_resource_id(index),
                title: "Default Title".to_string(),
                price: price(),
                available_for_sale: true,
                image: None,
            }],
            collections: vec![],
        }
    }

    fn snapshot(cart_id: &CartId, cart: &ServerCart) -> Cart {
        let lines: Vec<CartLine> = cart
            .lines
            .iter()
            .map(|(line_id, variant_id, quantity)| CartLine {
                id: line_id.clone(),
                quantity: *quantity,
                merchandise: CartMerchandise {
                    id: variant_id.clone(),
                    title: "Default Title".to_string(),
                    price: price(),
                    image: None,
                    product: CartMerchandiseProduct {
                        id: ProductId::new(variant_id.as_str().replace("ProductVariant", "Product")),
                        handle: "product".to_string(),
                        title: "Product".to_string(),
                    },
                },
            })
            .collect();
        let total_quantity = lines.iter().map(|line| line.quantity).sum();
        let subtotal = price().times(total_quantity).unwrap();
        Cart {
            id: cart_id.clone(),
            checkout_url: format!(
                "https://wrapsody.example/cart/c/{}",
                cart_id.resource_id().unwrap_or_default()
            ),
            total_quantity,
            lines,
            cost: CartCost {
                subtotal: subtotal.clone(),
                total: subtotal,
                total_tax: None,
                total_shipping: None,
            },
        }
    }

    async fn respond(&self, cart: Result<Cart, ShopifyError>) -> Result<Cart, ShopifyError> {
        self.cart_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.held_response.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        cart
    }

    fn mutate(
        &self,
        cart_id: &CartId,
        change: impl FnOnce(&mut State, &CartId) -> Result<(), ShopifyError>,
    ) -> Result<Cart, ShopifyError> {
        let mut state = self.state.lock().unwrap();
        if !state.carts.contains_key(cart_id) {
            return Err(ShopifyError::NotFound(format!("Cart not found: {cart_id}")));
        }
        change(&mut *state, cart_id)?;
        let cart = &state.carts[cart_id];
        Ok(Self::snapshot(cart_id, cart))
    }

    fn add_lines(state: &mut State, cart_id: &CartId, lines: Vec<CartLineInput>) {
        for input in lines {
            state.next_id += 1;
            let next_id = state.next_id;
            let Some(cart) = state.carts.get_mut(cart_id) else {
                return;
            };
            if let Some(line) = cart
                .lines
                .iter_mut()
                .find(|(_, variant, _)| variant == &input.merchandise_id)
            {
                line.2 += input.quantity;
            } else {
                cart.lines.push((
                    CartLineId::from_resource_id(next_id),
                    input.merchandise_id,
                    input.quantity,
                ));
            }
        }
    }
}

fn price() -> Money {
    Money::new(Decimal::new(500, 2), CurrencyCode::default())
}

#[async_trait]
impl StorefrontApi for FakeStorefront {
    async fn create_customer(&self, input: CustomerCreateInput) -> Result<Customer, ShopifyError> {
        let id = {
            let mut state = self.state.lock().unwrap();
            if state.customers.contains_key(&input.email) {
                return Err(ShopifyError::Validation(vec![UserError {
                    code: Some("TAKEN".to_string()),
                    field: vec!["input".to_string(), "email".to_string()],
                    message: "Email has already been taken".to_string(),
                }]));
            }
            state.next_id += 1;
            let id = CustomerId::from_resource_id(state.next_id);
            state
                .customers
                .insert(input.email.clone(), (input.password, id.clone()));
            id
        };

        Ok(Customer {
            id,
            first_name: Some(input.first_name),
            last_name: Some(input.last_name),
            email: Some(input.email),
        })
    }

    async fn create_customer_access_token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let state = self.state.lock().unwrap();
        match state.customers.get(email) {
            Some((stored, _)) if stored == password => Ok(CustomerAccessToken {
                access_token: Self::token_for(email),
                expires_at: Utc::now() + Duration::days(30),
            }),
            _ => Err(ShopifyError::Unauthorized("Unidentified customer".to_string())),
        }
    }

    async fn update_customer_password(
        &self,
        customer_access_token: &str,
        password: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let mut state = self.state.lock().unwrap();
        let (email, customer) = state
            .customers
            .iter_mut()
            .find(|(email, _)| Self::token_for(email) == customer_access_token)
            .ok_or_else(|| ShopifyError::Unauthorized("Customer not found".to_string()))?;
        customer.0 = password.to_string();
        Ok(CustomerAccessToken {
            access_token: Self::token_for(email),
            expires_at: Utc::now() + Duration::days(30),
        })
    }

    async fn customer_orders(
        &self,
        customer_access_token: &str,
        first: i64,
    ) -> Result<Vec<Order>, ShopifyError> {
        let state = self.state.lock().unwrap();
        let email = state
            .customers
            .keys()
            .find(|email| Self::token_for(email) == customer_access_token)
            .ok_or_else(|| ShopifyError::Unauthorized("Customer not found".to_string()))?;
        let mut orders = state.orders.get(email).cloned().unwrap_or_default();
        orders.reverse();
        orders.truncate(usize::try_from(first).unwrap());
        Ok(orders)
    }

    async fn cart_create(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        let cart = {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let cart_id = CartId::new(format!("gid://shopify/Cart/c{}?key=k", state.next_id));
            state.carts.insert(cart_id.clone(), ServerCart::default());
            Self::add_lines(&mut *state, &cart_id, lines);
            Self::snapshot(&cart_id, &state.carts[&cart_id])
        };
        self.respond(Ok(cart)).await
    }

    async fn cart_lines_add(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let cart = self.mutate(cart_id, |state, id| {
            Self::add_lines(state, id, lines);
            Ok(())
        });
        self.respond(cart).await
    }

    async fn cart_lines_update(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let cart = self.mutate(cart_id, |state, id| {
            let cart = state
                .carts
                .get_mut(id)
                .ok_or_else(|| ShopifyError::NotFound(id.to_string()))?;
            for update in lines {
                let line = cart
                    .lines
                    .iter_mut()
                    .find(|(line_id, _, _)| line_id == &update.id)
                    .ok_or_else(|| {
                        ShopifyError::Validation(vec![UserError {
                            code: Some("INVALID".to_string()),
                            field: vec!["lines".to_string()],
                            message: "The merchandise line does not exist".to_string(),
                        }])
                    })?;
                line.2 = update.quantity;
            }
            Ok(())
        });
        self.respond(cart).await
    }

    async fn cart_lines_remove(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError> {
        let cart = self.mutate(cart_id, |state, id| {
            if let Some(cart) = state.carts.get_mut(id) {
                cart.lines.retain(|(line_id, _, _)| !line_ids.contains(line_id));
            }
            Ok(())
        });
        self.respond(cart).await
    }

    async fn products(&self, first: i64) -> Result<Vec<Product>, ShopifyError> {
        let first = usize::try_from(first).unwrap_or(0);
        Ok((1..=self.product_count.min(first))
            .map(|i| self.product(i))
            .collect())
    }

    async fn collections(
        &self,
        _first: i64,
        products_first: i64,
    ) -> Result<Vec<Collection>, ShopifyError> {
        let preview = usize::try_from(products_first).unwrap_or(0);
        Ok(vec![Collection {
            id: CollectionId::new(COLLECTION_GID),
            handle: "all".to_string(),
            title: "All".to_string(),
            description: String::new(),
            image: None,
            products: (1..=self.product_count.min(preview))
                .map(|i| self.product(i))
                .collect(),
        }])
    }

    async fn collection_products(
        &self,
        collection_id: &CollectionId,
        first: i64,
        after: Option<&str>,
    ) -> Result<ProductPage, ShopifyError> {
        if collection_id.as_str() != COLLECTION_GID {
            return Err(ShopifyError::NotFound(format!(
                "Collection not found: {collection_id}"
            )));
        }
        let start = after.map_or(0, |cursor| cursor.parse::<usize>().unwrap());
        let end = (start + usize::try_from(first).unwrap()).min(self.product_count);
        Ok(ProductPage {
            products: (start + 1..=end).map(|i| self.product(i)).collect(),
            page_info: PageInfo {
                has_next_page: end < self.product_count,
                end_cursor: Some(end.to_string()),
            },
        })
    }
}
