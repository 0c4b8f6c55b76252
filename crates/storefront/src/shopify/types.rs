//! Domain types for Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw
//! wire types the GraphQL documents deserialize into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wrapsody_core::{
    CartId, CartLineId, CollectionId, CustomerId, FulfillmentStatus, ImageId, Money, OrderId,
    ProductId, VariantId,
};

// =============================================================================
// Image Types
// =============================================================================

/// Product, variant or collection image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Shopify image ID.
    pub id: Option<ImageId>,
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
    /// Image width in pixels.
    pub width: Option<i64>,
    /// Image height in pixels.
    pub height: Option<i64>,
}

// =============================================================================
// Product Types
// =============================================================================

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID (the cart's merchandise ID).
    pub id: VariantId,
    /// Variant title (e.g., "Small / Red").
    pub title: String,
    /// Current price.
    pub price: Money,
    /// Whether the variant can be bought.
    pub available_for_sale: bool,
    /// Variant image.
    pub image: Option<Image>,
}

/// Collection membership of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRef {
    /// Collection ID.
    pub id: CollectionId,
    /// Collection title.
    pub title: String,
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Plain text description.
    pub description: String,
    /// Vendor name.
    pub vendor: String,
    /// Product tags.
    pub tags: Vec<String>,
    /// Product type.
    pub product_type: String,
    /// Featured image.
    pub featured_image: Option<Image>,
    /// Product images.
    pub images: Vec<Image>,
    /// Product variants.
    pub variants: Vec<ProductVariant>,
    /// Collections containing this product.
    pub collections: Vec<CollectionRef>,
}

impl Product {
    /// The variant added to a cart when no choice was made.
    #[must_use]
    pub fn first_variant(&self) -> Option<&ProductVariant> {
        self.variants.first()
    }
}

// =============================================================================
// Collection Types
// =============================================================================

/// A product collection with its first page of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection ID.
    pub id: CollectionId,
    /// URL handle.
    pub handle: String,
    /// Collection title.
    pub title: String,
    /// Plain text description.
    pub description: String,
    /// Collection image.
    pub image: Option<Image>,
    /// First page of products in this collection.
    pub products: Vec<Product>,
}

// =============================================================================
// Pagination Types
// =============================================================================

/// Pagination information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Cursor for the last item.
    pub end_cursor: Option<String>,
}

/// One page of a collection's products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    /// Products in this page.
    pub products: Vec<Product>,
    /// Pagination info.
    pub page_info: PageInfo,
}

impl ProductPage {
    /// Cursor to pass as `after` for the next page, if there is one.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        if self.page_info.has_next_page {
            self.page_info.end_cursor.as_deref()
        } else {
            None
        }
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// Parent product of a cart line's variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandiseProduct {
    /// Product ID.
    pub id: ProductId,
    /// Product handle.
    pub handle: String,
    /// Product title.
    pub title: String,
}

/// The variant referenced by a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: VariantId,
    /// Variant title.
    pub title: String,
    /// Current price.
    pub price: Money,
    /// Variant image.
    pub image: Option<Image>,
    /// Parent product info.
    pub product: CartMerchandiseProduct,
}

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID.
    pub id: CartLineId,
    /// Quantity.
    pub quantity: i64,
    /// Product variant.
    pub merchandise: CartMerchandise,
}

/// Cart cost summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCost {
    /// Subtotal before tax.
    pub subtotal: Money,
    /// Total amount.
    pub total: Money,
    /// Total tax amount, once the store has estimated it.
    pub total_tax: Option<Money>,
    /// Estimated shipping of the selected delivery options, once the buyer has picked any.
    pub total_shipping: Option<Money>,
}

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// Hosted checkout URL.
    pub checkout_url: String,
    /// Total item quantity.
    pub total_quantity: i64,
    /// Cart lines.
    pub lines: Vec<CartLine>,
    /// Cart cost summary.
    pub cost: CartCost,
}

impl Cart {
    /// Find a line by its ID.
    #[must_use]
    pub fn line(&self, id: &CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    /// Find the line holding a variant.
    #[must_use]
    pub fn line_for_variant(&self, variant_id: &VariantId) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|line| &line.merchandise.id == variant_id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Input for adding a line to cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: VariantId,
    /// Quantity to add.
    pub quantity: i64,
}

/// Input for updating a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: CartLineId,
    /// New quantity.
    pub quantity: i64,
}

// =============================================================================
// Customer Types
// =============================================================================

/// A storefront customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer ID.
    pub id: CustomerId,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Email.
    pub email: Option<String>,
}

/// Input for creating a customer.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreateInput {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
}

impl std::fmt::Debug for CustomerCreateInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerCreateInput")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// Token authorizing customer-scoped queries such as order history.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAccessToken {
    /// Opaque access token.
    pub access_token: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl CustomerAccessToken {
    /// Whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl std::fmt::Debug for CustomerAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerAccessToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// =============================================================================
// Order Types
// =============================================================================

/// Variant reference on an order line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderVariant {
    /// Variant ID.
    pub id: VariantId,
    /// Variant title.
    pub title: String,
    /// Current price.
    pub price: Money,
    /// Variant image.
    pub image: Option<Image>,
}

/// A line item on a past order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// Product title at purchase time.
    pub title: String,
    /// Quantity ordered.
    pub quantity: i64,
    /// Variant, unless it has since been deleted.
    pub variant: Option<OrderVariant>,
}

/// A past order of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// Display name (e.g., "#1001").
    pub name: String,
    /// When the order was processed.
    pub processed_at: DateTime<Utc>,
    /// Fulfillment status.
    pub fulfillment_status: FulfillmentStatus,
    /// Total price.
    pub total_price: Money,
    /// Subtotal price.
    pub subtotal: Option<Money>,
    /// Total tax.
    pub total_tax: Option<Money>,
    /// Total shipping.
    pub total_shipping: Option<Money>,
    /// Line items.
    pub line_items: Vec<OrderLineItem>,
}

// =============================================================================
// Errors
// =============================================================================

/// User error from a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    /// Error code.
    pub code: Option<String>,
    /// Field path that caused the error.
    pub field: Vec<String>,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.field.join("."), self.message)
        }
    }
}
