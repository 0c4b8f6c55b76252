//! GraphQL documents for the Shopify Storefront API.
//!
//! Documents are assembled at compile time from shared fragments. Each
//! operation is a unit struct implementing [`GraphQLQuery`] with a sibling
//! module holding its `Variables` and `ResponseData`, the same shape
//! `graphql_client`'s derive produces.

use graphql_client::{GraphQLQuery, QueryBody};

// =============================================================================
// Fragments
// =============================================================================

macro_rules! money_fragment {
    () => {
        "fragment MoneyFields on MoneyV2 { amount currencyCode }\n"
    };
}

macro_rules! image_fragment {
    () => {
        "fragment ImageFields on Image { id url altText width height }\n"
    };
}

macro_rules! product_fragment {
    () => {
        concat!(
            "fragment ProductFields on Product {\n",
            "  id handle title description vendor tags productType\n",
            "  featuredImage { ...ImageFields }\n",
            "  images(first: 10) { nodes { ...ImageFields } }\n",
            "  variants(first: 50) {\n",
            "    nodes { id title availableForSale price { ...MoneyFields } image { ...ImageFields } }\n",
            "  }\n",
            "  collections(first: 10) { nodes { id title } }\n",
            "}\n",
        )
    };
}

macro_rules! cart_fragment {
    () => {
        concat!(
            "fragment CartFields on Cart {\n",
            "  id checkoutUrl totalQuantity\n",
            "  lines(first: 250) {\n",
            "    nodes {\n",
            "      id quantity\n",
            "      merchandise {\n",
            "        ... on ProductVariant {\n",
            "          id title price { ...MoneyFields } image { ...ImageFields }\n",
            "          product { id handle title }\n",
            "        }\n",
            "      }\n",
            "    }\n",
            "  }\n",
            "  cost {\n",
            "    subtotalAmount { ...MoneyFields }\n",
            "    totalAmount { ...MoneyFields }\n",
            "    totalTaxAmount { ...MoneyFields }\n",
            "  }\n",
            "  deliveryGroups(first: 10) {\n",
            "    nodes { selectedDeliveryOption { estimatedCost { ...MoneyFields } } }\n",
            "  }\n",
            "}\n",
        )
    };
}

macro_rules! collection_fragment {
    () => {
        concat!(
            "fragment CollectionFields on Collection {\n",
            "  id handle title description image { ...ImageFields }\n",
            "  products(first: $productsFirst) { nodes { ...ProductFields } }\n",
            "}\n",
        )
    };
}

macro_rules! order_fragment {
    () => {
        concat!(
            "fragment OrderFields on Order {\n",
            "  id name processedAt fulfillmentStatus\n",
            "  totalPrice { ...MoneyFields }\n",
            "  subtotalPrice { ...MoneyFields }\n",
            "  totalTax { ...MoneyFields }\n",
            "  totalShippingPrice { ...MoneyFields }\n",
            "  lineItems(first: 250) {\n",
            "    nodes {\n",
            "      title quantity\n",
            "      variant { id title price { ...MoneyFields } image { ...ImageFields } }\n",
            "    }\n",
            "  }\n",
            "}\n",
        )
    };
}

macro_rules! user_errors {
    ($field:literal) => {
        concat!($field, " { code field message }\n")
    };
}

macro_rules! cart_mutation {
    ($header:literal, $call:literal) => {
        concat!(
            $header,
            " @inContext(country: $country) {\n",
            "  ",
            $call,
            " {\n",
            "    cart { ...CartFields }\n",
            "    ",
            user_errors!("userErrors"),
            "  }\n",
            "}\n",
            cart_fragment!(),
            money_fragment!(),
            image_fragment!(),
        )
    };
}

/// Implement [`GraphQLQuery`] for an operation struct.
macro_rules! operation {
    ($name:ident, $module:ident, $operation:literal, $document:expr) => {
        #[doc = concat!("The `", $operation, "` operation.")]
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $document,
                    operation_name: $operation,
                }
            }
        }
    };
}

// =============================================================================
// Documents
// =============================================================================

pub const CUSTOMER_CREATE: &str = concat!(
    "mutation CustomerCreate($input: CustomerCreateInput!) {\n",
    "  customerCreate(input: $input) {\n",
    "    customer { id firstName lastName email }\n",
    "    ",
    user_errors!("customerUserErrors"),
    "  }\n",
    "}\n",
);

pub const CUSTOMER_ACCESS_TOKEN_CREATE: &str = concat!(
    "mutation CustomerAccessTokenCreate($input: CustomerAccessTokenCreateInput!) {\n",
    "  customerAccessTokenCreate(input: $input) {\n",
    "    customerAccessToken { accessToken expiresAt }\n",
    "    ",
    user_errors!("customerUserErrors"),
    "  }\n",
    "}\n",
);

pub const CUSTOMER_PASSWORD_UPDATE: &str = concat!(
    "mutation CustomerPasswordUpdate($customerAccessToken: String!, $customer: CustomerUpdateInput!) {\n",
    "  customerUpdate(customerAccessToken: $customerAccessToken, customer: $customer) {\n",
    "    customerAccessToken { accessToken expiresAt }\n",
    "    ",
    user_errors!("customerUserErrors"),
    "  }\n",
    "}\n",
);

pub const CUSTOMER_ORDERS: &str = concat!(
    "query CustomerOrders($customerAccessToken: String!, $first: Int!) {\n",
    "  customer(customerAccessToken: $customerAccessToken) {\n",
    "    orders(first: $first, sortKey: PROCESSED_AT, reverse: true) {\n",
    "      nodes { ...OrderFields }\n",
    "    }\n",
    "  }\n",
    "}\n",
    order_fragment!(),
    money_fragment!(),
    image_fragment!(),
);

pub const CART_CREATE: &str = cart_mutation!(
    "mutation CartCreate($input: CartInput!, $country: CountryCode)",
    "cartCreate(input: $input)"
);

pub const CART_LINES_ADD: &str = cart_mutation!(
    "mutation CartLinesAdd($cartId: ID!, $lines: [CartLineInput!]!, $country: CountryCode)",
    "cartLinesAdd(cartId: $cartId, lines: $lines)"
);

pub const CART_LINES_UPDATE: &str = cart_mutation!(
    "mutation CartLinesUpdate($cartId: ID!, $lines: [CartLineUpdateInput!]!, $country: CountryCode)",
    "cartLinesUpdate(cartId: $cartId, lines: $lines)"
);

pub const CART_LINES_REMOVE: &str = cart_mutation!(
    "mutation CartLinesRemove($cartId: ID!, $lineIds: [ID!]!, $country: CountryCode)",
    "cartLinesRemove(cartId: $cartId, lineIds: $lineIds)"
);

pub const PRODUCTS: &str = concat!(
    "query Products($first: Int!, $country: CountryCode) @inContext(country: $country) {\n",
    "  products(first: $first) { nodes { ...ProductFields } }\n",
    "}\n",
    product_fragment!(),
    money_fragment!(),
    image_fragment!(),
);

pub const COLLECTIONS: &str = concat!(
    "query Collections($first: Int!, $productsFirst: Int!, $country: CountryCode)",
    " @inContext(country: $country) {\n",
    "  collections(first: $first) { nodes { ...CollectionFields } }\n",
    "}\n",
    collection_fragment!(),
    product_fragment!(),
    money_fragment!(),
    image_fragment!(),
);

pub const COLLECTION_PRODUCTS: &str = concat!(
    "query CollectionProducts($id: ID!, $first: Int!, $after: String, $country: CountryCode)",
    " @inContext(country: $country) {\n",
    "  collection(id: $id) {\n",
    "    products(first: $first, after: $after) {\n",
    "      pageInfo { hasNextPage endCursor }\n",
    "      nodes { ...ProductFields }\n",
    "    }\n",
    "  }\n",
    "}\n",
    product_fragment!(),
    money_fragment!(),
    image_fragment!(),
);

operation!(CustomerCreate, customer_create, "CustomerCreate", CUSTOMER_CREATE);
operation!(
    CustomerAccessTokenCreate,
    customer_access_token_create,
    "CustomerAccessTokenCreate",
    CUSTOMER_ACCESS_TOKEN_CREATE
);
operation!(
    CustomerPasswordUpdate,
    customer_password_update,
    "CustomerPasswordUpdate",
    CUSTOMER_PASSWORD_UPDATE
);
operation!(CustomerOrders, customer_orders, "CustomerOrders", CUSTOMER_ORDERS);
operation!(CartCreate, cart_create, "CartCreate", CART_CREATE);
operation!(CartLinesAdd, cart_lines_add, "CartLinesAdd", CART_LINES_ADD);
operation!(CartLinesUpdate, cart_lines_update, "CartLinesUpdate", CART_LINES_UPDATE);
operation!(CartLinesRemove, cart_lines_remove, "CartLinesRemove", CART_LINES_REMOVE);
operation!(Products, products, "Products", PRODUCTS);
operation!(Collections, collections, "Collections", COLLECTIONS);
operation!(
    CollectionProducts,
    collection_products,
    "CollectionProducts",
    COLLECTION_PRODUCTS
);

// =============================================================================
// Wire Types
// =============================================================================

/// Response shapes shared by several operations.
pub mod fragments {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;
    use wrapsody_core::FulfillmentStatus;

    /// A connection selected through its `nodes` field.
    #[derive(Debug, Clone, Deserialize)]
    pub struct Nodes<T> {
        pub nodes: Vec<T>,
    }

    impl<T> Default for Nodes<T> {
        fn default() -> Self {
            Self { nodes: Vec::new() }
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MoneyFields {
        pub amount: String,
        pub currency_code: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ImageFields {
        pub id: Option<String>,
        pub url: String,
        pub alt_text: Option<String>,
        pub width: Option<i64>,
        pub height: Option<i64>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VariantFields {
        pub id: String,
        pub title: String,
        pub available_for_sale: bool,
        pub price: MoneyFields,
        pub image: Option<ImageFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CollectionRefFields {
        pub id: String,
        pub title: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductFields {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub description: String,
        pub vendor: String,
        pub tags: Vec<String>,
        pub product_type: String,
        pub featured_image: Option<ImageFields>,
        #[serde(default)]
        pub images: Nodes<ImageFields>,
        #[serde(default)]
        pub variants: Nodes<VariantFields>,
        #[serde(default)]
        pub collections: Nodes<CollectionRefFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CollectionFields {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub description: String,
        pub image: Option<ImageFields>,
        #[serde(default)]
        pub products: Nodes<ProductFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PageInfoFields {
        pub has_next_page: bool,
        pub end_cursor: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct MerchandiseProductFields {
        pub id: String,
        pub handle: String,
        pub title: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct MerchandiseFields {
        pub id: String,
        pub title: String,
        pub price: MoneyFields,
        pub image: Option<ImageFields>,
        pub product: MerchandiseProductFields,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CartLineFields {
        pub id: String,
        pub quantity: i64,
        pub merchandise: MerchandiseFields,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartCostFields {
        pub subtotal_amount: MoneyFields,
        pub total_amount: MoneyFields,
        pub total_tax_amount: Option<MoneyFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DeliveryOptionFields {
        pub estimated_cost: MoneyFields,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DeliveryGroupFields {
        pub selected_delivery_option: Option<DeliveryOptionFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartFields {
        pub id: String,
        pub checkout_url: String,
        pub total_quantity: i64,
        pub lines: Nodes<CartLineFields>,
        pub cost: CartCostFields,
        #[serde(default)]
        pub delivery_groups: Nodes<DeliveryGroupFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct UserErrorFields {
        pub code: Option<String>,
        pub field: Option<Vec<String>>,
        pub message: String,
    }

    /// Payload of every cart mutation.
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartPayload {
        pub cart: Option<CartFields>,
        #[serde(default)]
        pub user_errors: Vec<UserErrorFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct OrderVariantFields {
        pub id: String,
        pub title: String,
        pub price: MoneyFields,
        pub image: Option<ImageFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct OrderLineItemFields {
        pub title: String,
        pub quantity: i64,
        pub variant: Option<OrderVariantFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OrderFields {
        pub id: String,
        pub name: String,
        pub processed_at: DateTime<Utc>,
        pub fulfillment_status: FulfillmentStatus,
        pub total_price: MoneyFields,
        pub subtotal_price: Option<MoneyFields>,
        pub total_tax: Option<MoneyFields>,
        pub total_shipping_price: Option<MoneyFields>,
        #[serde(default)]
        pub line_items: Nodes<OrderLineItemFields>,
    }
}

pub mod customer_create {
    use serde::{Deserialize, Serialize};

    use super::fragments::UserErrorFields;
    use crate::shopify::types::CustomerCreateInput;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CustomerCreateInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_create: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub customer: Option<CustomerFields>,
        #[serde(default)]
        pub customer_user_errors: Vec<UserErrorFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CustomerFields {
        pub id: String,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub email: Option<String>,
    }
}

pub mod customer_access_token_create {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    use super::fragments::UserErrorFields;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: Input,
    }

    /// Implements `Debug` manually to redact the password.
    #[derive(Clone, Serialize)]
    pub struct Input {
        pub email: String,
        pub password: String,
    }

    impl std::fmt::Debug for Input {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Input")
                .field("email", &self.email)
                .field("password", &"[REDACTED]")
                .finish()
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_access_token_create: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub customer_access_token: Option<TokenFields>,
        #[serde(default)]
        pub customer_user_errors: Vec<UserErrorFields>,
    }

    #[derive(Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TokenFields {
        pub access_token: String,
        pub expires_at: DateTime<Utc>,
    }

    impl std::fmt::Debug for TokenFields {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("TokenFields")
                .field("access_token", &"[REDACTED]")
                .field("expires_at", &self.expires_at)
                .finish()
        }
    }
}

pub mod customer_password_update {
    use serde::{Deserialize, Serialize};

    use super::customer_access_token_create::TokenFields;
    use super::fragments::UserErrorFields;

    /// Implements `Debug` manually to redact the access token.
    #[derive(Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub customer_access_token: String,
        pub customer: Input,
    }

    impl std::fmt::Debug for Variables {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Variables")
                .field("customer_access_token", &"[REDACTED]")
                .field("customer", &self.customer)
                .finish()
        }
    }

    /// Implements `Debug` manually to redact the password.
    #[derive(Clone, Serialize)]
    pub struct Input {
        pub password: String,
    }

    impl std::fmt::Debug for Input {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Input")
                .field("password", &"[REDACTED]")
                .finish()
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_update: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub customer_access_token: Option<TokenFields>,
        #[serde(default)]
        pub customer_user_errors: Vec<UserErrorFields>,
    }
}

pub mod customer_orders {
    use serde::{Deserialize, Serialize};

    use super::fragments::{Nodes, OrderFields};

    /// Implements `Debug` manually to redact the access token.
    #[derive(Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub customer_access_token: String,
        pub first: i64,
    }

    impl std::fmt::Debug for Variables {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Variables")
                .field("customer_access_token", &"[REDACTED]")
                .field("first", &self.first)
                .finish()
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub customer: Option<CustomerOrdersFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CustomerOrdersFields {
        pub orders: Nodes<OrderFields>,
    }
}

pub mod cart_create {
    use serde::{Deserialize, Serialize};

    use super::fragments::CartPayload;
    use crate::shopify::types::CartLineInput;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CartInput,
        pub country: Option<String>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartPayload>,
    }
}

pub mod cart_lines_add {
    use serde::{Deserialize, Serialize};
    use wrapsody_core::CartId;

    use super::fragments::CartPayload;
    use crate::shopify::types::CartLineInput;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: CartId,
        pub lines: Vec<CartLineInput>,
        pub country: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartPayload>,
    }
}

pub mod cart_lines_update {
    use serde::{Deserialize, Serialize};
    use wrapsody_core::CartId;

    use super::fragments::CartPayload;
    use crate::shopify::types::CartLineUpdateInput;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: CartId,
        pub lines: Vec<CartLineUpdateInput>,
        pub country: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartPayload>,
    }
}

pub mod cart_lines_remove {
    use serde::{Deserialize, Serialize};
    use wrapsody_core::{CartId, CartLineId};

    use super::fragments::CartPayload;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: CartId,
        pub line_ids: Vec<CartLineId>,
        pub country: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartPayload>,
    }
}

pub mod products {
    use serde::{Deserialize, Serialize};

    use super::fragments::{Nodes, ProductFields};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub country: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Nodes<ProductFields>,
    }
}

pub mod collections {
    use serde::{Deserialize, Serialize};

    use super::fragments::{CollectionFields, Nodes};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub first: i64,
        pub products_first: i64,
        pub country: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collections: Nodes<CollectionFields>,
    }
}

pub mod collection_products {
    use serde::{Deserialize, Serialize};
    use wrapsody_core::CollectionId;

    use super::fragments::{PageInfoFields, ProductFields};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: CollectionId,
        pub first: i64,
        pub after: Option<String>,
        pub country: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collection: Option<CollectionProductsFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CollectionProductsFields {
        pub products: ProductConnectionFields,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductConnectionFields {
        pub page_info: PageInfoFields,
        pub nodes: Vec<ProductFields>,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fragment_definitions(document: &str) -> Vec<&str> {
        document
            .lines()
            .filter_map(|line| line.strip_prefix("fragment "))
            .filter_map(|rest| rest.split_whitespace().next())
            .collect()
    }

    fn fragment_spreads(document: &str) -> Vec<&str> {
        let mut spreads: Vec<&str> = document
            .split("...")
            .skip(1)
            .filter_map(|rest| rest.split_whitespace().next())
            .filter(|name| *name != "on")
            .collect();
        spreads.sort_unstable();
        spreads.dedup();
        spreads
    }

    #[test]
    fn test_every_spread_fragment_is_defined_once() {
        for document in [
            CUSTOMER_CREATE,
            CUSTOMER_ACCESS_TOKEN_CREATE,
            CUSTOMER_PASSWORD_UPDATE,
            CUSTOMER_ORDERS,
            CART_CREATE,
            CART_LINES_ADD,
            CART_LINES_UPDATE,
            CART_LINES_REMOVE,
            PRODUCTS,
            COLLECTIONS,
            COLLECTION_PRODUCTS,
        ] {
            let mut defined = fragment_definitions(document);
            let total = defined.len();
            defined.sort_unstable();
            defined.dedup();
            assert_eq!(defined.len(), total, "duplicate fragment in:\n{document}");
            assert_eq!(
                defined,
                fragment_spreads(document),
                "fragment mismatch in:\n{document}"
            );
        }
    }

    #[test]
    fn test_catalog_and_cart_documents_carry_country_context() {
        for document in [
            CART_CREATE,
            CART_LINES_ADD,
            CART_LINES_UPDATE,
            CART_LINES_REMOVE,
            PRODUCTS,
            COLLECTIONS,
            COLLECTION_PRODUCTS,
        ] {
            assert!(document.contains("@inContext(country: $country)"));
        }
    }

    #[test]
    fn test_build_query_sets_operation_name() {
        let body = CartLinesRemove::build_query(cart_lines_remove::Variables {
            cart_id: "gid://shopify/Cart/abc".into(),
            line_ids: vec!["gid://shopify/CartLine/1".into()],
            country: Some("CA".to_string()),
        });

        assert_eq!(body.operation_name, "CartLinesRemove");
        assert!(body.query.starts_with("mutation CartLinesRemove("));

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["variables"]["cartId"], "gid://shopify/Cart/abc");
        assert_eq!(json["variables"]["lineIds"][0], "gid://shopify/CartLine/1");
        assert_eq!(json["variables"]["country"], "CA");
    }

    #[test]
    fn test_orders_are_requested_newest_first() {
        assert!(CUSTOMER_ORDERS.contains("sortKey: PROCESSED_AT, reverse: true"));
        assert!(CUSTOMER_ORDERS.contains("lineItems(first: 250)"));
    }
}
