//! Conversions from wire types to domain types.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::warn;
use wrapsody_core::{CurrencyCode, Money};

use crate::shopify::types::{
    Cart, CartCost, CartLine, CartMerchandise, CartMerchandiseProduct, Collection, CollectionRef,
    Customer, CustomerAccessToken, Image, Order, OrderLineItem, OrderVariant, PageInfo, Product,
    ProductPage, ProductVariant, UserError,
};

use super::queries::collection_products::ProductConnectionFields;
use super::queries::customer_access_token_create::TokenFields;
use super::queries::customer_create::CustomerFields;
use super::queries::fragments::{
    CartFields, CollectionFields, DeliveryGroupFields, ImageFields, MoneyFields, OrderFields, ProductFields,
    UserErrorFields,
};

/// Convert a wire amount, falling back to zero when the API sends garbage.
pub fn convert_money(money: MoneyFields) -> Money {
    let currency_code = CurrencyCode::parse(&money.currency_code).unwrap_or_else(|e| {
        warn!(currency_code = %money.currency_code, error = %e, "Unrecognized currency code");
        CurrencyCode::default()
    });
    let amount = Decimal::from_str(&money.amount).unwrap_or_else(|e| {
        warn!(amount = %money.amount, error = %e, "Unparseable money amount");
        Decimal::ZERO
    });
    Money::new(amount, currency_code)
}

pub fn convert_image(image: ImageFields) -> Image {
    Image {
        id: image.id.map(Into::into),
        url: image.url,
        alt_text: image.alt_text,
        width: image.width,
        height: image.height,
    }
}

pub fn convert_product(product: ProductFields) -> Product {
    Product {
        id: product.id.into(),
        handle: product.handle,
        title: product.title,
        description: product.description,
        vendor: product.vendor,
        tags: product.tags,
        product_type: product.product_type,
        featured_image: product.featured_image.map(convert_image),
        images: product.images.nodes.into_iter().map(convert_image).collect(),
        variants: product
            .variants
            .nodes
            .into_iter()
            .map(|v| ProductVariant {
                id: v.id.into(),
                title: v.title,
                price: convert_money(v.price),
                available_for_sale: v.available_for_sale,
                image: v.image.map(convert_image),
            })
            .collect(),
        collections: product
            .collections
            .nodes
            .into_iter()
            .map(|c| CollectionRef {
                id: c.id.into(),
                title: c.title,
            })
            .collect(),
    }
}

pub fn convert_collection(collection: CollectionFields) -> Collection {
    Collection {
        id: collection.id.into(),
        handle: collection.handle,
        title: collection.title,
        description: collection.description,
        image: collection.image.map(convert_image),
        products: collection
            .products
            .nodes
            .into_iter()
            .map(convert_product)
            .collect(),
    }
}

pub fn convert_product_page(connection: ProductConnectionFields) -> ProductPage {
    ProductPage {
        products: connection.nodes.into_iter().map(convert_product).collect(),
        page_info: PageInfo {
            has_next_page: connection.page_info.has_next_page,
            end_cursor: connection.page_info.end_cursor,
        },
    }
}

pub fn convert_cart(cart: CartFields) -> Cart {
    Cart {
        id: cart.id.into(),
        checkout_url: cart.checkout_url,
        total_quantity: cart.total_quantity,
        lines: cart
            .lines
            .nodes
            .into_iter()
            .map(|line| CartLine {
                id: line.id.into(),
                quantity: line.quantity,
                merchandise: CartMerchandise {
                    id: line.merchandise.id.into(),
                    title: line.merchandise.title,
                    price: convert_money(line.merchandise.price),
                    image: line.merchandise.image.map(convert_image),
                    product: CartMerchandiseProduct {
                        id: line.merchandise.product.id.into(),
                        handle: line.merchandise.product.handle,
                        title: line.merchandise.product.title,
                    },
                },
            })
            .collect(),
        cost: CartCost {
            subtotal: convert_money(cart.cost.subtotal_amount),
            total: convert_money(cart.cost.total_amount),
            total_tax: cart.cost.total_tax_amount.map(convert_money),
            total_shipping: convert_shipping(cart.delivery_groups.nodes),
        },
    }
}

/// Sum the selected delivery options. `None` until at least one is selected.
fn convert_shipping(groups: Vec<DeliveryGroupFields>) -> Option<Money> {
    let mut costs = groups
        .into_iter()
        .filter_map(|group| group.selected_delivery_option)
        .map(|option| convert_money(option.estimated_cost));
    let first = costs.next()?;
    costs.try_fold(first, |total, cost| total.checked_add(&cost).ok())
}

pub fn convert_order(order: OrderFields) -> Order {
    Order {
        id: order.id.into(),
        name: order.name,
        processed_at: order.processed_at,
        fulfillment_status: order.fulfillment_status,
        total_price: convert_money(order.total_price),
        subtotal: order.subtotal_price.map(convert_money),
        total_tax: order.total_tax.map(convert_money),
        total_shipping: order.total_shipping_price.map(convert_money),
        line_items: order
            .line_items
            .nodes
            .into_iter()
            .map(|item| OrderLineItem {
                title: item.title,
                quantity: item.quantity,
                variant: item.variant.map(|v| OrderVariant {
                    id: v.id.into(),
                    title: v.title,
                    price: convert_money(v.price),
                    image: v.image.map(convert_image),
                }),
            })
            .collect(),
    }
}

pub fn convert_customer(customer: CustomerFields) -> Customer {
    Customer {
        id: customer.id.into(),
        first_name: customer.first_name,
        last_name: customer.last_name,
        email: customer.email,
    }
}

pub fn convert_access_token(token: TokenFields) -> CustomerAccessToken {
    CustomerAccessToken {
        access_token: token.access_token,
        expires_at: token.expires_at,
    }
}

pub fn convert_user_errors(errors: Vec<UserErrorFields>) -> Vec<UserError> {
    errors
        .into_iter()
        .map(|e| UserError {
            code: e.code,
            field: e.field.unwrap_or_default(),
            message: e.message,
        })
        .collect()
}
