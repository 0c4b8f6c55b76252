//! Plain-text rendering of storefront values.

#![allow(clippy::print_stdout)]

use wrapsody_storefront::shopify::{Cart, Collection, Order, Product, ProductPage};

pub fn cart(cart: Option<&Cart>) {
    let Some(cart) = cart else {
        println!("Cart is empty.");
        return;
    };

    println!("Cart ({} items)", cart.total_quantity);
    for (index, line) in cart.lines.iter().enumerate() {
        println!(
            "  {:>2}. {} - {} x{} @ {}",
            index + 1,
            line.merchandise.product.title,
            line.merchandise.title,
            line.quantity,
            line.merchandise.price
        );
    }
    println!("  Subtotal: {}", cart.cost.subtotal);
    if let Some(shipping) = &cart.cost.total_shipping {
        println!("  Shipping: {shipping}");
    }
    if let Some(tax) = &cart.cost.total_tax {
        println!("  Tax:      {tax}");
    }
    println!("  Total:    {}", cart.cost.total);
}

pub fn product(product: &Product) {
    println!("{} ({})", product.title, product.id);
    if !product.vendor.is_empty() {
        println!("  by {}", product.vendor);
    }
    for variant in &product.variants {
        let availability = if variant.available_for_sale {
            ""
        } else {
            " (sold out)"
        };
        println!(
            "  - {} {} [{}]{availability}",
            variant.title, variant.price, variant.id
        );
    }
}

pub fn product_page(page: &ProductPage) {
    for item in &page.products {
        product(item);
    }
    match page.next_cursor() {
        Some(cursor) => println!("Next page: --after {cursor}"),
        None => println!("No more products."),
    }
}

pub fn collection(collection: &Collection) {
    println!(
        "{} ({}) - {} products shown",
        collection.title,
        collection.id,
        collection.products.len()
    );
    for item in &collection.products {
        let price = item
            .first_variant()
            .map(|variant| variant.price.to_string())
            .unwrap_or_default();
        println!("  - {} {price}", item.title);
    }
}

pub fn order(order: &Order) {
    println!(
        "{} placed {} - {} ({})",
        order.name,
        order.processed_at.format("%Y-%m-%d"),
        order.total_price,
        order.fulfillment_status
    );
    for item in &order.line_items {
        println!("  {} x{}", item.title, item.quantity);
    }
}

pub fn message(text: &str) {
    println!("{text}");
}
