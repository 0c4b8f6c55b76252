//! Catalog, order history and favorites commands.

use wrapsody_core::{CollectionId, ProductId};
use wrapsody_storefront::AppError;

use super::{Context, render};

/// Accept either a full global ID or the numeric resource ID.
fn collection_id(raw: &str) -> CollectionId {
    if raw.starts_with("gid://") {
        CollectionId::new(raw)
    } else {
        CollectionId::from_resource_id(raw)
    }
}

fn product_id(raw: &str) -> ProductId {
    if raw.starts_with("gid://") {
        ProductId::new(raw)
    } else {
        ProductId::from_resource_id(raw)
    }
}

/// List collections.
///
/// # Errors
///
/// Returns an error if the storefront request fails.
pub async fn collections(ctx: &Context) -> Result<(), AppError> {
    let collections = ctx.session.fetch_collections().await?;
    if collections.is_empty() {
        render::message("No collections.");
    }
    for collection in &collections {
        render::collection(collection);
    }
    Ok(())
}

/// List one page of a collection's products.
///
/// # Errors
///
/// Returns an error if the collection does not exist or the request fails.
pub async fn products(
    ctx: &Context,
    collection: &str,
    after: Option<&str>,
    page_size: i64,
) -> Result<(), AppError> {
    if !(1..=250).contains(&page_size) {
        return Err(AppError::BadRequest(
            "Page size must be between 1 and 250.".to_string(),
        ));
    }
    let page = ctx
        .session
        .fetch_products(&collection_id(collection), after, page_size)
        .await?;
    render::product_page(&page);
    Ok(())
}

/// Show a random product.
///
/// # Errors
///
/// Returns an error if the storefront request fails.
pub async fn random_product(ctx: &Context) -> Result<(), AppError> {
    match ctx.session.random_product().await? {
        Some(product) => render::product(&product),
        None => render::message("The catalog is empty."),
    }
    Ok(())
}

/// List the logged-in customer's orders.
///
/// # Errors
///
/// Returns an error if nobody is logged in or the request fails.
pub async fn orders(ctx: &Context) -> Result<(), AppError> {
    let orders = ctx.session.fetch_stored_past_orders().await?;
    if orders.is_empty() {
        render::message("No orders yet.");
    }
    for order in &orders {
        render::order(order);
    }
    Ok(())
}

/// List favorite product IDs.
pub async fn list_favorites(ctx: &Context) {
    let favorites = ctx.session.store().favorites().await;
    if favorites.is_empty() {
        render::message("No favorites.");
    }
    for id in favorites {
        render::message(id.as_str());
    }
}

/// Add or remove a favorite.
///
/// # Errors
///
/// Returns an error if local state cannot be written.
pub async fn toggle_favorite(ctx: &Context, product: &str) -> Result<(), AppError> {
    let id = product_id(product);
    let added = ctx.session.store().toggle_favorite(id.clone()).await?;
    render::message(&if added {
        format!("Added {id} to favorites.")
    } else {
        format!("Removed {id} from favorites.")
    });
    Ok(())
}
