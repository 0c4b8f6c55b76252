//! Hosted checkout hand-off.
//!
//! The storefront's checkout is a hosted page. A [`CheckoutSurface`] renders
//! it (a webview, a browser tab, a terminal prompt) and reports what the
//! buyer did as a stream of [`CheckoutEvent`]s. The session reacts to those
//! events; see [`CartSession::checkout`](crate::session::CartSession::checkout).

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;
use wrapsody_core::OrderId;

/// Something that happened on the hosted checkout.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutEvent {
    /// The order was placed.
    Completed {
        /// The placed order, when the surface reports it.
        order_id: Option<OrderId>,
    },
    /// The buyer closed checkout without ordering.
    Canceled,
    /// Checkout could not continue.
    Failed {
        message: String,
        recoverable: bool,
    },
    /// An analytics pixel fired.
    Pixel {
        name: String,
        data: serde_json::Value,
    },
    /// The buyer followed a link out of checkout.
    LinkClicked { url: Url },
}

/// Errors raised while handing off to checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// There is no cart to check out.
    #[error("No cart to check out")]
    NoCart,

    /// No surface was configured for this session.
    #[error("Checkout is not available")]
    Unavailable,

    /// The cart's checkout URL is malformed.
    #[error("Invalid checkout URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The surface failed to present checkout.
    #[error("Checkout surface error: {0}")]
    Surface(String),
}

/// Renders hosted checkout pages.
#[async_trait]
pub trait CheckoutSurface: Send + Sync {
    /// Warm up a checkout page so presenting it is fast. Best effort.
    async fn preload(&self, checkout_url: &Url);

    /// Present checkout and report events until the buyer leaves it.
    ///
    /// The surface drops `events` when it is done.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Surface` if checkout could not be shown.
    async fn present(
        &self,
        checkout_url: &Url,
        events: mpsc::UnboundedSender<CheckoutEvent>,
    ) -> Result<(), CheckoutError>;

    /// Discard any preloaded page.
    async fn invalidate(&self);
}
