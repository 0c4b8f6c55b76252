//! Cart action planning.
//!
//! Every cart intent is resolved against the current cart slot through one
//! table:
//!
//! | cart      | Add(v)            | Update(l, q)              | Remove(l)       |
//! |-----------|-------------------|---------------------------|-----------------|
//! | none      | Create([v x 1])   | Reject                    | Reject          |
//! | exists    | LinesAdd(v x 1)   | LinesUpdate(l, max(q, 1)) | LinesRemove(l)  |
//!
//! `Adjust(l, d)` resolves to `Update(l, current + d)` using the line's
//! quantity in the existing cart.

use wrapsody_core::{CartId, CartLineId, VariantId};

use crate::shopify::{Cart, CartLineInput, CartLineUpdateInput};

/// Smallest quantity a line may be updated to. Removal is explicit.
pub const MIN_LINE_QUANTITY: i64 = 1;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartIntent {
    /// Add one unit of a variant.
    Add(VariantId),
    /// Set a line's quantity.
    Update { line_id: CartLineId, quantity: i64 },
    /// Change a line's quantity by a signed step.
    Adjust { line_id: CartLineId, delta: i64 },
    /// Remove a line.
    Remove(CartLineId),
}

/// The storefront call that realizes an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    Create {
        lines: Vec<CartLineInput>,
    },
    LinesAdd {
        cart_id: CartId,
        lines: Vec<CartLineInput>,
    },
    LinesUpdate {
        cart_id: CartId,
        lines: Vec<CartLineUpdateInput>,
    },
    LinesRemove {
        cart_id: CartId,
        line_ids: Vec<CartLineId>,
    },
    /// Nothing can be sent; the reason becomes a `NotFound` error.
    Reject {
        reason: String,
    },
}

/// Resolve an intent against the current cart.
#[must_use]
pub fn plan(cart: Option<&Cart>, intent: CartIntent) -> CartAction {
    match (cart, intent) {
        (None, CartIntent::Add(variant_id)) => CartAction::Create {
            lines: vec![single(variant_id)],
        },
        (None, CartIntent::Update { line_id, .. } | CartIntent::Adjust { line_id, .. })
        | (None, CartIntent::Remove(line_id)) => CartAction::Reject {
            reason: format!("No cart holds line {line_id}"),
        },
        (Some(cart), CartIntent::Add(variant_id)) => CartAction::LinesAdd {
            cart_id: cart.id.clone(),
            lines: vec![single(variant_id)],
        },
        (Some(cart), CartIntent::Update { line_id, quantity }) => update(cart, line_id, quantity),
        (Some(cart), CartIntent::Adjust { line_id, delta }) => match cart.line(&line_id) {
            Some(line) => {
                let quantity = line.quantity.saturating_add(delta);
                update(cart, line_id, quantity)
            }
            None => CartAction::Reject {
                reason: format!("Cart line not found: {line_id}"),
            },
        },
        (Some(cart), CartIntent::Remove(line_id)) => CartAction::LinesRemove {
            cart_id: cart.id.clone(),
            line_ids: vec![line_id],
        },
    }
}

const fn clamp_quantity(quantity: i64) -> i64 {
    if quantity < MIN_LINE_QUANTITY {
        MIN_LINE_QUANTITY
    } else {
        quantity
    }
}

fn single(variant_id: VariantId) -> CartLineInput {
    CartLineInput {
        merchandise_id: variant_id,
        quantity: 1,
    }
}

fn update(cart: &Cart, line_id: CartLineId, quantity: i64) -> CartAction {
    CartAction::LinesUpdate {
        cart_id: cart.id.clone(),
        lines: vec![CartLineUpdateInput {
            id: line_id,
            quantity: clamp_quantity(quantity),
        }],
    }
}
