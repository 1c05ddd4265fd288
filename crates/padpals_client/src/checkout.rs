use serde::Serialize;

use crate::cart::{Cart, CartItem, OrderRequest};
use crate::navigation::{Navigator, Transition, View};
use crate::session::SessionContext;
use crate::{PadPalsError, StorefrontClient};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    /// Order accepted; the ordered lines left the cart.
    Placed {
        total: f64,
        items: u32,
        transition: Transition,
    },
    /// Guest checkout is not possible; the visitor was sent to sign in.
    LoginRequired { transition: Transition },
}

/// An order built from a cart snapshot, ready to send.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingOrder {
    pub order: OrderRequest,
    lines: Vec<CartItem>,
}

/// Build the order for the signed-in user, or `None` for a guest. No I/O.
pub fn prepare(session: &SessionContext, cart: &Cart) -> Result<Option<PendingOrder>, PadPalsError> {
    let Some(user_id) = session.user_id() else {
        return Ok(None);
    };
    if cart.is_empty() {
        return Err(PadPalsError::InvalidInput("cart is empty".into()));
    }
    Ok(Some(PendingOrder {
        order: cart.to_order(user_id),
        lines: cart.items().to_vec(),
    }))
}

/// Apply an accepted order: drop the ordered lines and go Home.
pub fn settle(
    pending: PendingOrder,
    session: &SessionContext,
    cart: &mut Cart,
    navigator: &mut Navigator,
) -> Result<CheckoutOutcome, PadPalsError> {
    cart.remove_lines(&pending.lines);
    let transition = navigator.navigate(View::Home, session)?;
    Ok(CheckoutOutcome::Placed {
        total: pending.order.total,
        items: pending.lines.iter().map(|l| l.quantity).sum(),
        transition,
    })
}

/// Submit the cart as an order for the signed-in user.
pub async fn checkout(
    client: &dyn StorefrontClient,
    session: &SessionContext,
    cart: &mut Cart,
    navigator: &mut Navigator,
) -> Result<CheckoutOutcome, PadPalsError> {
    let Some(pending) = prepare(session, cart)? else {
        return Ok(CheckoutOutcome::LoginRequired {
            transition: navigator.redirect_to_login(),
        });
    };
    submit(client, &pending).await?;
    settle(pending, session, cart, navigator)
}

pub async fn submit(client: &dyn StorefrontClient, pending: &PendingOrder) -> Result<(), PadPalsError> {
    let order = &pending.order;
    client.create_order(order).await?;
    tracing::info!(user_id = %order.user_id, total = order.total, lines = order.items.len(), "order placed");
    Ok(())
}
