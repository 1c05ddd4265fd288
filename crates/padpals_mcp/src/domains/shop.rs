use padpals_client::cart::{Cart, CartItem};
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
pub struct CartResult {
    pub items: Vec<CartItem>,
    pub item_count: u32,
    /// Rounded to cents.
    pub total: f64,
}

pub fn cart_result(cart: &Cart) -> CartResult {
    CartResult {
        items: cart.items().to_vec(),
        item_count: cart.item_count(),
        total: round_cents(cart.total()),
    }
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_round_to_cents() {
        assert_eq!(round_cents(42.499999), 42.5);
        assert_eq!(round_cents(34.0000001), 34.0);
    }

    #[test]
    fn empty_cart_summary() {
        let r = cart_result(&Cart::new());
        assert!(r.items.is_empty());
        assert_eq!(r.item_count, 0);
        assert_eq!(r.total, 0.0);
    }
}
