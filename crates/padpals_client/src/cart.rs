use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Product, ProductCategory, ProductVariant};

/// Price multiplier applied to subscription lines.
pub const SUBSCRIPTION_PRICE_FACTOR: f64 = 0.85;

#[derive(Clone, Debug, Serialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub variant_id: String,
    pub name: String,
    pub selected_size: String,
    pub price: f64,
    pub image: String,
    pub category: ProductCategory,
    pub quantity: u32,
    pub is_subscription: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Add one unit. A line is identified by product, variant and subscription flag.
    pub fn add(&mut self, product: &Product, variant: &ProductVariant, is_subscription: bool) {
        if let Some(existing) = self.items.iter_mut().find(|i| {
            i.product_id == product.id
                && i.variant_id == variant.id
                && i.is_subscription == is_subscription
        }) {
            existing.quantity += 1;
            return;
        }
        let price = if is_subscription {
            variant.price * SUBSCRIPTION_PRICE_FACTOR
        } else {
            variant.price
        };
        self.items.push(CartItem {
            product_id: product.id.clone(),
            variant_id: variant.id.clone(),
            name: product.name.clone(),
            selected_size: variant.size.clone(),
            price,
            image: variant.image.clone(),
            category: product.category.clone(),
            quantity: 1,
            is_subscription,
        });
    }

    /// Shift the quantity of every line for `variant_id`; lines reaching zero are dropped.
    pub fn update_quantity(&mut self, variant_id: &str, delta: i64) {
        for item in self.items.iter_mut().filter(|i| i.variant_id == variant_id) {
            let next = (i64::from(item.quantity) + delta).max(0);
            item.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        }
        self.items.retain(|i| i.quantity > 0);
    }

    /// Take away the quantities of `lines` (a snapshot of this cart), leaving
    /// anything added since the snapshot.
    pub fn remove_lines(&mut self, lines: &[CartItem]) {
        for line in lines {
            if let Some(item) = self.items.iter_mut().find(|i| {
                i.product_id == line.product_id
                    && i.variant_id == line.variant_id
                    && i.is_subscription == line.is_subscription
            }) {
                item.quantity = item.quantity.saturating_sub(line.quantity);
            }
        }
        self.items.retain(|i| i.quantity > 0);
    }

    pub fn total(&self) -> f64 {
        self.items
            .iter()
            .map(|i| i.price * f64::from(i.quantity))
            .sum()
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn to_order(&self, user_id: &str) -> OrderRequest {
        OrderRequest {
            user_id: user_id.to_string(),
            total: self.total(),
            order_type: OrderType::DropOff,
            status: OrderStatus::Processing,
            items: self
                .items
                .iter()
                .map(|i| OrderItem {
                    id: i.variant_id.clone(),
                    name: format!("{} ({})", i.name, i.selected_size),
                    quantity: i.quantity,
                    price: i.price,
                    is_subscription: i.is_subscription,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub enum OrderType {
    #[serde(rename = "Drop-off")]
    DropOff,
    #[serde(rename = "Pick-up")]
    PickUp,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
}

/// Wire shape of `POST /orders`.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub user_id: String,
    pub total: f64,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Variant id; the order service keys line items by variant.
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
    pub is_subscription: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: "p1".into(),
            name: "Day Pads".into(),
            description: String::new(),
            category: ProductCategory::Regular,
            stock: 10,
            variants: vec![
                ProductVariant {
                    id: "v1".into(),
                    size: "Regular".into(),
                    price: 40.0,
                    image: String::new(),
                },
                ProductVariant {
                    id: "v2".into(),
                    size: "Super".into(),
                    price: 50.0,
                    image: String::new(),
                },
            ],
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn repeated_add_increments_quantity() {
        let p = product();
        let mut cart = Cart::new();
        cart.add(&p, &p.variants[0], false);
        cart.add(&p, &p.variants[0], false);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 2);
        assert!(close(cart.total(), 80.0));
    }

    #[test]
    fn subscription_line_is_discounted_and_separate() {
        let p = product();
        let mut cart = Cart::new();
        cart.add(&p, &p.variants[0], false);
        cart.add(&p, &p.variants[0], true);
        assert_eq!(cart.items().len(), 2);
        assert!(close(cart.items()[1].price, 34.0));
        assert!(close(cart.total(), 74.0));
    }

    #[test]
    fn quantity_update_clamps_and_drops_empty_lines() {
        let p = product();
        let mut cart = Cart::new();
        cart.add(&p, &p.variants[0], false);
        cart.add(&p, &p.variants[1], false);
        cart.update_quantity("v2", 3);
        assert_eq!(cart.item_count(), 5);
        cart.update_quantity("v1", -5);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].variant_id, "v2");
    }

    #[test]
    fn removing_snapshot_keeps_later_additions() {
        let p = product();
        let mut cart = Cart::new();
        cart.add(&p, &p.variants[0], false);
        let snapshot = cart.items().to_vec();
        cart.add(&p, &p.variants[0], false);
        cart.add(&p, &p.variants[1], true);
        cart.remove_lines(&snapshot);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.items()[0].quantity, 1);
        assert_eq!(cart.items()[1].variant_id, "v2");
    }

    #[test]
    fn order_payload_uses_wire_names() {
        let p = product();
        let mut cart = Cart::new();
        cart.add(&p, &p.variants[1], true);
        let order = cart.to_order("u1");
        let v = serde_json::to_value(&order).unwrap();
        assert_eq!(v["userId"], "u1");
        assert_eq!(v["type"], "Drop-off");
        assert_eq!(v["status"], "Processing");
        assert_eq!(v["items"][0]["id"], "v2");
        assert_eq!(v["items"][0]["name"], "Day Pads (Super)");
        assert_eq!(v["items"][0]["isSubscription"], true);
    }
}
