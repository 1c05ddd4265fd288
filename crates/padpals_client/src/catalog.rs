//! Product catalogue. The API returns one flat row per variant; rows sharing a
//! `group_id` are folded into a single [`Product`].

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Regular,
    Super,
    Overnight,
    Liner,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, JsonSchema)]
pub struct ProductVariant {
    pub id: String,
    pub size: String,
    #[serde(deserialize_with = "deserialize_price")]
    #[schemars(with = "f64")]
    pub price: f64,
    #[serde(default)]
    pub image: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, JsonSchema)]
pub struct Product {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ProductCategory,
    pub stock: i64,
    pub variants: Vec<ProductVariant>,
}

impl Product {
    pub fn variant(&self, variant_id: &str) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }
}

/// Wire shape of `GET /products`.
#[derive(Clone, Debug, Deserialize)]
pub struct VariantRow {
    pub id: String,
    pub group_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ProductCategory,
    #[serde(default)]
    pub stock: i64,
    pub size: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: f64,
    #[serde(default)]
    pub image: String,
}

/// Fold variant rows into products, keeping first-seen group order.
pub fn group_variant_rows(rows: Vec<VariantRow>) -> Vec<Product> {
    let mut products: Vec<Product> = Vec::new();
    for row in rows {
        let variant = ProductVariant {
            id: row.id,
            size: row.size,
            price: row.price,
            image: row.image,
        };
        match products.iter_mut().find(|p| p.id == row.group_id) {
            Some(existing) => existing.variants.push(variant),
            None => products.push(Product {
                id: row.group_id,
                name: row.name,
                description: row.description,
                category: row.category,
                stock: row.stock,
                variants: vec![variant],
            }),
        }
    }
    products
}

pub(crate) fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("price out of range: {n}"))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
            .ok_or_else(|| D::Error::custom(format!("price is not numeric: {s}"))),
        other => Err(D::Error::custom(format!(
            "expected number or numeric string, got {other}"
        ))),
    }
}
