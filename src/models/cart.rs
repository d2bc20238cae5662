use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Product details captured when an item is put into the cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<u64>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

fn default_in_stock() -> bool {
    true
}

/// One product-keyed entry of the cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<u64>,
    pub quantity: u32,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

impl CartLine {
    /// Creates a line from a product with a concrete, positive quantity
    pub fn new(product: CartProduct, quantity: NonZeroU32) -> Self {
        Self {
            product_id: product.product_id,
            name: product.name,
            image: product.image,
            price: product.price,
            discount_price: product.discount_price,
            quantity: quantity.get(),
            in_stock: product.in_stock,
        }
    }

    /// Discount price if present, otherwise the base price
    pub fn effective_price(&self) -> u64 {
        self.discount_price.unwrap_or(self.price)
    }

    pub fn line_total(&self) -> u64 {
        self.effective_price().saturating_mul(u64::from(self.quantity))
    }
}

/// Cart totals reported alongside the lines
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub total_items: u64,
    pub total_price: u64,
}

impl CartTotals {
    pub fn from_lines(lines: &[CartLine]) -> Self {
        Self {
            total_items: lines.iter().map(|line| u64::from(line.quantity)).sum(),
            total_price: lines
                .iter()
                .fold(0u64, |acc, line| acc.saturating_add(line.line_total())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: u64, discount_price: Option<u64>) -> CartProduct {
        CartProduct {
            product_id: id.to_string(),
            name: format!("Product {}", id),
            image: String::new(),
            price,
            discount_price,
            in_stock: true,
        }
    }

    #[test]
    fn test_effective_price_prefers_discount() {
        let line = CartLine::new(product("A", 500, Some(300)), NonZeroU32::MIN);
        assert_eq!(line.effective_price(), 300);

        let line = CartLine::new(product("B", 500, None), NonZeroU32::MIN);
        assert_eq!(line.effective_price(), 500);
    }

    #[test]
    fn test_totals() {
        let lines = vec![
            CartLine::new(product("A", 1000, None), NonZeroU32::new(2).unwrap()),
            CartLine::new(product("B", 500, Some(300)), NonZeroU32::MIN),
        ];

        let totals = CartTotals::from_lines(&lines);
        assert_eq!(totals.total_items, 3);
        assert_eq!(totals.total_price, 2300);
    }

    #[test]
    fn test_serialized_field_names() {
        let line = CartLine::new(product("A", 100, Some(80)), NonZeroU32::MIN);
        let json = serde_json::to_value(&line).unwrap();

        assert_eq!(json["productId"], "A");
        assert_eq!(json["discountPrice"], 80);
        assert_eq!(json["inStock"], true);
        assert_eq!(json["quantity"], 1);
    }

    #[test]
    fn test_missing_discount_is_omitted() {
        let line = CartLine::new(product("A", 100, None), NonZeroU32::MIN);
        let json = serde_json::to_value(&line).unwrap();

        assert!(json.get("discountPrice").is_none());
    }
}
