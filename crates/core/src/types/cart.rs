//! Cart line types.

use serde::{Deserialize, Serialize};

use super::{Price, Product, ProductId};

/// A line in the signed-in user's cart.
///
/// Holds a snapshot of the listing plus the quantity. `quantity` is always at
/// least 1; a line whose quantity would drop to zero is removed instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// A fresh line with quantity 1.
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self {
            product,
            quantity: 1,
        }
    }

    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product.product_id
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// A cart line as the backend stores it: a product reference and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineRef {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let product = Product::new(ProductId::parse("p1").unwrap(), "Desk", Price::from_taka(50));
        let line = CartLine {
            product,
            quantity: 3,
        };
        assert_eq!(line.line_total(), Price::from_taka(150));
    }

    #[test]
    fn test_serialize_flattens_product() {
        let product = Product::new(ProductId::parse("p1").unwrap(), "Desk", Price::from_taka(50));
        let value = serde_json::to_value(CartLine::new(product)).unwrap();
        assert_eq!(value["productId"], "p1");
        assert_eq!(value["title"], "Desk");
        assert_eq!(value["quantity"], 1);
    }

    #[test]
    fn test_line_ref_wire_format() {
        let line: CartLineRef =
            serde_json::from_str(r#"{"productId":"p9","quantity":4}"#).unwrap();
        assert_eq!(line.product_id.as_str(), "p9");
        assert_eq!(line.quantity, 4);
    }
}
