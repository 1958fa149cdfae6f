//! Order types.
//!
//! Orders are created from the cart at checkout. Fulfillment is entirely the
//! backend's business; the client only places orders and lists them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CartLine, Email, OrderId, OrderStatus, Price, ProductId};

/// One purchased listing within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub title: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default, alias = "image", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product.product_id.clone(),
            title: line.product.title.clone(),
            price: line.product.price,
            quantity: line.quantity,
            image_url: line.product.image_url.clone(),
        }
    }
}

/// An order as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id", alias = "id")]
    pub order_id: OrderId,
    pub email: Email,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Request body for placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub email: Email,
    pub items: Vec<OrderItem>,
    pub total: Price,
    pub delivery_address: String,
    pub created_at: DateTime<Utc>,
}

impl OrderDraft {
    /// Build a draft from cart lines. The total is recomputed from the lines.
    #[must_use]
    pub fn from_lines(
        email: Email,
        lines: &[CartLine],
        delivery_address: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            email,
            items: lines.iter().map(OrderItem::from).collect(),
            total: lines.iter().map(CartLine::line_total).sum(),
            delivery_address: delivery_address.into(),
            created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Product;

    fn line(id: &str, price: u64, quantity: u32) -> CartLine {
        CartLine {
            product: Product::new(ProductId::parse(id).unwrap(), id, Price::from_taka(price)),
            quantity,
        }
    }

    #[test]
    fn test_draft_from_lines() {
        let email = Email::parse("a@x.com").unwrap();
        let lines = [line("p1", 100, 2), line("p2", 25, 1)];
        let draft = OrderDraft::from_lines(email, &lines, "Room 302, M M Hall", Utc::now());

        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.total, Price::from_taka(225));
        assert_eq!(draft.items[0].quantity, 2);

        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["deliveryAddress"], "Room 302, M M Hall");
        assert_eq!(value["total"], 225);
    }

    #[test]
    fn test_deserialize_order() {
        let json = r#"{
            "_id": "ORD-2025-001",
            "email": "a@x.com",
            "items": [{"productId": "p1", "title": "Desk", "price": 100, "quantity": 1}],
            "total": 100,
            "status": "Delivered",
            "createdAt": "2025-11-15T10:30:00Z"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.order_id.as_str(), "ORD-2025-001");
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.created_at.is_some());
        assert!(order.delivery_address.is_none());
    }
}
