//! Product listing snapshot.
//!
//! The backend owns product master data. Cart lines and wishlist entries hold
//! a copy of the listing as it looked when it was fetched.

use serde::{Deserialize, Serialize};

use super::{Email, Price, ProductId};

/// A marketplace listing.
///
/// The backend has used `productId`, `_id` and `id` for the identifier over
/// time; all three are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id", alias = "id")]
    pub product_id: ProductId,
    #[serde(default)]
    pub title: String,
    pub price: Price,
    #[serde(default, alias = "image", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Item condition, e.g. "Like New" or "Used".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Pickup location on campus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Product {
    /// Create a listing snapshot with only the fields the cart needs.
    #[must_use]
    pub fn new(product_id: ProductId, title: impl Into<String>, price: Price) -> Self {
        Self {
            product_id,
            title: title.into(),
            price,
            image_url: None,
            category: None,
            condition: None,
            seller_email: None,
            seller_name: None,
            stock: None,
            description: None,
            location: None,
        }
    }
}
