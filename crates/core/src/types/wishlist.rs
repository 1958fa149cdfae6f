//! Wishlist entry types.

use serde::{Deserialize, Serialize};

use super::{Product, ProductId};

/// A saved listing. Membership only, no quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WishlistEntry {
    pub product: Product,
}

impl WishlistEntry {
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self { product }
    }

    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product.product_id
    }
}

/// A wishlist entry as the backend stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntryRef {
    pub product_id: ProductId,
}
