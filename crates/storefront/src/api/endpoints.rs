//! Remote endpoint catalog.
//!
//! Maps each backend operation to its URL under the configured base. Pure
//! data: nothing here performs I/O. Path segments are percent-encoded, so
//! emails and product ids can be passed through verbatim.

use just_mart_core::{Email, ProductId};
use url::Url;

use super::ApiError;

/// URL builder for every backend resource.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Create the catalog for a base URL such as `http://localhost:5000`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if the base cannot carry path segments.
    pub fn new(base: Url) -> Result<Self, ApiError> {
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base.to_string()));
        }
        Ok(Self { base })
    }

    /// The configured base URL.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// `/api/products`
    #[must_use]
    pub fn products(&self) -> Url {
        self.build(&["products"])
    }

    /// `/api/products/{id}`
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Url {
        self.build(&["products", id.as_str()])
    }

    /// `/api/categories`
    #[must_use]
    pub fn categories(&self) -> Url {
        self.build(&["categories"])
    }

    /// `/api/users/{email}`
    #[must_use]
    pub fn user(&self, email: &Email) -> Url {
        self.build(&["users", email.as_str()])
    }

    /// `/api/cart/{email}`
    #[must_use]
    pub fn cart(&self, email: &Email) -> Url {
        self.build(&["cart", email.as_str()])
    }

    /// `/api/cart/{email}/{productId}`
    #[must_use]
    pub fn cart_item(&self, email: &Email, id: &ProductId) -> Url {
        self.build(&["cart", email.as_str(), id.as_str()])
    }

    /// `/api/wishlist/{email}`
    #[must_use]
    pub fn wishlist(&self, email: &Email) -> Url {
        self.build(&["wishlist", email.as_str()])
    }

    /// `/api/wishlist/{email}/{productId}`
    #[must_use]
    pub fn wishlist_item(&self, email: &Email, id: &ProductId) -> Url {
        self.build(&["wishlist", email.as_str(), id.as_str()])
    }

    /// `/api/orders/{email}`
    #[must_use]
    pub fn orders(&self, email: &Email) -> Url {
        self.build(&["orders", email.as_str()])
    }

    /// `/api/orders`
    #[must_use]
    pub fn create_order(&self) -> Url {
        self.build(&["orders"])
    }

    fn build(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        // Checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }
}
