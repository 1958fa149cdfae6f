//! Seller listing drafts.
//!
//! A listing is created by posting a [`ListingDraft`] to the products
//! collection. The seller fills in a [`NewListing`]; seller identity and
//! bookkeeping fields are added when the draft is built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Email, Identity, Price};

/// Condition assumed when the seller does not pick one.
pub const DEFAULT_CONDITION: &str = "New";

/// Errors that can occur when validating a [`NewListing`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    /// A required text field is blank.
    #[error("{0} is required")]
    Missing(&'static str),
    /// The price is zero or negative.
    #[error("price must be greater than zero")]
    NonPositivePrice,
    /// No image URL was given.
    #[error("at least one image is required")]
    NoImages,
}

/// What a seller enters to put an item up for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub condition: String,
    /// Pickup location on campus.
    pub location: String,
    pub stock: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl NewListing {
    /// A listing with one unit in stock and the default condition.
    #[must_use]
    pub fn new(title: impl Into<String>, price: Price) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            price,
            category: String::new(),
            condition: DEFAULT_CONDITION.to_string(),
            location: String::new(),
            stock: 1,
            tags: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Trim text fields and drop blank tags and images.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.title,
            &mut self.description,
            &mut self.category,
            &mut self.condition,
            &mut self.location,
        ] {
            *field = field.trim().to_string();
        }
        if self.condition.is_empty() {
            DEFAULT_CONDITION.clone_into(&mut self.condition);
        }
        self.tags = normalize_all(self.tags);
        self.tags.dedup();
        self.images = normalize_all(self.images);
        self
    }

    /// Check the fields the marketplace requires.
    ///
    /// # Errors
    ///
    /// Returns the first [`ListingError`] found.
    pub fn validate(&self) -> Result<(), ListingError> {
        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("category", &self.category),
            ("location", &self.location),
        ];
        if let Some((name, _)) = required
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
        {
            return Err(ListingError::Missing(name));
        }
        if self.price <= Price::ZERO {
            return Err(ListingError::NonPositivePrice);
        }
        if self.images.iter().all(|image| image.trim().is_empty()) {
            return Err(ListingError::NoImages);
        }
        Ok(())
    }
}

fn normalize_all(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Request body for creating a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    #[serde(flatten)]
    pub listing: NewListing,
    pub seller_email: Email,
    pub seller_name: String,
    pub date_posted: DateTime<Utc>,
    pub views: u32,
    pub rating: u32,
}

impl ListingDraft {
    /// Normalize and validate `listing`, then attribute it to `seller`.
    ///
    /// # Errors
    ///
    /// Returns a [`ListingError`] if the normalized listing is incomplete.
    pub fn new(
        listing: NewListing,
        seller: &Identity,
        date_posted: DateTime<Utc>,
    ) -> Result<Self, ListingError> {
        let listing = listing.normalized();
        listing.validate()?;
        Ok(Self {
            listing,
            seller_email: seller.email.clone(),
            seller_name: seller.display_name().to_string(),
            date_posted,
            views: 0,
            rating: 0,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn complete() -> NewListing {
        NewListing {
            description: "Barely used".to_string(),
            category: "Books".to_string(),
            location: "Library gate".to_string(),
            images: vec!["https://img.example/1.jpg".to_string()],
            ..NewListing::new("Calculus Textbook", Price::from_taka(450))
        }
    }

    #[test]
    fn test_validate_complete_listing() {
        assert_eq!(complete().validate(), Ok(()));
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let listing = NewListing {
            location: "   ".to_string(),
            ..complete()
        };
        assert_eq!(listing.validate(), Err(ListingError::Missing("location")));

        let listing = NewListing {
            price: Price::new(Decimal::new(-5, 0)),
            ..complete()
        };
        assert_eq!(listing.validate(), Err(ListingError::NonPositivePrice));

        let listing = NewListing {
            images: vec![" ".to_string()],
            ..complete()
        };
        assert_eq!(listing.validate(), Err(ListingError::NoImages));
    }

    #[test]
    fn test_normalized_trims_and_drops_blanks() {
        let listing = NewListing {
            title: "  Desk Lamp ".to_string(),
            condition: " ".to_string(),
            tags: vec!["lamp".to_string(), " ".to_string(), "lamp".to_string()],
            images: vec![String::new(), " https://img.example/2.jpg ".to_string()],
            ..complete()
        }
        .normalized();

        assert_eq!(listing.title, "Desk Lamp");
        assert_eq!(listing.condition, DEFAULT_CONDITION);
        assert_eq!(listing.tags, vec!["lamp".to_string()]);
        assert_eq!(listing.images, vec!["https://img.example/2.jpg".to_string()]);
    }

    #[test]
    fn test_draft_carries_seller() {
        let seller = Identity {
            email: Email::parse("seller@just.edu.bd").unwrap(),
            display_name: Some("Rahim".to_string()),
        };
        let draft = ListingDraft::new(complete(), &seller, Utc::now()).unwrap();

        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["title"], "Calculus Textbook");
        assert_eq!(value["price"], 450);
        assert_eq!(value["sellerEmail"], "seller@just.edu.bd");
        assert_eq!(value["sellerName"], "Rahim");
        assert_eq!(value["views"], 0);
        assert!(value.get("listing").is_none());
    }

    #[test]
    fn test_draft_rejects_incomplete_listing() {
        let seller = Identity::new(Email::parse("seller@just.edu.bd").unwrap());
        let listing = NewListing::new("Lamp", Price::from_taka(10));
        let result = ListingDraft::new(listing, &seller, Utc::now());
        assert_eq!(result, Err(ListingError::Missing("description")));
    }
}
