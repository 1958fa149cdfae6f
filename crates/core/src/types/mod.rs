//! Core types for JustMart.
//!
//! This module provides type-safe wrappers for the marketplace's domain
//! concepts and the records exchanged with the backend.

pub mod cart;
pub mod email;
pub mod id;
pub mod identity;
pub mod listing;
pub mod order;
pub mod price;
pub mod product;
pub mod profile;
pub mod status;
pub mod wishlist;

pub use cart::{CartLine, CartLineRef};
pub use email::{Email, EmailError};
pub use id::*;
pub use identity::Identity;
pub use listing::{ListingDraft, ListingError, NewListing};
pub use order::{Order, OrderDraft, OrderItem};
pub use price::Price;
pub use product::Product;
pub use profile::{Profile, ProfileAddress, ProfileError};
pub use status::OrderStatus;
pub use wishlist::{WishlistEntry, WishlistEntryRef};
