//! JustMart storefront library.
//!
//! Client-side core of the JustMart campus marketplace: a typed client for
//! the marketplace backend, an identity context, and optimistic reconcilers
//! that keep the signed-in user's cart and wishlist in sync with the backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use just_mart_storefront::{Storefront, StorefrontConfig};
//!
//! let store = Storefront::connect(&StorefrontConfig::from_env()?)?;
//! store.sign_in(Identity::new(email)).await;
//! store.cart().add_to_cart(&product).await;
//! println!("{}", store.cart().cart_total());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod reconcile;
pub mod session;

pub use api::{ApiError, MarketApi, MarketClient};
pub use config::{ConfigError, StorefrontConfig};
pub use identity::IdentityContext;
pub use reconcile::{
    CartReconciler, FetchOutcome, ListStatus, Outcome, ReconcilerState, SkipReason,
    WishlistReconciler,
};
pub use session::{SessionError, Storefront};
