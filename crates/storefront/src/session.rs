//! Storefront session: identity wired into both reconcilers.

use std::sync::Arc;

use chrono::Utc;
use just_mart_core::{
    Identity, ListingDraft, ListingError, NewListing, Order, OrderDraft, Product, ProductId,
    Profile, ProfileError,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, MarketApi, MarketClient};
use crate::config::StorefrontConfig;
use crate::identity::IdentityContext;
use crate::reconcile::{CartReconciler, FetchOutcome, ListStatus, WishlistReconciler};

/// Errors from session operations that are not optimistic.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not signed in")]
    SignedOut,

    #[error("Cart is empty")]
    EmptyCart,

    /// The cart has not been fetched for the current user, or the fetch
    /// failed.
    #[error("Cart is not synced with the backend")]
    CartNotReady,

    #[error("Delivery address is required")]
    MissingAddress,

    #[error("Listing {0} belongs to another seller")]
    NotSeller(ProductId),

    #[error("Invalid listing: {0}")]
    InvalidListing(#[from] ListingError),

    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] ProfileError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Everything a storefront front end needs for one user session.
///
/// Owns the identity context and the cart and wishlist reconcilers, and
/// keeps the reconcilers pointed at whoever is signed in.
pub struct Storefront<A> {
    api: Arc<A>,
    identity: IdentityContext,
    cart: CartReconciler<A>,
    wishlist: WishlistReconciler<A>,
}

impl<A> Clone for Storefront<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            identity: self.identity.clone(),
            cart: self.cart.clone(),
            wishlist: self.wishlist.clone(),
        }
    }
}

impl Storefront<MarketClient> {
    /// A signed-out session against the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn connect(config: &StorefrontConfig) -> Result<Self, ApiError> {
        Ok(Self::new(
            Arc::new(MarketClient::new(config)?),
            IdentityContext::new(),
        ))
    }

    /// Forget cached listings and categories so the next read hits the
    /// backend.
    pub fn invalidate_catalog(&self) {
        self.api.invalidate_all();
    }
}

impl<A: MarketApi> Storefront<A> {
    #[must_use]
    pub fn new(api: Arc<A>, identity: IdentityContext) -> Self {
        Self {
            cart: CartReconciler::new(Arc::clone(&api)),
            wishlist: WishlistReconciler::new(Arc::clone(&api)),
            api,
            identity,
        }
    }

    #[must_use]
    pub const fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    #[must_use]
    pub const fn cart(&self) -> &CartReconciler<A> {
        &self.cart
    }

    #[must_use]
    pub const fn wishlist(&self) -> &WishlistReconciler<A> {
        &self.wishlist
    }

    #[must_use]
    pub const fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Sign in and load both lists.
    pub async fn sign_in(&self, identity: Identity) {
        self.identity.sign_in(identity);
        self.sync_identity().await;
    }

    /// Sign out. Both lists are emptied without any request.
    pub async fn sign_out(&self) {
        self.identity.sign_out();
        self.sync_identity().await;
    }

    /// Point both reconcilers at the context's current identity, fetching
    /// the lists of a newly signed-in user.
    pub async fn sync_identity(&self) {
        let current = self.identity.current();
        let fetch_cart = self.cart.set_identity(current.as_ref());
        let fetch_wishlist = self.wishlist.set_identity(current.as_ref());

        tokio::join!(
            async {
                if fetch_cart {
                    self.cart.fetch_cart().await;
                }
            },
            async {
                if fetch_wishlist {
                    self.wishlist.fetch_wishlist().await;
                }
            }
        );
    }

    /// Follow identity changes made through the context from now on.
    ///
    /// Lists are reset as soon as the change is seen; fetches run in their
    /// own tasks so a slow backend never delays the next change. The task
    /// ends when every handle to the context is dropped.
    pub fn spawn_identity_sync(&self) -> JoinHandle<()> {
        let mut rx = self.identity.subscribe();
        let cart = self.cart.clone();
        let wishlist = self.wishlist.clone();

        tokio::spawn(async move {
            loop {
                let current = rx.borrow_and_update().clone();
                if cart.set_identity(current.as_ref()) {
                    let cart = cart.clone();
                    tokio::spawn(async move { cart.fetch_cart().await });
                }
                if wishlist.set_identity(current.as_ref()) {
                    let wishlist = wishlist.clone();
                    tokio::spawn(async move { wishlist.fetch_wishlist().await });
                }
                if rx.changed().await.is_err() {
                    debug!("Identity context dropped, stopping sync");
                    break;
                }
            }
        })
    }

    /// Re-read both lists from the backend.
    pub async fn refresh(&self) -> (FetchOutcome, FetchOutcome) {
        tokio::join!(self.cart.fetch_cart(), self.wishlist.fetch_wishlist())
    }

    /// All listings.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.api.list_products().await
    }

    /// One listing.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown id.
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.api.get_product(id).await
    }

    /// Category names.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        self.api.list_categories().await
    }

    /// Put a new listing up for sale as the signed-in user.
    ///
    /// # Errors
    ///
    /// Fails without contacting the backend when nobody is signed in or the
    /// listing is incomplete. Otherwise returns the backend error.
    #[instrument(skip(self, listing), fields(title = %listing.title))]
    pub async fn list_item(&self, listing: NewListing) -> Result<ProductId, SessionError> {
        let seller = self.identity.current().ok_or(SessionError::SignedOut)?;
        let draft = ListingDraft::new(listing, &seller, Utc::now())?;
        let product_id = self.api.create_product(&draft).await?;
        info!(product_id = %product_id, seller = %seller.email, "Listing created");
        Ok(product_id)
    }

    /// Listings whose seller is the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SignedOut`] without a user, or the backend
    /// error.
    pub async fn my_listings(&self) -> Result<Vec<Product>, SessionError> {
        let email = self.identity.email().ok_or(SessionError::SignedOut)?;
        let mut products = self.api.list_products().await?;
        products.retain(|product| product.seller_email.as_ref() == Some(&email));
        Ok(products)
    }

    /// Take one of the signed-in user's listings down.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotSeller`] for someone else's listing,
    /// [`SessionError::SignedOut`] without a user, or the backend error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_listing(&self, id: &ProductId) -> Result<(), SessionError> {
        let email = self.identity.email().ok_or(SessionError::SignedOut)?;
        let listing = self.api.get_product(id).await?;
        if listing.seller_email.as_ref() != Some(&email) {
            return Err(SessionError::NotSeller(id.clone()));
        }
        self.api.delete_product(id).await?;
        info!("Listing deleted");
        Ok(())
    }

    /// The signed-in user's profile, or an empty one if none is stored.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SignedOut`] without a user, or the backend
    /// error.
    pub async fn profile(&self) -> Result<Profile, SessionError> {
        let email = self.identity.email().ok_or(SessionError::SignedOut)?;
        Ok(self.api.get_profile(&email).await?.unwrap_or_default())
    }

    /// Replace the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Fails without contacting the backend when nobody is signed in or a
    /// contact number is malformed. Otherwise returns the backend error.
    pub async fn update_profile(&self, profile: &Profile) -> Result<(), SessionError> {
        let email = self.identity.email().ok_or(SessionError::SignedOut)?;
        profile.validate()?;
        self.api.update_profile(&email, profile).await?;
        info!(email = %email, "Profile updated");
        Ok(())
    }

    /// The signed-in user's orders.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SignedOut`] without a user, or the backend
    /// error.
    pub async fn orders(&self) -> Result<Vec<Order>, SessionError> {
        let email = self.identity.email().ok_or(SessionError::SignedOut)?;
        Ok(self.api.list_orders(&email).await?)
    }

    /// Place an order for the current cart and empty it.
    ///
    /// The cart is only cleared once the backend has stored the order. A
    /// failed clear is rolled back like any other cart mutation and does not
    /// fail the checkout.
    ///
    /// # Errors
    ///
    /// Fails without contacting the backend when nobody is signed in, the
    /// address is blank, or the cart is empty or not synced. Otherwise
    /// returns the backend error if the order cannot be created.
    #[instrument(skip(self, delivery_address))]
    pub async fn checkout(&self, delivery_address: &str) -> Result<Order, SessionError> {
        let email = self.identity.email().ok_or(SessionError::SignedOut)?;
        let delivery_address = delivery_address.trim();
        if delivery_address.is_empty() {
            return Err(SessionError::MissingAddress);
        }

        let cart = self.cart.state();
        if cart.owner() != Some(&email) || cart.status() != ListStatus::Synced {
            return Err(SessionError::CartNotReady);
        }
        if cart.items().is_empty() {
            return Err(SessionError::EmptyCart);
        }

        let draft = OrderDraft::from_lines(email, cart.items(), delivery_address, Utc::now());
        let order = self.api.create_order(&draft).await?;
        info!(order_id = %order.order_id, total = %order.total, "Order placed");

        let cleared = self.cart.clear_cart().await;
        if !cleared.is_confirmed() {
            warn!(outcome = ?cleared, "Order placed but cart was not cleared");
        }
        Ok(order)
    }
}
