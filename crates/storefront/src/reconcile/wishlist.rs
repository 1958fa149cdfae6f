//! Wishlist reconciler.

use std::sync::Arc;

use futures_util::future::{join_all, try_join_all};
use just_mart_core::{Identity, Product, ProductId, WishlistEntry, WishlistEntryRef};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::store::{ListStore, Ticket};
use super::{FetchOutcome, Keyed, ListStatus, Outcome, ReconcilerState, SkipReason};
use crate::api::{ApiError, MarketApi};

/// Optimistic mirror of the signed-in user's wishlist.
///
/// Membership only: an entry is either present or not.
pub struct WishlistReconciler<A> {
    inner: Arc<Inner<A>>,
}

struct Inner<A> {
    api: Arc<A>,
    store: ListStore<WishlistEntry>,
}

impl<A> Clone for WishlistReconciler<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: MarketApi> WishlistReconciler<A> {
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                store: ListStore::new("wishlist"),
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> ReconcilerState<WishlistEntry> {
        self.inner.store.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ReconcilerState<WishlistEntry>> {
        self.inner.store.subscribe()
    }

    /// Point the wishlist at a new identity. See
    /// [`CartReconciler::set_identity`](super::CartReconciler::set_identity).
    pub fn set_identity(&self, identity: Option<&Identity>) -> bool {
        self.inner.store.reset(identity.map(|identity| &identity.email))
    }

    /// Replace the wishlist with the backend's copy.
    #[instrument(skip(self))]
    pub async fn fetch_wishlist(&self) -> FetchOutcome {
        let Some(ticket) = self.inner.store.ticket() else {
            return FetchOutcome::SignedOut;
        };
        let _all = ticket.lock_all().await;

        let (items, status) = match self.load(&ticket).await {
            Ok(entries) => (entries, ListStatus::Synced),
            Err(err) => {
                warn!(error = %err, "Failed to fetch wishlist");
                (Vec::new(), ListStatus::Unavailable)
            }
        };
        let count = items.len();
        if !self.inner.store.replace(&ticket, items, status) {
            debug!("Identity changed during wishlist fetch, discarding result");
            return FetchOutcome::Superseded;
        }
        if status == ListStatus::Synced {
            debug!(entries = count, "Wishlist synced");
            FetchOutcome::Synced(count)
        } else {
            FetchOutcome::Unavailable
        }
    }

    async fn load(&self, ticket: &Ticket) -> Result<Vec<WishlistEntry>, ApiError> {
        let ids = unique_ids(self.inner.api.read_wishlist(&ticket.email).await?);
        if ids.is_empty() || !self.inner.store.is_current(ticket) {
            return Ok(Vec::new());
        }

        let api = &self.inner.api;
        let products = try_join_all(ids.iter().map(|id| api.get_product(id))).await?;

        Ok(products
            .into_iter()
            .zip(ids)
            .map(|(mut product, id)| {
                product.product_id = id;
                WishlistEntry::new(product)
            })
            .collect())
    }

    /// Save `product`. Saving a product twice sends nothing the second time.
    #[instrument(skip_all, fields(product_id = %product.product_id))]
    pub async fn add_to_wishlist(&self, product: &Product) -> Outcome {
        let id = &product.product_id;
        let Some(ticket) = self.ticket("add") else {
            return Outcome::Skipped(SkipReason::SignedOut);
        };
        let _key = ticket.lock_key(id).await;

        if self.is_in_wishlist(id) {
            debug!("Already in wishlist");
            return Outcome::Skipped(SkipReason::AlreadyPresent);
        }
        let Some(prior) = self.inner.store.apply_keyed(&ticket, id, |items| {
            items.push(WishlistEntry::new(product.clone()));
        }) else {
            return Outcome::Skipped(SkipReason::SessionChanged);
        };

        match self.inner.api.add_wishlist_item(&ticket.email, id).await {
            Ok(()) => Outcome::Confirmed,
            Err(err) => self.inner.store.rollback_keyed(&ticket, prior, "add", &err),
        }
    }

    #[instrument(skip(self))]
    pub async fn remove_from_wishlist(&self, id: &ProductId) -> Outcome {
        let Some(ticket) = self.ticket("remove") else {
            return Outcome::Skipped(SkipReason::SignedOut);
        };
        let _key = ticket.lock_key(id).await;

        let Some(prior) = self
            .inner
            .store
            .apply_keyed(&ticket, id, |items| items.retain(|entry| entry.key() != id))
        else {
            return Outcome::Skipped(SkipReason::SessionChanged);
        };

        match self.inner.api.remove_wishlist_item(&ticket.email, id).await {
            Ok(()) => Outcome::Confirmed,
            Err(err) => self.inner.store.rollback_keyed(&ticket, prior, "remove", &err),
        }
    }

    /// Remove `product` if saved, otherwise save it.
    pub async fn toggle_wishlist(&self, product: &Product) -> Outcome {
        if self.is_in_wishlist(&product.product_id) {
            self.remove_from_wishlist(&product.product_id).await
        } else {
            self.add_to_wishlist(product).await
        }
    }

    /// Empty the wishlist with one delete per entry.
    ///
    /// If any delete fails the whole previous list is restored, even though
    /// the other deletes may already have taken effect. The next fetch
    /// settles the difference.
    #[instrument(skip(self))]
    pub async fn clear_wishlist(&self) -> Outcome {
        let Some(ticket) = self.ticket("clear") else {
            return Outcome::Skipped(SkipReason::SignedOut);
        };
        let _all = ticket.lock_all().await;

        let Some(previous) = self.inner.store.apply_all(&ticket, Vec::new()) else {
            return Outcome::Skipped(SkipReason::SessionChanged);
        };

        let api = &self.inner.api;
        let results = join_all(
            previous
                .iter()
                .map(|entry| api.remove_wishlist_item(&ticket.email, entry.key())),
        )
        .await;

        let total = results.len();
        let mut errors = results.into_iter().filter_map(Result::err);
        match errors.next() {
            None => Outcome::Confirmed,
            Some(first) => {
                let failed = 1 + errors.count();
                warn!(failed, total, "Some wishlist deletes failed");
                self.inner
                    .store
                    .rollback_all(&ticket, previous, "clear", &first)
            }
        }
    }

    #[must_use]
    pub fn is_in_wishlist(&self, id: &ProductId) -> bool {
        self.inner
            .store
            .read(|state| state.items().iter().any(|entry| entry.key() == id))
    }

    #[must_use]
    pub fn wishlist_items_count(&self) -> usize {
        self.inner.store.read(|state| state.items().len())
    }

    fn ticket(&self, operation: &'static str) -> Option<Ticket> {
        let ticket = self.inner.store.ticket();
        if ticket.is_none() {
            warn!(
                list = self.inner.store.list(),
                operation, "Ignoring mutation: not signed in"
            );
        }
        ticket
    }
}

/// Product ids from a wishlist read, first occurrence wins.
fn unique_ids(entries: Vec<WishlistEntryRef>) -> Vec<ProductId> {
    let mut ids: Vec<ProductId> = Vec::with_capacity(entries.len());
    for entry in entries {
        if !ids.contains(&entry.product_id) {
            ids.push(entry.product_id);
        }
    }
    ids
}
