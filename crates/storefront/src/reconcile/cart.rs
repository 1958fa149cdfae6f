//! Cart reconciler.

use std::sync::Arc;

use futures_util::future::try_join_all;
use just_mart_core::{CartLine, CartLineRef, Email, Identity, Price, Product, ProductId};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::store::{ListStore, Ticket};
use super::{FetchOutcome, Keyed, ListStatus, Outcome, ReconcilerState, SkipReason};
use crate::api::{ApiError, MarketApi};

/// Optimistic mirror of the signed-in user's cart.
///
/// Cheap to clone; clones share the same state.
pub struct CartReconciler<A> {
    inner: Arc<Inner<A>>,
}

struct Inner<A> {
    api: Arc<A>,
    store: ListStore<CartLine>,
}

impl<A> Clone for CartReconciler<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: MarketApi> CartReconciler<A> {
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                store: ListStore::new("cart"),
            }),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ReconcilerState<CartLine> {
        self.inner.store.snapshot()
    }

    /// Receive every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ReconcilerState<CartLine>> {
        self.inner.store.subscribe()
    }

    /// Point the cart at a new identity.
    ///
    /// Empties the list synchronously. Returns `true` when the caller should
    /// follow up with [`fetch_cart`](Self::fetch_cart); signing out never
    /// issues a request.
    pub fn set_identity(&self, identity: Option<&Identity>) -> bool {
        self.inner.store.reset(identity.map(|identity| &identity.email))
    }

    /// Replace the cart with the backend's copy.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> FetchOutcome {
        let Some(ticket) = self.inner.store.ticket() else {
            return FetchOutcome::SignedOut;
        };
        let _all = ticket.lock_all().await;

        let (items, status) = match self.load(&ticket).await {
            Ok(lines) => (lines, ListStatus::Synced),
            Err(err) => {
                warn!(error = %err, "Failed to fetch cart");
                (Vec::new(), ListStatus::Unavailable)
            }
        };
        let count = items.len();
        if !self.inner.store.replace(&ticket, items, status) {
            debug!("Identity changed during cart fetch, discarding result");
            return FetchOutcome::Superseded;
        }
        match status {
            ListStatus::Synced => {
                debug!(lines = count, "Cart synced");
                FetchOutcome::Synced(count)
            }
            _ => FetchOutcome::Unavailable,
        }
    }

    async fn load(&self, ticket: &Ticket) -> Result<Vec<CartLine>, ApiError> {
        let lines = merge_lines(self.inner.api.read_cart(&ticket.email).await?);
        if lines.is_empty() || !self.inner.store.is_current(ticket) {
            return Ok(Vec::new());
        }

        let api = &self.inner.api;
        let products = try_join_all(lines.iter().map(|line| api.get_product(&line.product_id))).await?;

        Ok(products
            .into_iter()
            .zip(lines)
            .map(|(mut product, line)| {
                product.product_id = line.product_id;
                CartLine {
                    product,
                    quantity: line.quantity,
                }
            })
            .collect())
    }

    /// Add one unit of `product`.
    #[instrument(skip_all, fields(product_id = %product.product_id))]
    pub async fn add_to_cart(&self, product: &Product) -> Outcome {
        let id = &product.product_id;
        let Some(ticket) = self.ticket("add") else {
            return Outcome::Skipped(SkipReason::SignedOut);
        };
        let _key = ticket.lock_key(id).await;

        let Some(prior) = self.inner.store.apply_keyed(&ticket, id, |items| {
            match items.iter_mut().find(|line| line.key() == id) {
                Some(line) => line.quantity = line.quantity.saturating_add(1),
                None => items.push(CartLine::new(product.clone())),
            }
        }) else {
            return Outcome::Skipped(SkipReason::SessionChanged);
        };

        let item = CartLineRef {
            product_id: id.clone(),
            quantity: 1,
        };
        match self.inner.api.add_cart_item(&ticket.email, &item).await {
            Ok(()) => Outcome::Confirmed,
            Err(err) => self.inner.store.rollback_keyed(&ticket, prior, "add", &err),
        }
    }

    /// Remove the line for `id`. Removing an absent product leaves the cart
    /// unchanged.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, id: &ProductId) -> Outcome {
        let Some(ticket) = self.ticket("remove") else {
            return Outcome::Skipped(SkipReason::SignedOut);
        };
        let _key = ticket.lock_key(id).await;

        let Some(prior) = self
            .inner
            .store
            .apply_keyed(&ticket, id, |items| items.retain(|line| line.key() != id))
        else {
            return Outcome::Skipped(SkipReason::SessionChanged);
        };

        match self.inner.api.remove_cart_item(&ticket.email, id).await {
            Ok(()) => Outcome::Confirmed,
            Err(err) => self.inner.store.rollback_keyed(&ticket, prior, "remove", &err),
        }
    }

    /// Set the quantity for `id`. Zero or less removes the line.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, id: &ProductId, quantity: i64) -> Outcome {
        if quantity <= 0 {
            return self.remove_from_cart(id).await;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let Some(ticket) = self.ticket("update") else {
            return Outcome::Skipped(SkipReason::SignedOut);
        };
        let _key = ticket.lock_key(id).await;

        if !self.is_in_cart(id) {
            warn!("Cannot update quantity: product not in cart");
            return Outcome::Skipped(SkipReason::NotInList);
        }
        let Some(prior) = self.inner.store.apply_keyed(&ticket, id, |items| {
            if let Some(line) = items.iter_mut().find(|line| line.key() == id) {
                line.quantity = quantity;
            }
        }) else {
            return Outcome::Skipped(SkipReason::SessionChanged);
        };

        match self
            .inner
            .api
            .update_cart_item(&ticket.email, id, quantity)
            .await
        {
            Ok(()) => Outcome::Confirmed,
            Err(err) => self.inner.store.rollback_keyed(&ticket, prior, "update", &err),
        }
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Outcome {
        let Some(ticket) = self.ticket("clear") else {
            return Outcome::Skipped(SkipReason::SignedOut);
        };
        let _all = ticket.lock_all().await;

        let Some(previous) = self.inner.store.apply_all(&ticket, Vec::new()) else {
            return Outcome::Skipped(SkipReason::SessionChanged);
        };

        match self.inner.api.clear_cart(&ticket.email).await {
            Ok(()) => Outcome::Confirmed,
            Err(err) => self.inner.store.rollback_all(&ticket, previous, "clear", &err),
        }
    }

    /// Sum of price times quantity over every line.
    #[must_use]
    pub fn cart_total(&self) -> Price {
        self.inner
            .store
            .read(|state| state.items().iter().map(CartLine::line_total).sum())
    }

    /// Sum of quantities.
    #[must_use]
    pub fn cart_items_count(&self) -> u64 {
        self.inner.store.read(|state| {
            state
                .items()
                .iter()
                .map(|line| u64::from(line.quantity))
                .sum()
        })
    }

    #[must_use]
    pub fn is_in_cart(&self, id: &ProductId) -> bool {
        self.inner
            .store
            .read(|state| state.items().iter().any(|line| line.key() == id))
    }

    /// The cart's owner, if signed in.
    #[must_use]
    pub fn owner(&self) -> Option<Email> {
        self.inner.store.read(|state| state.owner().cloned())
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

/// Collapse duplicate product ids and drop empty lines from a cart read.
fn merge_lines(lines: Vec<CartLineRef>) -> Vec<CartLineRef> {
    let mut merged: Vec<CartLineRef> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            continue;
        }
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => merged.push(line),
        }
    }
    merged
}
