//! Optimistic cart and wishlist reconciliation.
//!
//! A reconciler keeps a client-side mirror of one of the signed-in user's
//! server-side lists. Mutations are applied locally first, then sent to the
//! backend; when the backend rejects them the affected entries are restored
//! from the snapshot taken just before the mutation.
//!
//! # Concurrency
//!
//! - State lives in a `tokio::sync::watch` channel. Every change notifies
//!   subscribers; readers never block writers for longer than a clone.
//! - Mutations on the same product are serialized by a per-key lock held
//!   from the optimistic apply until the response has been reconciled.
//!   Mutations on different products run concurrently.
//! - Whole-list operations (clear, fetch) exclude every keyed mutation.
//! - Each identity change starts a new generation with fresh locks. Anything
//!   still in flight for an older generation is discarded when it completes,
//!   so a slow response can never resurrect a previous user's list.

mod cart;
mod locks;
mod store;
mod wishlist;

#[cfg(test)]
pub(crate) mod testing;

use just_mart_core::{CartLine, Email, ProductId, WishlistEntry};

pub use cart::CartReconciler;
pub use wishlist::WishlistReconciler;

/// Lifecycle of a reconciled list for the current identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ListStatus {
    /// Nobody is signed in; the list is empty and no requests are made.
    #[default]
    SignedOut,
    /// The initial fetch for the current identity is in flight.
    Loading,
    /// The list mirrors the backend (possibly ahead of it by in-flight
    /// optimistic mutations).
    Synced,
    /// The last fetch failed. The list is shown empty but its real contents
    /// are unknown.
    Unavailable,
}

/// Snapshot of a reconciler, as published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerState<T> {
    items: Vec<T>,
    status: ListStatus,
    owner: Option<Email>,
    generation: u64,
}

impl<T> Default for ReconcilerState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: ListStatus::SignedOut,
            owner: None,
            generation: 0,
        }
    }
}

impl<T> ReconcilerState<T> {
    /// Entries in display order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub const fn status(&self) -> ListStatus {
        self.status
    }

    /// True only while the initial fetch for the current identity runs.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ListStatus::Loading
    }

    /// The user whose list this is.
    #[must_use]
    pub const fn owner(&self) -> Option<&Email> {
        self.owner.as_ref()
    }

    /// Identity generation the snapshot belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of a mutation, for callers that want to surface failures.
///
/// Mutations never return errors: failures are recovered by rolling back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The backend accepted the change; local state stands.
    Confirmed,
    /// The backend rejected the change or was unreachable; local state was
    /// restored to the pre-mutation snapshot.
    RolledBack,
    /// The identity changed while the request was in flight. Its result was
    /// ignored.
    Superseded,
    /// Nothing was sent.
    Skipped(SkipReason),
}

impl Outcome {
    #[must_use]
    pub const fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// Why a mutation did not reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No user is signed in.
    SignedOut,
    /// The identity changed before the mutation could be applied.
    SessionChanged,
    /// The product is already on the list (wishlist add).
    AlreadyPresent,
    /// The product is not on the list (quantity update).
    NotInList,
}

/// Result of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The list now mirrors the backend; carries the number of entries.
    Synced(usize),
    /// The fetch failed; the list was emptied and marked unavailable.
    Unavailable,
    /// Nobody is signed in.
    SignedOut,
    /// The identity changed while the fetch was in flight.
    Superseded,
}

/// Entries keyed by product.
pub trait Keyed {
    fn key(&self) -> &ProductId;
}

impl Keyed for CartLine {
    fn key(&self) -> &ProductId {
        self.product_id()
    }
}

impl Keyed for WishlistEntry {
    fn key(&self) -> &ProductId {
        self.product_id()
    }
}
