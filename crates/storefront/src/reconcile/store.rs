//! Shared list state for the reconcilers.

use std::sync::{Arc, Mutex, PoisonError};

use just_mart_core::{Email, ProductId};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::locks::{KeyGuard, SessionLocks};
use super::{Keyed, ListStatus, Outcome, ReconcilerState};
use crate::api::ApiError;
use crate::error::rollback_breadcrumb;

/// Proof that a user was signed in at a given generation.
///
/// Every mutation and fetch carries one; state changes made under a stale
/// ticket are dropped.
#[derive(Debug, Clone)]
pub(crate) struct Ticket {
    pub(crate) email: Email,
    pub(crate) generation: u64,
    locks: Arc<SessionLocks>,
}

impl Ticket {
    pub(crate) async fn lock_key(&self, key: &ProductId) -> KeyGuard<'_> {
        self.locks.lock_key(key).await
    }

    pub(crate) async fn lock_all(&self) -> tokio::sync::RwLockWriteGuard<'_, ()> {
        self.locks.lock_all().await
    }
}

/// Where a keyed entry was before an optimistic edit.
#[derive(Debug)]
pub(crate) struct KeyedSnapshot<T> {
    key: ProductId,
    index: usize,
    entry: Option<T>,
}

/// Owner of one reconciled list.
#[derive(Debug)]
pub(crate) struct ListStore<T> {
    list: &'static str,
    state: watch::Sender<ReconcilerState<T>>,
    locks: Mutex<Arc<SessionLocks>>,
}

impl<T> ListStore<T>
where
    T: Keyed + Clone + Send + Sync + 'static,
{
    pub(crate) fn new(list: &'static str) -> Self {
        let (state, _) = watch::channel(ReconcilerState::default());
        Self {
            list,
            state,
            locks: Mutex::new(Arc::new(SessionLocks::default())),
        }
    }

    pub(crate) const fn list(&self) -> &'static str {
        self.list
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ReconcilerState<T>> {
        self.state.subscribe()
    }

    pub(crate) fn snapshot(&self) -> ReconcilerState<T> {
        self.state.borrow().clone()
    }

    /// Run `f` against the current state without cloning it.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&ReconcilerState<T>) -> R) -> R {
        f(&self.state.borrow())
    }

    /// The current session, if someone is signed in.
    pub(crate) fn ticket(&self) -> Option<Ticket> {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let state = self.state.borrow();
        state.owner.as_ref().map(|email| Ticket {
            email: email.clone(),
            generation: state.generation,
            locks: Arc::clone(&locks),
        })
    }

    /// Switch to a new owner.
    ///
    /// Starts a new generation with an empty list unless `owner` already owns
    /// the list. Returns `true` when the caller should fetch, which includes
    /// the same owner again after a failed fetch.
    pub(crate) fn reset(&self, owner: Option<&Email>) -> bool {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let mut retry = false;
        let changed = self.state.send_if_modified(|state| {
            if state.owner.as_ref() == owner {
                retry = state.status == ListStatus::Unavailable;
                return false;
            }
            state.generation += 1;
            state.owner = owner.cloned();
            state.items.clear();
            state.status = if owner.is_some() {
                ListStatus::Loading
            } else {
                ListStatus::SignedOut
            };
            true
        });
        if changed {
            *locks = Arc::new(SessionLocks::default());
            debug!(list = self.list, signed_in = owner.is_some(), "Identity changed");
        }
        (changed || retry) && owner.is_some()
    }

    /// Replace the whole list with fetched contents.
    pub(crate) fn replace(&self, ticket: &Ticket, items: Vec<T>, status: ListStatus) -> bool {
        self.state.send_if_modified(|state| {
            if state.generation != ticket.generation {
                return false;
            }
            state.items = items;
            state.status = status;
            true
        })
    }

    /// Optimistically edit the entry for `key`.
    ///
    /// Returns the entry's prior position and value, or `None` if the ticket
    /// is stale and nothing was applied.
    pub(crate) fn apply_keyed(
        &self,
        ticket: &Ticket,
        key: &ProductId,
        edit: impl FnOnce(&mut Vec<T>),
    ) -> Option<KeyedSnapshot<T>> {
        let mut snapshot = None;
        self.state.send_if_modified(|state| {
            if state.generation != ticket.generation {
                return false;
            }
            let index = state.items.iter().position(|item| item.key() == key);
            snapshot = Some(KeyedSnapshot {
                key: key.clone(),
                index: index.unwrap_or(state.items.len()),
                entry: index.and_then(|i| state.items.get(i).cloned()),
            });
            edit(&mut state.items);
            true
        });
        snapshot
    }

    /// Optimistically replace the whole list, returning the previous items.
    pub(crate) fn apply_all(&self, ticket: &Ticket, items: Vec<T>) -> Option<Vec<T>> {
        let mut previous = None;
        self.state.send_if_modified(|state| {
            if state.generation != ticket.generation {
                return false;
            }
            previous = Some(std::mem::replace(&mut state.items, items));
            true
        });
        previous
    }

    /// Restore the entry captured by `snapshot` after a failed request.
    pub(crate) fn rollback_keyed(
        &self,
        ticket: &Ticket,
        snapshot: KeyedSnapshot<T>,
        operation: &'static str,
        error: &ApiError,
    ) -> Outcome {
        let KeyedSnapshot { key, index, entry } = snapshot;
        let restored = self.state.send_if_modified(|state| {
            if state.generation != ticket.generation {
                return false;
            }
            state.items.retain(|item| item.key() != &key);
            if let Some(entry) = entry {
                let at = index.min(state.items.len());
                state.items.insert(at, entry);
            }
            true
        });
        self.report_rollback(restored, operation, Some(&key), error)
    }

    /// Restore a whole-list snapshot after a failed request.
    pub(crate) fn rollback_all(
        &self,
        ticket: &Ticket,
        items: Vec<T>,
        operation: &'static str,
        error: &ApiError,
    ) -> Outcome {
        let restored = self.state.send_if_modified(|state| {
            if state.generation != ticket.generation {
                return false;
            }
            state.items = items;
            true
        });
        self.report_rollback(restored, operation, None, error)
    }

    fn report_rollback(
        &self,
        restored: bool,
        operation: &'static str,
        key: Option<&ProductId>,
        error: &ApiError,
    ) -> Outcome {
        if !restored {
            debug!(
                list = self.list,
                operation,
                error = %error,
                "Request failed after identity change, ignoring"
            );
            return Outcome::Superseded;
        }

        warn!(
            list = self.list,
            operation,
            product_id = key.map(ProductId::as_str),
            rejected = error.is_rejection(),
            error = %error,
            "Request failed, rolled back optimistic update"
        );
        rollback_breadcrumb(self.list, operation, key);
        Outcome::RolledBack
    }

    /// Whether `ticket` still describes the current session.
    pub(crate) fn is_current(&self, ticket: &Ticket) -> bool {
        self.state.borrow().generation == ticket.generation
    }
}
