//! Identity context.
//!
//! The single source of truth for who is signed in. Sign-in and sign-out
//! happen outside the storefront; consumers read the current identity or
//! subscribe to changes.

use std::sync::Arc;

use just_mart_core::{Email, Identity};
use tokio::sync::watch;
use tracing::info;

use crate::error::{clear_sentry_user, set_sentry_user};

/// Shared, observable `Option<Identity>`.
#[derive(Debug, Clone)]
pub struct IdentityContext {
    tx: Arc<watch::Sender<Option<Identity>>>,
}

impl Default for IdentityContext {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityContext {
    /// A context with nobody signed in.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn signed_in(identity: Identity) -> Self {
        let context = Self::new();
        context.sign_in(identity);
        context
    }

    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn email(&self) -> Option<Email> {
        self.tx.borrow().as_ref().map(|identity| identity.email.clone())
    }

    /// Switch to `identity`. Returns `false` if it was already current.
    pub fn sign_in(&self, identity: Identity) -> bool {
        let email = identity.email.clone();
        let changed = self.tx.send_if_modified(|current| {
            if current.as_ref() == Some(&identity) {
                return false;
            }
            *current = Some(identity);
            true
        });
        if changed {
            set_sentry_user(&email);
            info!(email = %email, "Signed in");
        }
        changed
    }

    /// Returns `false` if nobody was signed in.
    pub fn sign_out(&self) -> bool {
        let changed = self.tx.send_if_modified(|current| current.take().is_some());
        if changed {
            clear_sentry_user();
            info!("Signed out");
        }
        changed
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }
}
