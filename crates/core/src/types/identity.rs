//! Signed-in user identity.

use serde::{Deserialize, Serialize};

use super::Email;

/// The user the identity provider reports as signed in.
///
/// Only the email is needed to address cart, wishlist and order resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    #[must_use]
    pub const fn new(email: Email) -> Self {
        Self {
            email,
            display_name: None,
        }
    }

    /// Name to show for the user, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.email.as_str())
    }
}
