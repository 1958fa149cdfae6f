//! Error reporting helpers with Sentry integration.
//!
//! Reconciler failures are recovered locally and never returned to callers,
//! so they are reported here instead: each rollback leaves a breadcrumb, and
//! the signed-in user is attached to the Sentry scope for the session.

use just_mart_core::{Email, ProductId};

/// Set the Sentry user context for a signed-in user.
///
/// Call this when the identity context switches to a user.
pub fn set_sentry_user(email: &Email) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating events with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a reconciler event.
///
/// Breadcrumbs appear in Sentry reports to show the trail of cart and
/// wishlist activity leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Rolled back remove", Some(&[("product_id", "p1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Warning,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

/// Record that an optimistic mutation was reverted.
pub(crate) fn rollback_breadcrumb(list: &str, operation: &str, product_id: Option<&ProductId>) {
    let message = format!("Rolled back {operation}");
    match product_id {
        Some(id) => add_breadcrumb(list, &message, Some(&[("product_id", id.as_str())])),
        None => add_breadcrumb(list, &message, None),
    }
}
