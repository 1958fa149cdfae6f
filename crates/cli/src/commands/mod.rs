//! Subcommand implementations.

pub mod cart;
pub mod catalog;
pub mod listings;
pub mod orders;
pub mod profile;
pub mod wishlist;

use just_mart_core::ProductId;
use just_mart_storefront::{MarketClient, Outcome, SkipReason, Storefront};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub type Store = Storefront<MarketClient>;

/// Print `value` as pretty JSON on stdout.
#[allow(clippy::print_stdout)]
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn require_sign_in(store: &Store) -> CliResult {
    if store.identity().current().is_none() {
        return Err("this command needs --email".into());
    }
    Ok(())
}

pub fn parse_id(raw: &str) -> Result<ProductId, Box<dyn std::error::Error>> {
    Ok(ProductId::parse(raw)?)
}

/// Print a mutation outcome; rolled back or superseded mutations fail the
/// command.
pub fn report(action: &str, outcome: Outcome) -> CliResult {
    let message = match outcome {
        Outcome::Confirmed => "ok",
        Outcome::Skipped(SkipReason::AlreadyPresent) => "already present",
        Outcome::Skipped(SkipReason::NotInList) => "not in list",
        Outcome::Skipped(SkipReason::SignedOut | SkipReason::SessionChanged) => {
            return Err(format!("{action}: not signed in").into());
        }
        Outcome::RolledBack => {
            return Err(format!("{action}: rejected by the backend, change rolled back").into());
        }
        Outcome::Superseded => return Err(format!("{action}: session changed").into()),
    };
    print_json(&serde_json::json!({ "action": action, "result": message }))
}
