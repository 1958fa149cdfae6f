//! The signed-in user's profile.

use super::{CliResult, Store, print_json};

/// Fields to change; anything left out keeps its stored value.
pub struct ProfileChanges {
    pub buying_contact: Option<String>,
    pub selling_contact: Option<String>,
    pub location_type: Option<String>,
    pub address: Option<String>,
}

pub async fn show(store: &Store) -> CliResult {
    print_json(&store.profile().await?)
}

pub async fn set(store: &Store, changes: ProfileChanges) -> CliResult {
    let mut profile = store.profile().await?;
    if let Some(number) = changes.buying_contact {
        profile.buying_contact_number = number;
    }
    if let Some(number) = changes.selling_contact {
        profile.selling_contact_number = number;
    }
    if let Some(location_type) = changes.location_type {
        profile.address.location_type = location_type;
    }
    if let Some(address) = changes.address {
        profile.address.custom_address = address;
    }
    store.update_profile(&profile).await?;
    print_json(&profile)
}
