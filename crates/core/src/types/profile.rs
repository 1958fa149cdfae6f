//! User profile.
//!
//! Contact numbers and a default delivery address, stored by the backend
//! under the user's email.

use serde::{Deserialize, Serialize};

/// Location type of a new profile.
pub const INSIDE_CAMPUS: &str = "Inside Campus";

const PHONE_DIGITS: core::ops::RangeInclusive<usize> = 10..=15;

/// Errors that can occur when validating a [`Profile`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// A contact number is not 10-15 digits.
    #[error("{field} must be a phone number of 10-15 digits")]
    InvalidPhone {
        /// Which contact number failed.
        field: &'static str,
    },
}

/// Where the user usually takes deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAddress {
    #[serde(default = "inside_campus")]
    pub location_type: String,
    #[serde(default)]
    pub custom_address: String,
}

fn inside_campus() -> String {
    INSIDE_CAMPUS.to_string()
}

impl Default for ProfileAddress {
    fn default() -> Self {
        Self {
            location_type: inside_campus(),
            custom_address: String::new(),
        }
    }
}

/// A user's marketplace profile. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub buying_contact_number: String,
    #[serde(default)]
    pub selling_contact_number: String,
    #[serde(default)]
    pub address: ProfileAddress,
}

impl Profile {
    /// Blank numbers are allowed. Spaces, dashes and parentheses are
    /// ignored when counting digits.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidPhone`] for the first bad number.
    pub fn validate(&self) -> Result<(), ProfileError> {
        for (field, number) in [
            ("buyingContactNumber", &self.buying_contact_number),
            ("sellingContactNumber", &self.selling_contact_number),
        ] {
            if !number.trim().is_empty() && !is_phone_number(number) {
                return Err(ProfileError::InvalidPhone { field });
            }
        }
        Ok(())
    }

    /// Whether the user has left any way to be contacted.
    #[must_use]
    pub fn has_contact(&self) -> bool {
        !self.buying_contact_number.trim().is_empty()
            || !self.selling_contact_number.trim().is_empty()
    }
}

fn is_phone_number(number: &str) -> bool {
    let mut digits = 0;
    for c in number.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' | '(' | ')' => {}
            _ => return false,
        }
    }
    PHONE_DIGITS.contains(&digits)
}
