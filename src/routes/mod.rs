pub mod addresses;
pub mod auth;
pub mod carts;
pub mod collections;
pub mod customers;
pub mod images;
pub mod orders;
pub mod products;
pub mod reviews;

use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Titles and names are stored trimmed, so the trimmed form is what must fit.
pub(crate) fn trimmed_length(value: &str, message: &'static str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if !(1..=255).contains(&len) {
        let mut err = ValidationError::new("length");
        err.message = Some(message.into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_title(value: &str) -> Result<(), ValidationError> {
    trimmed_length(value, "title must be 1 to 255 characters")
}

pub(crate) fn validate_name(value: &str) -> Result<(), ValidationError> {
    trimmed_length(value, "name must be 1 to 255 characters")
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
/// Use together with `#[serde(default)]`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
