//! Serde adapter storing a [`Duration`] as whole seconds
//!
//! Use with `#[serde(with = "folio_core::duration_secs")]`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Serialize a duration as its whole-second count
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    duration.as_secs().serialize(serializer)
}

/// Deserialize a duration from a whole-second count
///
/// # Errors
///
/// Propagates deserializer errors.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}
