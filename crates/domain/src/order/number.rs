//! Customer-facing order numbers.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const PREFIX: &str = "ORD";
const RANDOM_HEX_LEN: usize = 12;

/// A human-readable order identifier: `ORD-YYYYMMDD-XXXXXXXXXXXX`.
///
/// The suffix is 12 uppercase hex characters (48 random bits) taken from
/// a v4 UUID. Uniqueness is finally enforced by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generates a fresh order number dated `now` (UTC).
    pub fn generate(now: DateTime<Utc>) -> Self {
        let random: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(RANDOM_HEX_LEN)
            .collect();
        Self(format!(
            "{PREFIX}-{}-{}",
            now.format("%Y%m%d"),
            random.to_ascii_uppercase()
        ))
    }

    /// Wraps an existing order number without checking its shape.
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns true if `value` has the shape of a generated order number.
    pub fn is_well_formed(value: &str) -> bool {
        let mut parts = value.split('-');
        let (Some(prefix), Some(date), Some(random), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        prefix == PREFIX
            && date.len() == 8
            && date.bytes().all(|b| b.is_ascii_digit())
            && random.len() == RANDOM_HEX_LEN
            && random
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of order numbers used by the writer.
pub type OrderNumberGenerator = Arc<dyn Fn(DateTime<Utc>) -> OrderNumber + Send + Sync>;

/// The production generator.
pub fn random_order_numbers() -> OrderNumberGenerator {
    Arc::new(OrderNumber::generate)
}
