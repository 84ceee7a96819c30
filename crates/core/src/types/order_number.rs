//! Human-readable order numbers.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A human-readable order number, e.g. `ORD-20260807-1F3A9C2B`.
///
/// The suffix is derived from a freshly generated UUIDv4, so numbers are
/// unique without coordinating on a clock; the database keeps a unique
/// index as a backstop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a new order number stamped with the given date.
    #[must_use]
    pub fn generate(at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        // First 8 hex digits are enough: the unique index catches the
        // one-in-four-billion collision.
        Self(format!(
            "ORD-{}-{}",
            at.format("%Y%m%d"),
            suffix[..8].to_uppercase()
        ))
    }

    /// Wrap an existing order number (e.g. read back from storage).
    #[must_use]
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    /// Get the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_format() {
        let at = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).single().expect("valid date");
        let number = OrderNumber::generate(at);
        let text = number.as_str();

        assert!(text.starts_with("ORD-20260807-"), "got {text}");
        let suffix = text.rsplit('-').next().expect("suffix");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!suffix.chars().any(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_generate_unique() {
        let at = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).single().expect("valid date");
        let a = OrderNumber::generate(at);
        let b = OrderNumber::generate(at);
        assert_ne!(a, b);
    }
}
