//! Placeholder identifiers for optimistic inserts.
//!
//! The backend assigns every durable identifier. Before an insert is
//! confirmed, an optimistically inserted record carries a temporary
//! placeholder id; the store uses it to locate-and-replace the record once
//! the backend responds (or to remove it on rollback). A placeholder must
//! never be referenced by a foreign key from another entity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix shared by all placeholder identifiers.
pub const PLACEHOLDER_PREFIX: &str = "tmp-";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh placeholder identifier.
///
/// Clock-based with a process-local sequence, so two placeholders created
/// in the same millisecond still differ.
pub fn placeholder_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{PLACEHOLDER_PREFIX}{millis}-{seq}")
}

/// Whether an identifier is an unconfirmed placeholder.
pub fn is_placeholder(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_unique() {
        let a = placeholder_id();
        let b = placeholder_id();
        assert_ne!(a, b);
    }

    #[test]
    fn placeholders_are_recognizable() {
        assert!(is_placeholder(&placeholder_id()));
        assert!(!is_placeholder("42"));
        assert!(!is_placeholder("a3f0c9"));
    }
}
