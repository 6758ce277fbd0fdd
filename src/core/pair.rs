//! Unordered-pair canonicalization.
//!
//! Stored records keep their slots in creation order, so `(x, y)` and
//! `(y, x)` must collapse to one key when checking per-pair uniqueness.

/// Canonical ordering of a pair: lexicographically lesser identifier first.
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Whether two slot orderings denote the same unordered pair.
pub fn same_pair(a1: &str, b1: &str, a2: &str, b2: &str) -> bool {
    canonical_pair(a1, b1) == canonical_pair(a2, b2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_pair_orders_lexicographically() {
        assert_eq!(canonical_pair("alice", "bob"), ("alice", "bob"));
        assert_eq!(canonical_pair("bob", "alice"), ("alice", "bob"));
    }

    #[test]
    fn test_same_pair_ignores_slot_order() {
        assert!(same_pair("alice", "bob", "bob", "alice"));
        assert!(same_pair("alice", "bob", "alice", "bob"));
        assert!(!same_pair("alice", "bob", "alice", "carol"));
    }

    #[test]
    fn test_identical_parties_are_still_a_pair_key() {
        // The stores reject self-pairs before this is ever consulted.
        assert_eq!(canonical_pair("alice", "alice"), ("alice", "alice"));
    }
}
