use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A pairing awaiting mutual confirmation.
///
/// The party slots keep the order the record was created in; the pair itself
/// is unordered (`(x, y)` and `(y, x)` name the same relationship). Each
/// slot's liked flag only ever moves from false to true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TentativePairing {
    pub id: Uuid,
    #[serde(rename = "partyOne")]
    pub party_one: String,
    #[serde(rename = "partyTwo")]
    pub party_two: String,
    #[serde(rename = "partyOneLiked")]
    pub party_one_liked: bool,
    #[serde(rename = "partyTwoLiked")]
    pub party_two_liked: bool,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl TentativePairing {
    /// Which slot `party` occupies, or `None` for anyone else.
    pub fn slot_of(&self, party: &str) -> Option<Slot> {
        if self.party_one == party {
            Some(Slot::One)
        } else if self.party_two == party {
            Some(Slot::Two)
        } else {
            None
        }
    }

    pub fn liked(&self, slot: Slot) -> bool {
        match slot {
            Slot::One => self.party_one_liked,
            Slot::Two => self.party_two_liked,
        }
    }

    /// Both parties have expressed interest.
    pub fn is_mutual(&self) -> bool {
        self.party_one_liked && self.party_two_liked
    }
}

/// A pairing where interest was mutually confirmed. Immutable once created;
/// removed only by an explicit unmatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedPairing {
    pub id: Uuid,
    #[serde(rename = "partyOne")]
    pub party_one: String,
    #[serde(rename = "partyTwo")]
    pub party_two: String,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One side of a stored pairing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    One,
    Two,
}

/// Record family selector for the operations where the caller chooses at
/// runtime (withdraw/delete). Everywhere else the two families are distinct
/// types with their own invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingFamily {
    Tentative,
    Confirmed,
}

impl fmt::Display for PairingFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingFamily::Tentative => write!(f, "tentative"),
            PairingFamily::Confirmed => write!(f, "confirmed"),
        }
    }
}

/// Result of conflict-tolerant confirmed insertion: either this call stored
/// the record, or another caller got there first and the existing record is
/// returned unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmedInsert {
    Created(ConfirmedPairing),
    Existing(ConfirmedPairing),
}

impl ConfirmedInsert {
    pub fn record(&self) -> &ConfirmedPairing {
        match self {
            ConfirmedInsert::Created(p) | ConfirmedInsert::Existing(p) => p,
        }
    }

    pub fn into_record(self) -> ConfirmedPairing {
        match self {
            ConfirmedInsert::Created(p) | ConfirmedInsert::Existing(p) => p,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, ConfirmedInsert::Created(_))
    }
}

/// What a recorded like amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeOutcome {
    /// Flag set; the other party has not decided yet.
    Pending(TentativePairing),
    /// Interest is mutual. `newly_promoted` is true only for the call that
    /// actually created the confirmed record.
    Matched {
        confirmed: ConfirmedPairing,
        newly_promoted: bool,
    },
}

impl LikeOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, LikeOutcome::Matched { .. })
    }

    pub fn newly_promoted(&self) -> bool {
        matches!(
            self,
            LikeOutcome::Matched {
                newly_promoted: true,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pairing(one_liked: bool, two_liked: bool) -> TentativePairing {
        TentativePairing {
            id: Uuid::new_v4(),
            party_one: "alice".to_string(),
            party_two: "bob".to_string(),
            party_one_liked: one_liked,
            party_two_liked: two_liked,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_slot_resolution() {
        let p = pairing(false, false);
        assert_eq!(p.slot_of("alice"), Some(Slot::One));
        assert_eq!(p.slot_of("bob"), Some(Slot::Two));
        assert_eq!(p.slot_of("mallory"), None);
    }

    #[test]
    fn test_mutual_requires_both_flags() {
        assert!(!pairing(false, false).is_mutual());
        assert!(!pairing(true, false).is_mutual());
        assert!(!pairing(false, true).is_mutual());
        assert!(pairing(true, true).is_mutual());
    }

    #[test]
    fn test_serializes_camel_case() {
        let p = pairing(true, false);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["partyOne"], "alice");
        assert_eq!(json["partyOneLiked"], true);
        assert_eq!(json["partyTwoLiked"], false);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_confirmed_insert_accessors() {
        let c = ConfirmedPairing {
            id: Uuid::new_v4(),
            party_one: "alice".to_string(),
            party_two: "bob".to_string(),
            created_at: Utc::now(),
        };
        assert!(ConfirmedInsert::Created(c.clone()).was_created());
        assert!(!ConfirmedInsert::Existing(c.clone()).was_created());
        assert_eq!(ConfirmedInsert::Existing(c.clone()).record(), &c);
    }
}
