// Model exports
pub mod domain;

pub use domain::{
    ConfirmedInsert, ConfirmedPairing, LikeOutcome, PairingFamily, Slot, TentativePairing,
};
