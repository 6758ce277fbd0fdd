// Core lifecycle exports
pub mod lifecycle;
pub mod pair;

pub use lifecycle::{MatchError, MatchService};
pub use pair::{canonical_pair, same_pair};
