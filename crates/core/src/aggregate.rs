//! Consistency boundary for sales and returns.

use core::fmt::Debug;
use core::hash::Hash;

/// An object that owns its child records and is the only way to change them.
///
/// Collaborators such as the stock ledger or the fiscal book are handed to
/// each operation; an aggregate never reaches for them by itself.
pub trait AggregateRoot {
    type Id: Clone + Eq + Hash + Debug;

    fn id(&self) -> &Self::Id;

    /// Number of events recorded so far. Each recorded event carries the
    /// version it produced, so this is also the length of the stream.
    fn version(&self) -> u64;
}
