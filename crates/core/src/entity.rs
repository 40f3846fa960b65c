//! Child records addressed by identity.

use core::fmt::Debug;
use core::hash::Hash;

/// A record living inside an aggregate (a sale item, a payment) that keeps
/// its identity while quantities and prices change.
pub trait Entity {
    type Id: Clone + Eq + Hash + Debug;

    fn id(&self) -> &Self::Id;
}

pub fn find_by_id<'a, E: Entity>(entities: &'a [E], id: &E::Id) -> Option<&'a E> {
    entities.iter().find(|entity| entity.id() == id)
}

pub fn find_by_id_mut<'a, E: Entity>(entities: &'a mut [E], id: &E::Id) -> Option<&'a mut E> {
    entities.iter_mut().find(|entity| entity.id() == id)
}
