use std::{
    collections::{BTreeMap, HashMap},
    hash::{BuildHasher, Hash},
};

/// A `State` held by a [Store](crate::Store).
///
/// A state is never modified in place. Each accepted update produces a
/// new value with [State::merge()], combining the current state with a
/// `Partial` one level deep.
pub trait State: Sized {
    /// The partial value accepted by
    /// [Store::set_state()](crate::Store::set_state()).
    type Partial;

    /// Produce the next state, with entries from `partial` overriding
    /// those of `self`.
    fn merge(&self, partial: Self::Partial) -> Self;

    /// Returns `true` if every top level entry of `self` equals the
    /// corresponding entry of `other`, and neither has extra entries.
    ///
    /// The provided map implementations compare entry values with
    /// [PartialEq], so nested values are compared by content rather than
    /// by identity. Wrap a value in a type whose `PartialEq` uses
    /// [Rc::ptr_eq](std::rc::Rc::ptr_eq) to compare it by identity.
    fn shallow_eq(&self, other: &Self) -> bool;
}

impl<K, V> State for BTreeMap<K, V>
where
    K: Ord + Clone,
    V: PartialEq + Clone,
{
    type Partial = BTreeMap<K, V>;

    fn merge(&self, partial: Self::Partial) -> Self {
        let mut next = self.clone();
        next.extend(partial);
        next
    }

    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).map_or(false, |other| other == value))
    }
}

impl<K, V, H> State for HashMap<K, V, H>
where
    K: Eq + Hash + Clone,
    V: PartialEq + Clone,
    H: BuildHasher + Clone,
{
    type Partial = HashMap<K, V, H>;

    fn merge(&self, partial: Self::Partial) -> Self {
        let mut next = self.clone();
        next.extend(partial);
        next
    }

    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).map_or(false, |other| other == value))
    }
}
