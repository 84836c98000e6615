use crate::State;
use std::fmt::Debug;

/// Describes how [Store::set_state()](crate::Store::set_state())
/// produces the next state from the previous one.
///
/// A [Updater::Partial] is merged into the state as is. A
/// [Updater::Compute] function is handed the state as it stands when
/// the update runs (never a partially applied intermediate) and
/// returns the partial to merge, or `None` to skip the update
/// entirely.
pub enum Updater<S: State> {
    Partial(S::Partial),
    Compute(Box<dyn FnOnce(&S) -> Option<S::Partial>>),
}

impl<S: State> Updater<S> {
    /// Wrap a function of the previous state.
    pub fn compute<F>(function: F) -> Self
    where
        F: FnOnce(&S) -> Option<S::Partial> + 'static,
    {
        Updater::Compute(Box::new(function))
    }

    /// An updater which never changes the state. Only the completion
    /// callback of the update runs.
    pub fn noop() -> Self {
        Updater::Compute(Box::new(|_: &S| None))
    }

    /// Resolve this updater against `prev_state`, returning the
    /// partial to merge or `None` for a no-op.
    pub(crate) fn resolve(self, prev_state: &S) -> Option<S::Partial> {
        match self {
            Updater::Partial(partial) => Some(partial),
            Updater::Compute(function) => function(prev_state),
        }
    }
}

impl<S> From<Option<S::Partial>> for Updater<S>
where
    S: State,
{
    fn from(partial: Option<S::Partial>) -> Self {
        match partial {
            Some(partial) => Updater::Partial(partial),
            None => Updater::noop(),
        }
    }
}

impl<K, V> From<std::collections::BTreeMap<K, V>> for Updater<std::collections::BTreeMap<K, V>>
where
    K: Ord + Clone,
    V: PartialEq + Clone,
{
    fn from(partial: std::collections::BTreeMap<K, V>) -> Self {
        Updater::Partial(partial)
    }
}

impl<K, V, H> From<std::collections::HashMap<K, V, H>>
    for Updater<std::collections::HashMap<K, V, H>>
where
    K: Eq + std::hash::Hash + Clone,
    V: PartialEq + Clone,
    H: std::hash::BuildHasher + Clone,
{
    fn from(partial: std::collections::HashMap<K, V, H>) -> Self {
        Updater::Partial(partial)
    }
}

impl<S: State> Debug for Updater<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Updater::Partial(_) => write!(f, "Updater::Partial"),
            Updater::Compute(_) => write!(f, "Updater::Compute"),
        }
    }
}
