#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What a [Store](crate::Store) does with an update whose merged
/// state is shallow-equal to the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EqualityPolicy {
    /// Drop the update: the state is kept and no listener is invoked.
    SkipShallowEqual,
    /// Replace the state and notify listeners for every update which
    /// is not a no-op.
    AlwaysNotify,
}

impl Default for EqualityPolicy {
    fn default() -> Self {
        EqualityPolicy::SkipShallowEqual
    }
}

/// Options used to construct a [Store](crate::Store).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StoreOptions {
    pub equality_policy: EqualityPolicy,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equality_policy(mut self, equality_policy: EqualityPolicy) -> Self {
        self.equality_policy = equality_policy;
        self
    }
}
