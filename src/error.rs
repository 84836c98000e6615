use futures::task::SpawnError;
use thiserror::Error;

/// Errors produced by a [Store](crate::Store).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The executor the store schedules its updates on has shut down.
    #[error("unable to schedule store update: {0}")]
    Spawn(#[from] SpawnError),

    /// The store was dropped before the update could be applied.
    #[error("store update abandoned before it settled")]
    Abandoned,
}

/// Errors produced by the [provider](crate::provider) bindings.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("store <{name}> provider not yet mounted on the parent or current component")]
    ProviderNotMounted { name: String },

    #[error("store has no action named {name:?}")]
    UnknownAction { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
