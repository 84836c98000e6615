//! An observable state container.
//!
//! A [Store] holds a single [State] value which is replaced, never
//! mutated, by updates scheduled with [StoreRef::set_state()]. Updates
//! run on a task spawned onto a local executor, and once a new state is
//! accepted every registered [Subscriber] and [Watcher] is notified.
//! The [provider] module builds context bindings on top of the store.

mod actions;
mod emitter;
mod error;
mod listener;
pub mod logger;
mod options;
pub mod provider;
mod state;
mod store;
mod updater;

pub use actions::*;
pub use emitter::*;
pub use error::*;
pub use listener::*;
pub use options::*;
pub use state::*;
pub use store::{Settled, Store, StoreRef};
pub use updater::*;
