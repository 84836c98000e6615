use crate::{
    Change, Emitter, EqualityPolicy, State, StoreError, StoreOptions, Subscriber, Updater, Watcher,
};
use futures::{
    channel::oneshot,
    future::{self, FutureExt},
    task::{Context, LocalSpawn, LocalSpawnExt, Poll},
};
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt::Debug,
    future::Future,
    ops::Deref,
    pin::Pin,
    rc::Rc,
};

/// An update waiting in the queue of a [Store], to be applied by the
/// task that [StoreRef::set_state()] spawned for it.
struct PendingUpdate<S: State> {
    updater: Updater<S>,
    callback: Option<Box<dyn FnOnce()>>,
    settled: oneshot::Sender<()>,
}

/// A future which resolves once an update scheduled with
/// [StoreRef::set_state()] has settled: the state was replaced (or
/// the update was dropped), every listener completed, and the
/// completion callback ran.
///
/// Dropping a `Settled` does not cancel the update.
#[must_use = "dropping Settled does not cancel the update, but its completion is not observed"]
#[derive(Debug)]
pub struct Settled(oneshot::Receiver<()>);

impl Future for Settled {
    type Output = Result<(), StoreError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0
            .poll_unpin(cx)
            .map(|result| result.map_err(|_| StoreError::Abandoned))
    }
}

/// A wrapper for an [Rc] reference to a [Store].
///
/// This is the handle applications hold. Clones refer to the same
/// store, and two handles compare equal only if they refer to the
/// same store.
pub struct StoreRef<S: State>(Rc<Store<S>>);

impl<S: State + 'static> StoreRef<S> {
    /// Create a store holding `initial_state`, which schedules its
    /// updates on `spawner`.
    pub fn new<Sp: LocalSpawn + 'static>(spawner: Sp, initial_state: S) -> Self {
        Self::with_options(spawner, initial_state, StoreOptions::default())
    }

    pub fn with_options<Sp: LocalSpawn + 'static>(
        spawner: Sp,
        initial_state: S,
        options: StoreOptions,
    ) -> Self {
        Self(Rc::new(Store {
            state: RefCell::new(Rc::new(initial_state)),
            version: Cell::new(0),
            pending: RefCell::new(VecDeque::new()),
            subscribers: Emitter::new(),
            watchers: Emitter::new(),
            spawner: Box::new(spawner),
            options,
        }))
    }

    /// Schedule an update of the state. See
    /// [set_state_with()](StoreRef::set_state_with()).
    pub fn set_state<U: Into<Updater<S>>>(&self, updater: U) -> Result<Settled, StoreError> {
        self.set_state_impl(updater.into(), None)
    }

    /// Schedule an update of the state, running `callback` once the
    /// update has settled.
    ///
    /// The update never applies synchronously: it runs on a task
    /// spawned onto this store's executor, so [Store::get_state()]
    /// still returns the previous state until that task runs. Updates
    /// apply in the order they were scheduled, each against the state
    /// left by the one before it.
    ///
    /// When the update runs:
    ///
    /// + If the updater resolves to `None`, the state is left alone
    ///   and no listener is invoked.
    /// + If the merged state is shallow-equal to the current state and
    ///   the store uses [EqualityPolicy::SkipShallowEqual], the update
    ///   is dropped and no listener is invoked.
    /// + Otherwise the state is replaced, the version incremented and
    ///   every subscriber and watcher is invoked. The update waits for
    ///   all of them to complete.
    ///
    /// In every case `callback` runs last, exactly once.
    pub fn set_state_with<U, C>(&self, updater: U, callback: C) -> Result<Settled, StoreError>
    where
        U: Into<Updater<S>>,
        C: FnOnce() + 'static,
    {
        self.set_state_impl(updater.into(), Some(Box::new(callback)))
    }

    /// Concrete version of [StoreRef::set_state_with()], to avoid
    /// generating a copy of the scheduling code per updater type.
    fn set_state_impl(
        &self,
        updater: Updater<S>,
        callback: Option<Box<dyn FnOnce()>>,
    ) -> Result<Settled, StoreError> {
        let (sender, receiver) = oneshot::channel();

        self.pending.borrow_mut().push_back(PendingUpdate {
            updater,
            callback,
            settled: sender,
        });

        let store = self.0.clone();
        if let Err(error) = self
            .spawner
            .spawn_local(async move { store.apply_next_update().await })
        {
            self.pending.borrow_mut().pop_back();
            log::warn!("store update could not be scheduled: {}", error);
            return Err(error.into());
        }

        log::trace!(
            "store update scheduled ({} pending)",
            self.pending.borrow().len()
        );

        Ok(Settled(receiver))
    }
}

impl<S: State> Clone for StoreRef<S> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S: State> Deref for StoreRef<S> {
    type Target = Store<S>;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl<S: State> PartialEq for StoreRef<S> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<S: State> Debug for StoreRef<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StoreRef @ {:p}", Rc::as_ptr(&self.0))
    }
}

/// An observable container for a single `State`.
///
/// The current state ([Store::get_state()]) can only be changed with
/// [StoreRef::set_state()]. The previous state is never mutated, and
/// remains valid for any part of the application still holding it.
///
/// Two independent registries are notified after every accepted
/// update: subscribers ([Store::subscribe()]) are meant for
/// application code, watchers ([Store::watch()]) for bindings such as
/// the [Provider](crate::provider::Provider).
pub struct Store<S: State> {
    /// The current state of this store.
    state: RefCell<Rc<S>>,
    /// Number of accepted updates.
    version: Cell<u64>,
    /// Updates scheduled but not yet applied, in call order.
    pending: RefCell<VecDeque<PendingUpdate<S>>>,
    subscribers: Emitter<Rc<S>>,
    watchers: Emitter<Change<S>>,
    spawner: Box<dyn LocalSpawn>,
    options: StoreOptions,
}

impl<S: State + 'static> Store<S> {
    /// Get the current `State` stored in this store.
    pub fn get_state(&self) -> Rc<S> {
        self.state.borrow().clone()
    }

    /// The number of updates this store has accepted. Increments each
    /// time the state is replaced.
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Register a [Subscriber], notified with the new state after every
    /// accepted update. Registering the same subscriber twice notifies
    /// it twice.
    pub fn subscribe<L: Into<Subscriber<S>>>(&self, subscriber: L) {
        self.subscribers.add(subscriber.into());
    }

    /// Remove the first registration of `subscriber`.
    pub fn unsubscribe(&self, subscriber: &Subscriber<S>) -> bool {
        self.subscribers.remove(subscriber)
    }

    /// Register a [Watcher], notified with a [Change] after every
    /// accepted update.
    pub fn watch<L: Into<Watcher<S>>>(&self, watcher: L) {
        self.watchers.add(watcher.into());
    }

    /// Remove the first registration of `watcher`.
    pub fn unwatch(&self, watcher: &Watcher<S>) -> bool {
        self.watchers.remove(watcher)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    /// Apply the oldest pending update and notify the listeners.
    async fn apply_next_update(&self) {
        let update = self.pending.borrow_mut().pop_front();
        let update = match update {
            Some(update) => update,
            None => return,
        };

        if let Some(next_state) = self.next_state(update.updater) {
            let next_state = Rc::new(next_state);
            *self.state.borrow_mut() = next_state.clone();

            let version = self.version.get() + 1;
            self.version.set(version);

            log::debug!(
                "store update accepted (version {}), notifying {} subscribers and {} watchers",
                version,
                self.subscribers.len(),
                self.watchers.len()
            );

            let subscribers = self.subscribers.emit(next_state.clone());
            let watchers = self.watchers.emit(Change {
                state: next_state,
                version,
            });
            future::join(subscribers, watchers).await;
        }

        if let Some(callback) = update.callback {
            callback();
        }

        // the caller may have dropped its Settled
        let _ = update.settled.send(());
    }

    /// Resolve `updater` against the current state, returning the state
    /// to replace it with, or `None` if the update is to be dropped.
    fn next_state(&self, updater: Updater<S>) -> Option<S> {
        let prev_state = self.get_state();

        let partial = match updater.resolve(&prev_state) {
            Some(partial) => partial,
            None => {
                log::debug!("store update skipped, updater returned no partial state");
                return None;
            }
        };

        let next_state = prev_state.merge(partial);

        if self.options.equality_policy == EqualityPolicy::SkipShallowEqual
            && prev_state.shallow_eq(&next_state)
        {
            log::debug!("store update dropped, next state is shallow-equal to the current one");
            return None;
        }

        Some(next_state)
    }
}
