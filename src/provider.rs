//! Bindings which present a [Store](crate::Store) to a component tree
//! as a context value.
//!
//! [create()] builds a store together with its [Actions] and the
//! [ContextValue] seen by consumers before any provider has mounted.
//! A [Provider] watches the store and publishes a fresh
//! [ContextValue] (a new [Rc]) after every accepted update, so a host
//! framework comparing context values by reference re-renders exactly
//! when the state changed. A [Consumer] resolves a context value into
//! the [BoundStore], failing if no provider is mounted, or into a
//! [Selection] which follows one slice of the state.

use crate::{
    Actions, BindingError, BoundStore, Change, State, StoreOptions, StoreRef, Subscriber, Watcher,
};
use futures::task::LocalSpawn;
use std::{
    cell::RefCell,
    fmt::Debug,
    rc::{Rc, Weak},
};

/// The name a store is exposed under when none is given.
pub const DEFAULT_MAP_TO_PROP: &str = "store";

/// The value propagated through the component tree.
pub struct ContextValue<S: State, A = ()> {
    pub store: BoundStore<S, A>,
    /// `false` until a [Provider] for the store has mounted.
    pub mounted: bool,
    /// The store version this value was published for.
    pub version: u64,
}

impl<S: State, A> Clone for ContextValue<S, A> {
    fn clone(&self) -> Self {
        ContextValue {
            store: self.store.clone(),
            mounted: self.mounted,
            version: self.version,
        }
    }
}

impl<S: State, A> PartialEq for ContextValue<S, A> {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store && self.mounted == other.mounted && self.version == other.version
    }
}

impl<S: State, A> Debug for ContextValue<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextValue")
            .field("store", &self.store)
            .field("mounted", &self.mounted)
            .field("version", &self.version)
            .finish()
    }
}

/// A store created with [create()], ready to be mounted by a
/// [Provider].
pub struct StoreContext<S: State, A = ()> {
    store: BoundStore<S, A>,
    default_value: Rc<ContextValue<S, A>>,
}

/// Create a store holding `initial_state` with the given `actions`.
pub fn create<S, A, Sp>(spawner: Sp, initial_state: S, actions: Actions<S, A>) -> StoreContext<S, A>
where
    S: State + 'static,
    A: 'static,
    Sp: LocalSpawn + 'static,
{
    create_with_options(spawner, initial_state, actions, StoreOptions::default())
}

pub fn create_with_options<S, A, Sp>(
    spawner: Sp,
    initial_state: S,
    actions: Actions<S, A>,
    options: StoreOptions,
) -> StoreContext<S, A>
where
    S: State + 'static,
    A: 'static,
    Sp: LocalSpawn + 'static,
{
    let store = BoundStore::new(
        StoreRef::with_options(spawner, initial_state, options),
        actions,
    );

    let default_value = Rc::new(ContextValue {
        store: store.clone(),
        mounted: false,
        version: store.version(),
    });

    StoreContext {
        store,
        default_value,
    }
}

impl<S: State + 'static, A: 'static> StoreContext<S, A> {
    pub fn store(&self) -> &BoundStore<S, A> {
        &self.store
    }

    /// The value consumers observe when no [Provider] is mounted above
    /// them.
    pub fn default_value(&self) -> Rc<ContextValue<S, A>> {
        self.default_value.clone()
    }

    /// Mount a [Provider] exposing the store under
    /// [DEFAULT_MAP_TO_PROP].
    pub fn mount(&self) -> Provider<S, A> {
        Provider::mount(self, DEFAULT_MAP_TO_PROP)
    }

    /// A [Consumer] reading the store under [DEFAULT_MAP_TO_PROP].
    pub fn connect(&self) -> Consumer {
        Consumer::default()
    }
}

/// Identifies a render trigger registered with
/// [Provider::on_change()] or [Selection::on_change()].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerId(u64);

/// Render triggers, run with every newly published value.
struct Triggers<T> {
    next_id: u64,
    triggers: Vec<(TriggerId, Rc<dyn Fn(&T)>)>,
}

impl<T> Default for Triggers<T> {
    fn default() -> Self {
        Triggers {
            next_id: 0,
            triggers: Vec::new(),
        }
    }
}

impl<T> Triggers<T> {
    fn add(&mut self, trigger: Rc<dyn Fn(&T)>) -> TriggerId {
        let id = TriggerId(self.next_id);
        self.next_id += 1;
        self.triggers.push((id, trigger));
        id
    }

    fn remove(&mut self, id: TriggerId) -> bool {
        let len = self.triggers.len();
        self.triggers.retain(|(trigger_id, _)| *trigger_id != id);
        self.triggers.len() != len
    }

    fn len(&self) -> usize {
        self.triggers.len()
    }

    fn snapshot(&self) -> Vec<Rc<dyn Fn(&T)>> {
        self.triggers
            .iter()
            .map(|(_, trigger)| trigger.clone())
            .collect()
    }
}

/// Shared between a [Provider] and the [Watcher] it registers.
struct ProviderState<S: State, A> {
    value: Rc<ContextValue<S, A>>,
    triggers: Triggers<Rc<ContextValue<S, A>>>,
}

/// Publishes the [ContextValue] of a store for as long as it is alive.
///
/// Dropping the provider stops it watching the store.
pub struct Provider<S: State + 'static, A: 'static = ()> {
    store: BoundStore<S, A>,
    map_to_prop: String,
    state: Rc<RefCell<ProviderState<S, A>>>,
    watcher: Watcher<S>,
}

impl<S: State + 'static, A: 'static> Provider<S, A> {
    /// Mount a provider for the store of `context`, exposing it under
    /// `map_to_prop`.
    pub fn mount<N: Into<String>>(context: &StoreContext<S, A>, map_to_prop: N) -> Self {
        let store = context.store.clone();
        let map_to_prop = map_to_prop.into();

        let state = Rc::new(RefCell::new(ProviderState {
            value: Rc::new(ContextValue {
                store: store.clone(),
                mounted: true,
                version: store.version(),
            }),
            triggers: Triggers::default(),
        }));

        let weak_state: Weak<RefCell<ProviderState<S, A>>> = Rc::downgrade(&state);
        let watcher = Watcher::new(move |change: Change<S>| {
            if let Some(state) = weak_state.upgrade() {
                Self::publish(&state, change.version);
            }
        });
        store.watch(watcher.clone());

        log::debug!("store <{}> provider mounted", map_to_prop);

        Self {
            store,
            map_to_prop,
            state,
            watcher,
        }
    }

    /// Replace the published value with one for `version`, then run the
    /// render triggers.
    fn publish(state: &RefCell<ProviderState<S, A>>, version: u64) {
        let (value, triggers) = {
            let mut state = state.borrow_mut();
            let value = Rc::new(ContextValue {
                store: state.value.store.clone(),
                mounted: true,
                version,
            });
            state.value = value.clone();
            (value, state.triggers.snapshot())
        };

        for trigger in triggers {
            trigger(&value);
        }
    }

    /// The value currently published by this provider.
    pub fn value(&self) -> Rc<ContextValue<S, A>> {
        self.state.borrow().value.clone()
    }

    pub fn map_to_prop(&self) -> &str {
        &self.map_to_prop
    }

    pub fn store(&self) -> &BoundStore<S, A> {
        &self.store
    }

    /// Register `trigger` to be called with every newly published value.
    pub fn on_change<F: Fn(&Rc<ContextValue<S, A>>) + 'static>(&self, trigger: F) -> TriggerId {
        self.state.borrow_mut().triggers.add(Rc::new(trigger))
    }

    /// Remove a trigger registered with [Provider::on_change()].
    pub fn off_change(&self, id: TriggerId) -> bool {
        self.state.borrow_mut().triggers.remove(id)
    }

    pub fn trigger_count(&self) -> usize {
        self.state.borrow().triggers.len()
    }
}

impl<S: State + 'static, A: 'static> Drop for Provider<S, A> {
    fn drop(&mut self) {
        self.store.unwatch(&self.watcher);
        log::debug!("store <{}> provider unmounted", self.map_to_prop);
    }
}

impl<S: State + 'static, A: 'static> Debug for Provider<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("map_to_prop", &self.map_to_prop)
            .field("value", &*self.state.borrow().value)
            .finish()
    }
}

/// Resolves a [ContextValue] into the [BoundStore] it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumer {
    map_to_prop: String,
}

impl Default for Consumer {
    fn default() -> Self {
        Consumer::new(DEFAULT_MAP_TO_PROP)
    }
}

impl Consumer {
    pub fn new<N: Into<String>>(map_to_prop: N) -> Self {
        Self {
            map_to_prop: map_to_prop.into(),
        }
    }

    pub fn map_to_prop(&self) -> &str {
        &self.map_to_prop
    }

    /// Returns the store carried by `value`, or
    /// [BindingError::ProviderNotMounted] if no [Provider] published it.
    pub fn resolve<S: State, A>(
        &self,
        value: &ContextValue<S, A>,
    ) -> Result<BoundStore<S, A>, BindingError> {
        if !value.mounted {
            return Err(BindingError::ProviderNotMounted {
                name: self.map_to_prop.clone(),
            });
        }

        Ok(value.store.clone())
    }

    /// Resolve `value` like [Consumer::resolve()], then follow the slice
    /// of the state picked out by `map_state`.
    ///
    /// The returned [Selection] republishes only when the slice changes,
    /// so updates touching other parts of the state do not reach its
    /// render triggers.
    pub fn select<S, A, P, F>(
        &self,
        value: &ContextValue<S, A>,
        map_state: F,
    ) -> Result<Selection<S, P, A>, BindingError>
    where
        S: State + 'static,
        A: 'static,
        P: PartialEq + 'static,
        F: Fn(&S) -> P + 'static,
    {
        let store = self.resolve(value)?;
        Ok(Selection::subscribe(store, map_state))
    }
}

/// Shared between a [Selection] and the [Subscriber] it registers.
struct SelectionState<P> {
    selected: Rc<P>,
    triggers: Triggers<Rc<P>>,
}

/// A slice of a store's state, kept current for as long as it is alive.
///
/// Dropping the selection unsubscribes it from the store.
pub struct Selection<S: State + 'static, P: 'static, A: 'static = ()> {
    store: BoundStore<S, A>,
    state: Rc<RefCell<SelectionState<P>>>,
    subscriber: Subscriber<S>,
}

impl<S, P, A> Selection<S, P, A>
where
    S: State + 'static,
    P: PartialEq + 'static,
    A: 'static,
{
    fn subscribe<F: Fn(&S) -> P + 'static>(store: BoundStore<S, A>, map_state: F) -> Self {
        let state = Rc::new(RefCell::new(SelectionState {
            selected: Rc::new(map_state(&store.get_state())),
            triggers: Triggers::default(),
        }));

        let weak_state: Weak<RefCell<SelectionState<P>>> = Rc::downgrade(&state);
        let subscriber = Subscriber::new(move |next_state: Rc<S>| {
            if let Some(state) = weak_state.upgrade() {
                Self::publish(&state, map_state(&next_state));
            }
        });
        store.subscribe(subscriber.clone());

        Self {
            store,
            state,
            subscriber,
        }
    }

    /// Replace the selected slice if `next` differs from it, then run
    /// the render triggers.
    fn publish(state: &RefCell<SelectionState<P>>, next: P) {
        let (selected, triggers) = {
            let mut state = state.borrow_mut();
            if *state.selected == next {
                return;
            }
            state.selected = Rc::new(next);
            (state.selected.clone(), state.triggers.snapshot())
        };

        for trigger in triggers {
            trigger(&selected);
        }
    }

    /// The slice selected from the latest accepted state.
    pub fn get(&self) -> Rc<P> {
        self.state.borrow().selected.clone()
    }

    pub fn store(&self) -> &BoundStore<S, A> {
        &self.store
    }

    /// Register `trigger` to be called whenever the slice changes.
    pub fn on_change<F: Fn(&Rc<P>) + 'static>(&self, trigger: F) -> TriggerId {
        self.state.borrow_mut().triggers.add(Rc::new(trigger))
    }

    /// Remove a trigger registered with [Selection::on_change()].
    pub fn off_change(&self, id: TriggerId) -> bool {
        self.state.borrow_mut().triggers.remove(id)
    }
}

impl<S: State + 'static, P: 'static, A: 'static> Drop for Selection<S, P, A> {
    fn drop(&mut self) {
        self.store.unsubscribe(&self.subscriber);
    }
}

impl<S: State + 'static, P: Debug + 'static, A: 'static> Debug for Selection<S, P, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("selected", &*self.state.borrow().selected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{create, Consumer, ContextValue, Provider};
    use crate::Updater;
    use crate::{Actions, BindingError, StoreRef};
    use futures::executor::LocalPool;
    use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

    type TestState = BTreeMap<&'static str, i32>;

    fn state(entries: &[(&'static str, i32)]) -> TestState {
        entries.iter().cloned().collect()
    }

    fn increment_actions() -> Actions<TestState> {
        Actions::new().action("increment", |store: &StoreRef<TestState>, ()| {
            let next = store.get_state()["count"] + 1;
            store.set_state(state(&[("count", next)]))
        })
    }

    #[test]
    fn consumer_requires_mounted_provider() {
        let pool = LocalPool::new();
        let context = create(pool.spawner(), state(&[("count", 0)]), increment_actions());

        match Consumer::new("counter").resolve(&context.default_value()) {
            Err(error @ BindingError::ProviderNotMounted { .. }) => assert_eq!(
                error.to_string(),
                "store <counter> provider not yet mounted on the parent or current component"
            ),
            other => panic!("unexpected result: {:?}", other),
        }

        let provider = context.mount();
        let store = context.connect().resolve(&provider.value()).unwrap();
        assert!(store == *context.store());
    }

    #[test]
    fn provider_publishes_new_value_per_update() {
        let mut pool = LocalPool::new();
        let context = create(pool.spawner(), state(&[("count", 0)]), increment_actions());
        let provider = Provider::mount(&context, "counter");
        assert_eq!(provider.map_to_prop(), "counter");

        let rendered: Rc<RefCell<Vec<u64>>> = Rc::new(RefCell::new(Vec::new()));
        let rendered_copy = rendered.clone();
        provider.on_change(move |value: &Rc<ContextValue<TestState>>| {
            rendered_copy.borrow_mut().push(value.version);
        });

        let before = provider.value();
        assert_eq!(before.version, 0);

        let settled = provider.store().dispatch("increment", ()).unwrap();
        pool.run_until(settled).unwrap();

        let after = provider.value();
        assert!(!Rc::ptr_eq(&before, &after));
        assert_eq!(after.version, 1);
        assert!(after.mounted);
        assert_eq!(*rendered.borrow(), vec![1]);

        // an update dropped as shallow-equal publishes nothing
        let settled = provider.store().set_state(state(&[("count", 1)])).unwrap();
        pool.run_until(settled).unwrap();
        assert!(Rc::ptr_eq(&after, &provider.value()));
        assert_eq!(*rendered.borrow(), vec![1]);
    }

    #[test]
    fn dropping_provider_unwatches() {
        let pool = LocalPool::new();
        let context = create(pool.spawner(), state(&[("count", 0)]), increment_actions());

        let provider = context.mount();
        let second = context.mount();
        assert_eq!(context.store().watcher_count(), 2);

        drop(provider);
        assert_eq!(context.store().watcher_count(), 1);
        drop(second);
        assert_eq!(context.store().watcher_count(), 0);
    }

    #[test]
    fn subscribers_and_watchers_are_independent() {
        let mut pool = LocalPool::new();
        let context = create(pool.spawner(), state(&[("count", 0)]), increment_actions());
        let provider = context.mount();

        let notified = Rc::new(RefCell::new(0));
        let notified_copy = notified.clone();
        context.store().subscribe(move |_: Rc<TestState>| {
            *notified_copy.borrow_mut() += 1;
        });

        drop(provider);

        let settled = context.store().dispatch("increment", ()).unwrap();
        pool.run_until(settled).unwrap();

        assert_eq!(*notified.borrow(), 1);
        assert_eq!(context.store().get_state()["count"], 1);
    }

    #[test]
    fn off_change_removes_trigger() {
        let mut pool = LocalPool::new();
        let context = create(pool.spawner(), state(&[("count", 0)]), increment_actions());
        let provider = context.mount();

        let calls = Rc::new(RefCell::new(0));
        let calls_copy = calls.clone();
        let id = provider.on_change(move |_: &Rc<ContextValue<TestState>>| {
            *calls_copy.borrow_mut() += 1;
        });
        assert_eq!(provider.trigger_count(), 1);

        let settled = provider.store().dispatch("increment", ()).unwrap();
        pool.run_until(settled).unwrap();
        assert_eq!(*calls.borrow(), 1);

        assert!(provider.off_change(id));
        assert!(!provider.off_change(id));
        assert_eq!(provider.trigger_count(), 0);

        let settled = provider.store().dispatch("increment", ()).unwrap();
        pool.run_until(settled).unwrap();
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(provider.value().version, 2);
    }

    #[test]
    fn selection_follows_selected_slice() {
        let mut pool = LocalPool::new();
        let context = create(
            pool.spawner(),
            state(&[("count", 0), ("other", 0)]),
            increment_actions(),
        );
        let provider = context.mount();

        let selection = context
            .connect()
            .select(&provider.value(), |state: &TestState| state["count"])
            .unwrap();
        assert_eq!(*selection.get(), 0);

        let published = Rc::new(RefCell::new(Vec::new()));
        let published_copy = published.clone();
        selection.on_change(move |count: &Rc<i32>| {
            published_copy.borrow_mut().push(**count);
        });

        // a change to an unrelated key is not republished
        let settled = context.store().set_state(state(&[("other", 7)])).unwrap();
        pool.run_until(settled).unwrap();
        assert_eq!(context.store().version(), 1);
        assert!(published.borrow().is_empty());

        let settled = context.store().dispatch("increment", ()).unwrap();
        pool.run_until(settled).unwrap();
        assert_eq!(*selection.get(), 1);
        assert_eq!(*published.borrow(), vec![1]);

        let settled = context
            .store()
            .set_state(Updater::compute(|state: &TestState| {
                let mut partial = TestState::new();
                partial.insert("other", state["other"] + 1);
                Some(partial)
            }))
            .unwrap();
        pool.run_until(settled).unwrap();
        assert_eq!(*published.borrow(), vec![1]);
    }

    #[test]
    fn selection_requires_mounted_provider_and_unsubscribes_on_drop() {
        let pool = LocalPool::new();
        let context = create(pool.spawner(), state(&[("count", 0)]), increment_actions());

        match context
            .connect()
            .select(&context.default_value(), |state: &TestState| state["count"])
        {
            Err(BindingError::ProviderNotMounted { name }) => assert_eq!(name, "store"),
            other => panic!("unexpected result: {:?}", other),
        }

        let provider = context.mount();
        let selection = context
            .connect()
            .select(&provider.value(), |state: &TestState| state["count"])
            .unwrap();
        assert_eq!(context.store().subscriber_count(), 1);

        drop(selection);
        assert_eq!(context.store().subscriber_count(), 0);
    }
}
