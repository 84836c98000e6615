use crate::{BindingError, Settled, State, StoreError, StoreRef};
use std::{collections::BTreeMap, fmt::Debug, ops::Deref, rc::Rc};

/// A named operation on a store, receiving the store it is bound to
/// and an argument.
pub type Action<S, A> = Rc<dyn Fn(&StoreRef<S>, A) -> Result<Settled, StoreError>>;

/// A table of [Action]s, built once when the store is created with
/// [create()](crate::provider::create()).
pub struct Actions<S: State, A = ()> {
    actions: BTreeMap<String, Action<S, A>>,
}

impl<S: State, A> Default for Actions<S, A> {
    fn default() -> Self {
        Actions {
            actions: BTreeMap::new(),
        }
    }
}

impl<S: State + 'static, A: 'static> Actions<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action called `name`, replacing any action previously
    /// added under that name.
    pub fn action<N, F>(mut self, name: N, action: F) -> Self
    where
        N: Into<String>,
        F: Fn(&StoreRef<S>, A) -> Result<Settled, StoreError> + 'static,
    {
        self.actions.insert(name.into(), Rc::new(action));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Action<S, A>> {
        self.actions.get(name)
    }

    /// The names of all actions, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<S: State, A> Debug for Actions<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.actions.keys()).finish()
    }
}

/// The store handle handed to application code by the
/// [provider](crate::provider) bindings: a [StoreRef] together with
/// the [Actions] it was created with.
///
/// Dereferences to the [StoreRef], so the state can be read and
/// updated directly as well as through [BoundStore::dispatch()].
pub struct BoundStore<S: State, A = ()> {
    store: StoreRef<S>,
    actions: Rc<Actions<S, A>>,
}

impl<S: State + 'static, A: 'static> BoundStore<S, A> {
    pub fn new(store: StoreRef<S>, actions: Actions<S, A>) -> Self {
        Self {
            store,
            actions: Rc::new(actions),
        }
    }

    /// Run the action called `name` against this store.
    pub fn dispatch(&self, name: &str, argument: A) -> Result<Settled, BindingError> {
        let action = self
            .actions
            .get(name)
            .ok_or_else(|| BindingError::UnknownAction {
                name: name.to_string(),
            })?;

        log::trace!("dispatching store action {:?}", name);
        Ok(action(&self.store, argument)?)
    }

    pub fn actions(&self) -> &Actions<S, A> {
        &self.actions
    }

    pub fn store(&self) -> &StoreRef<S> {
        &self.store
    }
}

impl<S: State, A> Clone for BoundStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            actions: self.actions.clone(),
        }
    }
}

impl<S: State, A> Deref for BoundStore<S, A> {
    type Target = StoreRef<S>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl<S: State, A> PartialEq for BoundStore<S, A> {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store
    }
}

impl<S: State, A> Debug for BoundStore<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundStore")
            .field("store", &self.store)
            .field("actions", &self.actions)
            .finish()
    }
}
