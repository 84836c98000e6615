use crate::Listener;
use futures::future::join_all;
use std::cell::RefCell;

/// An ordered registry of [Listener]s for one kind of notification.
///
/// The same listener may be registered more than once, in which case
/// it is invoked once per registration.
pub struct Emitter<T> {
    listeners: RefCell<Vec<Listener<T>>>,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Emitter {
            listeners: RefCell::new(Vec::new()),
        }
    }
}

impl<T: Clone + 'static> Emitter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener.
    pub fn add(&self, listener: Listener<T>) {
        self.listeners.borrow_mut().push(listener);
    }

    /// Remove the first registration of `listener`. Returns `false` if
    /// it was not registered.
    pub fn remove(&self, listener: &Listener<T>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().position(|l| l.ptr_eq(listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// The listeners registered right now. Changes to the registry made
    /// after this call are not reflected in the returned list.
    pub fn snapshot(&self) -> Vec<Listener<T>> {
        self.listeners.borrow().clone()
    }

    /// Invoke every registered listener with `value`, then wait for all
    /// of them to complete.
    ///
    /// All listeners are invoked before the returned future is first
    /// polled, so a slow listener never delays the invocation of the
    /// next one.
    pub fn emit(&self, value: T) -> impl std::future::Future<Output = ()> {
        let pending: Vec<_> = self
            .snapshot()
            .iter()
            .map(|listener| listener.emit(value.clone()))
            .collect();

        async move {
            join_all(pending).await;
        }
    }
}
