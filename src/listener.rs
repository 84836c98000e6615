use futures::future::{self, Future, FutureExt, LocalBoxFuture};
use std::{fmt::Debug, rc::Rc};

/// A callback which is notified of changes to a
/// [Store](crate::Store).
///
/// Listeners are compared by identity: clones of a listener are the
/// same listener, two listeners built from identical closures are
/// not. This is what [Store::unsubscribe()](crate::Store::unsubscribe())
/// and [Store::unwatch()](crate::Store::unwatch()) match against.
///
/// A listener may be asynchronous. The store invokes every listener
/// before awaiting any of them, and an update settles only once all
/// of the returned futures have completed.
pub struct Listener<T>(Rc<dyn Fn(T) -> LocalBoxFuture<'static, ()>>);

/// An application level [Listener], handed the new state after each
/// accepted update.
pub type Subscriber<S> = Listener<Rc<S>>;

/// A [Listener] used by bindings, handed a [Change] after each
/// accepted update.
pub type Watcher<S> = Listener<Change<S>>;

/// The notification received by a [Watcher].
pub struct Change<S> {
    /// The state produced by the update.
    pub state: Rc<S>,
    /// The store version after the update.
    pub version: u64,
}

impl<S> Clone for Change<S> {
    fn clone(&self) -> Self {
        Change {
            state: self.state.clone(),
            version: self.version,
        }
    }
}

impl<S: Debug> Debug for Change<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Change")
            .field("state", &self.state)
            .field("version", &self.version)
            .finish()
    }
}

impl<T: 'static> Listener<T> {
    /// Create a synchronous listener.
    pub fn new<C: Fn(T) + 'static>(closure: C) -> Self {
        Listener(Rc::new(move |value| {
            closure(value);
            future::ready(()).boxed_local()
        }))
    }

    /// Create a listener which returns a future. The update that
    /// invoked it settles only after the future completes.
    pub fn new_async<C, F>(closure: C) -> Self
    where
        C: Fn(T) -> F + 'static,
        F: Future<Output = ()> + 'static,
    {
        Listener(Rc::new(move |value| closure(value).boxed_local()))
    }

    /// Invoke this listener.
    pub fn emit(&self, value: T) -> LocalBoxFuture<'static, ()> {
        (self.0)(value)
    }

    /// Returns `true` if both listeners are the same callback.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.0) as *const () == Rc::as_ptr(&other.0) as *const ()
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Listener(self.0.clone())
    }
}

impl<T> Debug for Listener<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Listener @ {:p}", Rc::as_ptr(&self.0) as *const ())
    }
}

impl<C, T> From<C> for Listener<T>
where
    C: Fn(T) + 'static,
    T: 'static,
{
    fn from(closure: C) -> Self {
        Listener::new(closure)
    }
}
