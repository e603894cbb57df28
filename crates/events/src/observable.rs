//! Observable state holder (publish/subscribe mechanics only).
//!
//! An [`Observable`] is the push side of every store in the console: it owns
//! the latest value and fans it out to subscribers whenever it changes.
//!
//! ## Semantics
//!
//! - **Replay on subscribe**: a new subscriber is called once, immediately,
//!   with the current value (behaviour-subject style), so views never render
//!   an empty placeholder while waiting for the next write.
//! - **Synchronous fan-out**: [`Observable::set`] notifies the current
//!   subscribers before it returns, in subscription order. Nothing is batched
//!   or debounced here; that is a consumer concern.
//! - **Monotonic delivery**: every write gets a version number and a
//!   subscriber never receives a version older than one it has already
//!   seen. When two writers race, the loser's notification is dropped instead
//!   of rolling the subscriber back to a stale value.
//!
//! ## Subscriptions
//!
//! [`Observable::subscribe`] returns a [`Subscription`] guard. Dropping the
//! guard (or calling [`Subscription::unsubscribe`]) detaches the callback. The
//! guard holds only a weak link to the source, so it never keeps a store
//! alive on its own.
//!
//! ## Projections
//!
//! [`Observable::map`] derives a [`Projection`]: a second observable kept in
//! sync with the source through an internal subscription. Projections reflect
//! every later write to the source without the consumer re-subscribing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscriber<T> {
    id: u64,
    last_seen: AtomicU64,
    callback: Callback<T>,
}

impl<T> Subscriber<T> {
    /// Deliver `value` unless this subscriber already saw `version` or newer.
    fn deliver(&self, version: u64, value: &T) {
        if self.last_seen.fetch_max(version, Ordering::AcqRel) < version {
            (self.callback)(value);
        }
    }
}

struct Versioned<T> {
    version: u64,
    value: T,
}

struct Shared<T> {
    current: RwLock<Versioned<T>>,
    subscribers: Mutex<Vec<Arc<Subscriber<T>>>>,
    next_subscriber: AtomicU64,
}

/// Type-erased handle used by [`Subscription`] to detach itself.
trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<T: Send + Sync> Detach for Shared<T> {
    fn detach(&self, id: u64) {
        let mut subs = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subs.retain(|s| s.id != id);
    }
}

/// Shared, cloneable observable value.
///
/// Clones share the same value and subscriber list.
pub struct Observable<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let current = self
            .shared
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Observable")
            .field("version", &current.version)
            .field("value", &current.value)
            .finish()
    }
}

impl<T> Observable<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                current: RwLock::new(Versioned {
                    version: 1,
                    value: initial,
                }),
                subscribers: Mutex::new(Vec::new()),
                next_subscriber: AtomicU64::new(0),
            }),
        }
    }

    /// Synchronous copy of the latest value.
    pub fn snapshot(&self) -> T {
        self.read(T::clone)
    }

    /// Borrow the latest value without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let current = self
            .shared
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&current.value)
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.update(|slot| *slot = value);
    }

    /// Mutate the value in place, then notify subscribers.
    ///
    /// The closure runs under the write lock, so a read-check-write inside it
    /// is atomic with respect to other writers. Its return value is passed
    /// through to the caller.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let (result, version, value) = {
            let mut current = self
                .shared
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let result = f(&mut current.value);
            current.version += 1;
            (result, current.version, current.value.clone())
        };
        self.notify(version, &value);
        result
    }

    /// Like [`Observable::update`], but leaves the value untouched and skips
    /// notification when the closure returns `Err`.
    pub fn try_update<R, E>(&self, f: impl FnOnce(&T) -> Result<(T, R), E>) -> Result<R, E> {
        let (result, version, value) = {
            let mut current = self
                .shared
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let (next, result) = f(&current.value)?;
            current.value = next;
            current.version += 1;
            (result, current.version, current.value.clone())
        };
        self.notify(version, &value);
        Ok(result)
    }

    /// Register `callback`; it is invoked right away with the current value
    /// and then on every subsequent write.
    #[must_use = "dropping the Subscription immediately unsubscribes"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.shared.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let subscriber = Arc::new(Subscriber {
            id,
            last_seen: AtomicU64::new(0),
            callback: Arc::new(callback),
        });

        self.shared
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&subscriber));

        let (version, value) = {
            let current = self
                .shared
                .current
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            (current.version, current.value.clone())
        };
        subscriber.deliver(version, &value);

        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        let source: Weak<dyn Detach> = weak;
        Subscription { id, source }
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Derive a live projection of this observable through `f`.
    pub fn map<U, F>(&self, f: F) -> Projection<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let output = Observable::new(self.read(&f));
        let sink = output.clone();
        let link = self.subscribe(move |value| sink.set(f(value)));
        Projection {
            output,
            _link: link,
        }
    }

    fn notify(&self, version: u64, value: &T) {
        // Callbacks run outside the lock so they may subscribe/unsubscribe.
        let subs: Vec<Arc<Subscriber<T>>> = self
            .shared
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for sub in subs {
            sub.deliver(version, value);
        }
    }
}

/// Guard for a registered callback. Detaches on drop.
#[derive(Debug)]
#[must_use = "dropping the Subscription immediately unsubscribes"]
pub struct Subscription {
    id: u64,
    source: Weak<dyn Detach>,
}

impl Subscription {
    /// Detach the callback now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// False once the source observable has been dropped.
    pub fn is_live(&self) -> bool {
        self.source.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(source) = self.source.upgrade() {
            source.detach(self.id);
        }
    }
}

/// Observable derived from another one; stays in sync until dropped.
pub struct Projection<U> {
    output: Observable<U>,
    _link: Subscription,
}

impl<U> Projection<U>
where
    U: Clone + Send + Sync + 'static,
{
    pub fn snapshot(&self) -> U {
        self.output.snapshot()
    }

    #[must_use = "dropping the Subscription immediately unsubscribes"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&U) + Send + Sync + 'static,
    {
        self.output.subscribe(callback)
    }

    pub fn as_observable(&self) -> &Observable<U> {
        &self.output
    }
}

impl<U: core::fmt::Debug> core::fmt::Debug for Projection<U> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Projection")
            .field("output", &self.output)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |v: &T| sink.lock().unwrap().push(v.clone()))
    }

    #[test]
    fn subscribe_replays_current_value() {
        let obs = Observable::new(7);
        let (seen, cb) = recorder();
        let _sub = obs.subscribe(cb);
        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    #[test]
    fn set_notifies_synchronously_in_order() {
        let obs = Observable::new(0);
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        let _a = obs.subscribe(move |v| o1.lock().unwrap().push(("a", *v)));
        let o2 = Arc::clone(&order);
        let _b = obs.subscribe(move |v| o2.lock().unwrap().push(("b", *v)));

        order.lock().unwrap().clear();
        obs.set(1);
        obs.set(2);

        assert_eq!(
            *order.lock().unwrap(),
            vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]
        );
    }

    #[test]
    fn dropping_subscription_detaches() {
        let obs = Observable::new(0);
        let (seen, cb) = recorder();
        let sub = obs.subscribe(cb);
        assert_eq!(obs.subscriber_count(), 1);

        sub.unsubscribe();
        obs.set(5);

        assert_eq!(obs.subscriber_count(), 0);
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[test]
    fn try_update_error_leaves_value_and_skips_notify() {
        let obs = Observable::new(vec![1, 2]);
        let (seen, cb) = recorder();
        let _sub = obs.subscribe(cb);

        let res: Result<(), &str> = obs.try_update(|_| Err("nope"));
        assert_eq!(res, Err("nope"));
        assert_eq!(obs.snapshot(), vec![1, 2]);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn update_returns_closure_result() {
        let obs = Observable::new(vec![1]);
        let len = obs.update(|v| {
            v.push(2);
            v.len()
        });
        assert_eq!(len, 2);
        assert_eq!(obs.snapshot(), vec![1, 2]);
    }

    #[test]
    fn projection_tracks_source_without_resubscribing() {
        let source = Observable::new(vec![1, 2, 3, 4]);
        let evens = source.map(|v: &Vec<i32>| v.iter().copied().filter(|n| n % 2 == 0).collect::<Vec<_>>());
        assert_eq!(evens.snapshot(), vec![2, 4]);

        source.update(|v| v.push(6));
        assert_eq!(evens.snapshot(), vec![2, 4, 6]);
    }

    #[test]
    fn dropping_projection_releases_source_subscription() {
        let source = Observable::new(1);
        let doubled = source.map(|v: &i32| v * 2);
        assert_eq!(source.subscriber_count(), 1);
        drop(doubled);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn subscription_outliving_source_is_harmless() {
        let sub = {
            let obs = Observable::new(1);
            obs.subscribe(|_| {})
        };
        assert!(!sub.is_live());
        drop(sub);
    }

    #[test]
    fn stale_version_is_not_redelivered() {
        let obs = Observable::new(0);
        let (seen, cb) = recorder();
        let _sub = obs.subscribe(cb);
        obs.set(1);

        // Replay an older version directly: the subscriber must ignore it.
        let subs = obs.shared.subscribers.lock().unwrap().clone();
        subs[0].deliver(1, &0);

        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    }
}
