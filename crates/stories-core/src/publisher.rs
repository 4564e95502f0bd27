//! Change notification for storage consumers.
//!
//! A [`Subscriber`] gets a no-argument `update()` call after every storage
//! mutation and pulls whatever data it needs from the storage itself.
//! Calls happen synchronously, on the mutating thread, in registration order.

use std::sync::{Arc, Mutex, PoisonError};

/// Something that wants to hear about storage changes.
pub trait Subscriber: Send + Sync {
    fn update(&self);
}

impl<F> Subscriber for F
where
    F: Fn() + Send + Sync,
{
    fn update(&self) {
        self()
    }
}

/// Registration surface exposed by a storage.
pub trait Publisher {
    /// Register `subscriber`. Registering the same one twice means it is
    /// called twice per change.
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>);

    /// Remove every registration of this exact subscriber instance.
    /// Unknown subscribers are ignored.
    fn unsubscribe(&self, subscriber: &Arc<dyn Subscriber>);
}

/// Ordered list of registered subscribers.
#[derive(Default)]
pub struct SubscriberList {
    subscribers: Mutex<Vec<Arc<dyn Subscriber>>>,
}

impl SubscriberList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        self.lock().push(subscriber);
    }

    pub fn unsubscribe(&self, subscriber: &Arc<dyn Subscriber>) {
        self.lock().retain(|s| !same_instance(s, subscriber));
    }

    /// Call `update()` on every subscriber.
    ///
    /// The list is snapshotted first, so subscribers may (un)subscribe from
    /// inside `update()`.
    pub fn notify(&self) {
        let snapshot: Vec<_> = self.lock().clone();
        for subscriber in snapshot {
            subscriber.update();
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn Subscriber>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Identity comparison on the data pointer (vtable pointers may differ
/// across codegen units for the same object).
fn same_instance(a: &Arc<dyn Subscriber>, b: &Arc<dyn Subscriber>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
    }

    impl Subscriber for Counter {
        fn update(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counter() -> (Arc<Counter>, Arc<dyn Subscriber>) {
        let counter = Arc::new(Counter::default());
        let handle: Arc<dyn Subscriber> = counter.clone();
        (counter, handle)
    }

    #[test]
    fn notify_reaches_every_subscriber_once() {
        let list = SubscriberList::new();
        let (a, a_handle) = counter();
        let (b, b_handle) = counter();
        list.subscribe(a_handle);
        list.subscribe(b_handle);

        list.notify();

        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_registration_is_called_twice() {
        let list = SubscriberList::new();
        let (a, handle) = counter();
        list.subscribe(handle.clone());
        list.subscribe(handle);

        list.notify();

        assert_eq!(a.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_by_identity() {
        let list = SubscriberList::new();
        let (a, a_handle) = counter();
        let (b, b_handle) = counter();
        list.subscribe(a_handle.clone());
        list.subscribe(b_handle);

        list.unsubscribe(&a_handle);
        list.notify();

        assert_eq!(a.calls.load(Ordering::SeqCst), 0);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn unsubscribe_unknown_is_noop() {
        let list = SubscriberList::new();
        let (_a, a_handle) = counter();
        let (_b, b_handle) = counter();
        list.subscribe(a_handle);

        list.unsubscribe(&b_handle);

        assert_eq!(list.len(), 1);
    }

    #[test]
    fn notify_in_registration_order() {
        let list = SubscriberList::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let order = order.clone();
            list.subscribe(Arc::new(move || order.lock().unwrap().push(n)));
        }

        list.notify();

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn subscriber_can_unsubscribe_during_update() {
        let list = Arc::new(SubscriberList::new());
        let slot: Arc<Mutex<Option<Arc<dyn Subscriber>>>> = Arc::new(Mutex::new(None));

        let list_ref = list.clone();
        let slot_ref = slot.clone();
        let handle: Arc<dyn Subscriber> = Arc::new(move || {
            if let Some(me) = slot_ref.lock().unwrap().take() {
                list_ref.unsubscribe(&me);
            }
        });
        *slot.lock().unwrap() = Some(handle.clone());
        list.subscribe(handle);

        list.notify();

        assert!(list.is_empty());
    }
}
