//! Reactive value container
//!
//! A [`Store`] holds one value and notifies its subscribers every time the
//! value is set. Cloning a `Store` hands out another handle to the same
//! value, revision and subscriber list.
//!
//! Dispatch rules:
//! - Callbacks run synchronously, in registration order, with `(next, prev)`.
//! - The subscriber list is snapshotted when dispatch starts, so subscribing
//!   or unsubscribing from inside a callback only affects later updates.
//! - A callback that sets the same store runs a full nested dispatch before
//!   the outer one continues.
//! - A panicking callback is not caught; it unwinds out of `set_value`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Update callback, invoked with `(next, prev)`.
pub type UpdateCallback<T> = dyn Fn(&T, &T);

type CallbackRc<T> = Rc<UpdateCallback<T>>;

struct StoreInner<T> {
    value: T,
    revision: u64,
    next_id: u64,
    callbacks: Vec<(u64, CallbackRc<T>)>,
}

/// Shared, revision-tracked value with change notification.
pub struct Store<T> {
    inner: Rc<RefCell<StoreInner<T>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Store")
            .field("value", &inner.value)
            .field("revision", &inner.revision)
            .field("subscriber_count", &inner.callbacks.len())
            .finish()
    }
}

impl<T: Clone + 'static> Store<T> {
    /// Create a store holding `value`, at revision 0, with no subscribers.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                value,
                revision: 0,
                next_id: 0,
                callbacks: Vec::new(),
            })),
        }
    }

    /// Clone of the current value
    pub fn get_value(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value without cloning it.
    ///
    /// # Panics
    ///
    /// Panics if `f` sets the store or unsubscribes from it.
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value, advance the revision and notify every subscriber.
    ///
    /// The revision changes even when `next` equals the current value.
    pub fn set_value(&self, next: T) {
        let (prev, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            let prev = std::mem::replace(&mut inner.value, next.clone());
            inner.revision = inner.revision.wrapping_add(1);
            let callbacks: Vec<CallbackRc<T>> = inner
                .callbacks
                .iter()
                .map(|(_, callback)| Rc::clone(callback))
                .collect();
            (prev, callbacks)
        };

        for callback in &callbacks {
            callback(&next, &prev);
        }
    }

    /// Compute the next value from the current one, then [`set_value`](Self::set_value) it.
    pub fn update_value(&self, f: impl FnOnce(&T) -> T) {
        let current = self.get_value();
        self.set_value(f(&current));
    }

    /// Subscribe a new callback. Each call creates an independent subscription.
    pub fn on_update(&self, callback: impl Fn(&T, &T) + 'static) -> Subscription {
        self.subscribe_rc(Rc::new(callback))
    }

    /// Subscribe a shared callback.
    ///
    /// If the same `Rc` is already subscribed, no second entry is added and
    /// the returned handle refers to the existing subscription.
    pub fn on_update_rc(&self, callback: Rc<UpdateCallback<T>>) -> Subscription {
        self.subscribe_rc(callback)
    }

    fn subscribe_rc(&self, callback: CallbackRc<T>) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let existing = inner
                .callbacks
                .iter()
                .find(|(_, cb)| Rc::ptr_eq(cb, &callback))
                .map(|(id, _)| *id);
            match existing {
                Some(id) => id,
                None => {
                    let id = inner.next_id;
                    inner.next_id += 1;
                    inner.callbacks.push((id, callback));
                    id
                }
            }
        };

        let weak: Weak<RefCell<StoreInner<T>>> = Rc::downgrade(&self.inner);
        let detach: Weak<dyn Detach> = weak;
        Subscription { id, detach }
    }

    /// Revision marker; changes on every update.
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().callbacks.len()
    }

    /// Non-owning handle, used by subscribers that need to reach back into
    /// the store they are registered on.
    pub(crate) fn downgrade(&self) -> WeakStore<T> {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

pub(crate) struct WeakStore<T> {
    inner: Weak<RefCell<StoreInner<T>>>,
}

impl<T> WeakStore<T> {
    pub(crate) fn upgrade(&self) -> Option<Store<T>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

trait Detach {
    fn detach(&self, id: u64);
}

impl<T> Detach for RefCell<StoreInner<T>> {
    fn detach(&self, id: u64) {
        self.borrow_mut().callbacks.retain(|(cb_id, _)| *cb_id != id);
    }
}

/// Handle returned by [`Store::on_update`].
///
/// Dropping it leaves the callback subscribed; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription {
    id: u64,
    detach: Weak<dyn Detach>,
}

impl Subscription {
    /// Remove this subscription. Calling it again is a no-op, and it never
    /// touches a later re-registration of the same callback.
    pub fn unsubscribe(&self) {
        if let Some(target) = self.detach.upgrade() {
            target.detach(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_get_and_set() {
        let store = Store::new(10);
        assert_eq!(store.get_value(), 10);
        assert_eq!(store.revision(), 0);

        store.set_value(2);
        assert_eq!(store.get_value(), 2);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_callbacks_accumulate() {
        let store = Store::new(10);
        let sum = Rc::new(Cell::new(100));
        let product = Rc::new(Cell::new(-3));

        let _sum_sub = store.on_update({
            let sum = Rc::clone(&sum);
            move |next, _| sum.set(sum.get() + next)
        });
        let product_sub = store.on_update({
            let product = Rc::clone(&product);
            move |next, _| product.set(product.get() * next)
        });
        assert_eq!(store.subscriber_count(), 2);

        store.set_value(2);
        assert_eq!((sum.get(), product.get()), (102, -6));

        store.set_value(-25);
        assert_eq!((sum.get(), product.get()), (77, 150));

        product_sub.unsubscribe();
        assert_eq!(store.subscriber_count(), 1);

        store.set_value(12);
        assert_eq!(store.get_value(), 12);
        assert_eq!((sum.get(), product.get()), (89, 150));
    }

    #[test]
    fn test_callback_receives_next_and_prev() {
        let store = Store::new("a".to_string());
        let seen = Rc::new(RefCell::new(Vec::new()));
        store.on_update({
            let seen = Rc::clone(&seen);
            move |next: &String, prev: &String| seen.borrow_mut().push((next.clone(), prev.clone()))
        });

        store.set_value("b".to_string());
        store.update_value(|v| format!("{v}c"));

        assert_eq!(
            *seen.borrow(),
            vec![
                ("b".to_string(), "a".to_string()),
                ("bc".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_revision_changes_on_equal_value() {
        let store = Store::new(5);
        let before = store.revision();
        store.set_value(5);
        assert_ne!(store.revision(), before);
    }

    #[test]
    fn test_revision_wraps() {
        let store = Store::new(0);
        store.inner.borrow_mut().revision = u64::MAX;
        store.set_value(1);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_registration_order() {
        let store = Store::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            store.on_update(move |_, _| order.borrow_mut().push(tag));
        }
        store.set_value(1);
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let store = Store::new(0);
        let hits = Rc::new(Cell::new(0));
        let _other = store.on_update(|_, _| {});
        let sub = store.on_update({
            let hits = Rc::clone(&hits);
            move |_, _| hits.set(hits.get() + 1)
        });

        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(store.subscriber_count(), 1);

        store.set_value(1);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_same_rc_registers_once() {
        let store = Store::new(0);
        let hits = Rc::new(Cell::new(0));
        let callback: Rc<UpdateCallback<i32>> = {
            let hits = Rc::clone(&hits);
            Rc::new(move |_: &i32, _: &i32| hits.set(hits.get() + 1))
        };

        let first = store.on_update_rc(Rc::clone(&callback));
        let second = store.on_update_rc(Rc::clone(&callback));
        assert_eq!(store.subscriber_count(), 1);

        store.set_value(1);
        assert_eq!(hits.get(), 1);

        // Both handles name the same registration.
        second.unsubscribe();
        assert_eq!(store.subscriber_count(), 0);
        first.unsubscribe();
    }

    #[test]
    fn test_resubscribe_after_unsubscribe() {
        let store = Store::new(0);
        let hits = Rc::new(Cell::new(0));
        let callback: Rc<UpdateCallback<i32>> = {
            let hits = Rc::clone(&hits);
            Rc::new(move |_: &i32, _: &i32| hits.set(hits.get() + 1))
        };

        let old = store.on_update_rc(Rc::clone(&callback));
        old.unsubscribe();
        let _fresh = store.on_update_rc(Rc::clone(&callback));

        // The stale handle must not remove the new registration.
        old.unsubscribe();
        store.set_value(1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_snapshot_ignores_subscribe_during_dispatch() {
        let store = Store::new(0);
        let late_hits = Rc::new(Cell::new(0));

        store.on_update({
            let store = store.clone();
            let late_hits = Rc::clone(&late_hits);
            move |_, _| {
                let late_hits = Rc::clone(&late_hits);
                store.on_update(move |_, _| late_hits.set(late_hits.get() + 1));
            }
        });

        store.set_value(1);
        assert_eq!(late_hits.get(), 0);

        store.set_value(2);
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn test_snapshot_ignores_unsubscribe_during_dispatch() {
        let store = Store::new(0);
        let hits = Rc::new(Cell::new(0));
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        store.on_update({
            let victim = Rc::clone(&victim);
            move |_, _| {
                if let Some(sub) = victim.borrow().as_ref() {
                    sub.unsubscribe();
                }
            }
        });
        let sub = store.on_update({
            let hits = Rc::clone(&hits);
            move |_, _| hits.set(hits.get() + 1)
        });
        *victim.borrow_mut() = Some(sub);

        store.set_value(1);
        assert_eq!(hits.get(), 1);

        store.set_value(2);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_reentrant_set_runs_nested_cycle_first() {
        let store = Store::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        store.on_update({
            let store = store.clone();
            let log = Rc::clone(&log);
            move |next: &i32, prev: &i32| {
                log.borrow_mut().push(format!("a {prev}->{next}"));
                if *next == 1 {
                    store.set_value(2);
                }
            }
        });
        store.on_update({
            let log = Rc::clone(&log);
            move |next: &i32, prev: &i32| log.borrow_mut().push(format!("b {prev}->{next}"))
        });

        store.set_value(1);
        assert_eq!(
            *log.borrow(),
            vec!["a 0->1", "a 1->2", "b 1->2", "b 0->1"]
        );
        assert_eq!(store.get_value(), 2);
    }

    #[test]
    fn test_panicking_callback_propagates() {
        let store = Store::new(0);
        let after = Rc::new(Cell::new(false));
        store.on_update(|next: &i32, _| {
            if *next == 1 {
                panic!("subscriber bug");
            }
        });
        store.on_update({
            let after = Rc::clone(&after);
            move |_, _| after.set(true)
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| store.set_value(1)));
        assert!(result.is_err());
        assert!(!after.get());

        // The value was stored before dispatch, and the store stays usable.
        assert_eq!(store.get_value(), 1);
        store.set_value(2);
        assert!(after.get());
    }

    #[test]
    fn test_unsubscribe_after_store_dropped() {
        let store = Store::new(0);
        let sub = store.on_update(|_, _| {});
        drop(store);
        sub.unsubscribe();
    }

    #[test]
    fn test_clone_shares_state() {
        let store = Store::new(1);
        let other = store.clone();
        other.set_value(7);
        assert_eq!(store.get_value(), 7);
        assert_eq!(store.revision(), other.revision());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Subscribe,
            Unsubscribe(usize),
            Set(i32),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::Subscribe),
                (0usize..8).prop_map(Op::Unsubscribe),
                any::<i32>().prop_map(Op::Set),
            ]
        }

        proptest! {
            #[test]
            fn subscription_fidelity(ops in prop::collection::vec(op_strategy(), 0..40)) {
                let store = Store::new(0i32);
                let calls: Rc<RefCell<Vec<(usize, i32, i32)>>> = Rc::new(RefCell::new(Vec::new()));
                let mut subs: Vec<(usize, Subscription, bool)> = Vec::new();

                for op in ops {
                    match op {
                        Op::Subscribe => {
                            let tag = subs.len();
                            let calls = Rc::clone(&calls);
                            let sub = store.on_update(move |next, prev| {
                                calls.borrow_mut().push((tag, *next, *prev));
                            });
                            subs.push((tag, sub, true));
                        }
                        Op::Unsubscribe(i) => {
                            if let Some(entry) = subs.get_mut(i) {
                                entry.1.unsubscribe();
                                entry.2 = false;
                            }
                        }
                        Op::Set(v) => {
                            let prev = store.get_value();
                            calls.borrow_mut().clear();
                            store.set_value(v);
                            let expected: Vec<(usize, i32, i32)> = subs
                                .iter()
                                .filter(|(_, _, live)| *live)
                                .map(|(tag, _, _)| (*tag, v, prev))
                                .collect();
                            prop_assert_eq!(&*calls.borrow(), &expected);
                        }
                    }
                }
            }

            #[test]
            fn revision_always_changes(values in prop::collection::vec(any::<i32>(), 1..20)) {
                let store = Store::new(0i32);
                for v in values {
                    let before = store.revision();
                    store.set_value(v);
                    prop_assert_ne!(store.revision(), before);
                }
            }
        }
    }
}
