// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Activation state: is the safe zone currently active?
//!
//! [`ActivationStore`] is a tiny observable boolean. Subscribers are notified
//! synchronously, in subscription order, and only when the value actually
//! changes. Subscribing does not replay the current value.
//!
//! Transitions are named by [`Trigger`] and resolved by
//! [`ActivationState::transition`]; [`ActivationStore::apply`] runs a trigger
//! through that table and publishes the result.
//!
//! ## Minimal example
//!
//! ```
//! use core::cell::Cell;
//! use std::rc::Rc;
//! use understory_safe_zone::activation::{ActivationStore, Trigger};
//!
//! let store = ActivationStore::new();
//! let seen = Rc::new(Cell::new(0));
//! let counter = seen.clone();
//! let subscription = store.subscribe(move |_| counter.set(counter.get() + 1));
//!
//! store.apply(Trigger::TargetMove);
//! store.apply(Trigger::TargetMove);
//! assert!(store.is_active());
//! assert_eq!(seen.get(), 1);
//!
//! subscription.unsubscribe();
//! store.apply(Trigger::ContainerEnter);
//! assert_eq!(seen.get(), 1);
//! ```

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

/// Whether the safe zone is open.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActivationState {
    /// No zone is drawn; the container may close.
    #[default]
    Inactive,
    /// The pointer is travelling from the target towards the container.
    Active,
}

/// Named cause of an activation transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// The pointer moved over the target surface.
    TargetMove,
    /// The pointer entered the container surface.
    ContainerEnter,
    /// The inactivity timeout elapsed.
    TimeoutFire,
    /// The pointer entered the drawn zone shape.
    ZoneEnter,
    /// The pointer left the drawn zone shape.
    ZoneLeave,
    /// The target surface was detached.
    Detach,
}

impl ActivationState {
    /// Builds a state from a boolean "is active" flag.
    #[must_use]
    pub const fn from_active(active: bool) -> Self {
        if active { Self::Active } else { Self::Inactive }
    }

    /// Returns `true` for [`ActivationState::Active`].
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns the state reached from `self` by `trigger`.
    ///
    /// Zone enter/leave never change the state: entering only re-arms the
    /// inactivity timeout and leaving the shape is tolerated until that
    /// timeout expires.
    #[must_use]
    pub const fn transition(self, trigger: Trigger) -> Self {
        match trigger {
            Trigger::TargetMove => Self::Active,
            Trigger::ContainerEnter | Trigger::TimeoutFire | Trigger::Detach => Self::Inactive,
            Trigger::ZoneEnter | Trigger::ZoneLeave => self,
        }
    }
}

type SubscriberFn = Rc<dyn Fn(bool)>;

struct StoreInner {
    state: Cell<ActivationState>,
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<(u64, SubscriberFn)>>,
}

/// Observable activation flag with change-only notification.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct ActivationStore {
    inner: Rc<StoreInner>,
}

impl fmt::Debug for ActivationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationStore")
            .field("state", &self.inner.state.get())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Default for ActivationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivationStore {
    /// Creates an inactive store with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: Cell::new(ActivationState::Inactive),
                next_id: Cell::new(0),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ActivationState {
        self.inner.state.get()
    }

    /// Returns `true` while the zone is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Sets the flag to `next`, notifying subscribers if it changed.
    ///
    /// Returns `true` when a transition happened. Subscribers run before this
    /// returns, in subscription order.
    pub fn toggle_active(&self, next: bool) -> bool {
        let next = ActivationState::from_active(next);
        if self.inner.state.get() == next {
            return false;
        }
        self.inner.state.set(next);
        zone_debug!(state = ?next, "activation changed");

        // Snapshot so subscribers may (un)subscribe while being notified.
        let subscribers: Vec<SubscriberFn> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, f)| Rc::clone(f))
            .collect();
        for subscriber in subscribers {
            subscriber(next.is_active());
        }
        true
    }

    /// Runs `trigger` through [`ActivationState::transition`] and publishes the result.
    ///
    /// Returns `true` when a transition happened.
    pub fn apply(&self, trigger: Trigger) -> bool {
        zone_trace!(?trigger, "activation trigger");
        let next = self.state().transition(trigger);
        self.toggle_active(next.is_active())
    }

    /// Registers `subscriber`; it is not invoked with the current value.
    #[must_use = "dropping the subscription keeps the subscriber registered; call `unsubscribe` to remove it"]
    pub fn subscribe(&self, subscriber: impl Fn(bool) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id.wrapping_add(1));
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(subscriber)));
        Subscription {
            store: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Removes every subscriber.
    pub fn clear_subscribers(&self) {
        self.inner.subscribers.borrow_mut().clear();
    }
}

/// Disposer returned by [`ActivationStore::subscribe`].
pub struct Subscription {
    store: Weak<StoreInner>,
    id: u64,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("live", &(self.store.strong_count() > 0))
            .finish()
    }
}

impl Subscription {
    /// Removes the subscriber. Other subscribers are unaffected.
    pub fn unsubscribe(self) {
        if let Some(store) = self.store.upgrade() {
            store
                .subscribers
                .borrow_mut()
                .retain(|(id, _)| *id != self.id);
        }
    }
}
