#![forbid(unsafe_code)]

//! Synchronous property-change notification.
//!
//! # Design
//!
//! A [`Notifier`] is a direct-call bus: [`notify`](Notifier::notify) invokes
//! every matching listener before returning, in registration order. There is
//! no batching and no deferred dispatch.
//!
//! Listeners are stored as `Weak` function pointers. Whoever registers keeps
//! the strong handle (a [`Listener`] or a [`Subscription`] guard), so a
//! notifier never keeps its observers alive. Dead entries are pruned lazily
//! during notification.
//!
//! # Invariants
//!
//! 1. Listeners are invoked in registration order.
//! 2. Registering the same listener twice for the same topic is a no-op.
//! 3. [`Topic::Refresh`] reaches every live listener, whatever its topic.
//! 4. No internal borrow is held while listeners run, so a listener may read
//!    from or register on the same notifier.
//!
//! # Failure Modes
//!
//! - **Listener panics**: the panic propagates out of `notify`; listeners
//!   later in the order are not invoked for that event.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A notification channel.
///
/// Each tracked field has two channels: its value ([`Topic::Value`]) and its
/// dirty flag ([`Topic::Dirty`]), so a consumer can bind to "is this field
/// pending" without watching the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// A field's live value changed.
    Value(&'static str),
    /// A field's pending flag may have changed.
    Dirty(&'static str),
    /// The aggregate `is_changed` flag flipped.
    IsChanged,
    /// A collection's membership changed.
    Items,
    /// Everything may have changed; re-read all bound state.
    Refresh,
}

/// A shared listener. Keep the `Rc` alive for as long as it should fire.
pub type Listener = Rc<dyn Fn(&Topic)>;

struct Registration {
    /// `None` receives every topic.
    interest: Option<Topic>,
    callback: Weak<dyn Fn(&Topic)>,
}

impl Registration {
    fn wants(&self, topic: &Topic) -> bool {
        match self.interest {
            None => true,
            Some(_) if *topic == Topic::Refresh => true,
            Some(interest) => interest == *topic,
        }
    }
}

/// Property-change publisher owned by every wrapper and tracker.
#[derive(Default)]
pub struct Notifier {
    registrations: RefCell<Vec<Registration>>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `topic`. Idempotent per (topic, listener).
    pub fn on_change(&self, topic: Topic, listener: &Listener) {
        self.register(Some(topic), listener);
    }

    /// Register `listener` for every topic. Idempotent per listener.
    pub fn on_any(&self, listener: &Listener) {
        self.register(None, listener);
    }

    /// Register a callback for `topic`; it stays registered until the returned
    /// guard is dropped.
    pub fn subscribe(&self, topic: Topic, callback: impl Fn(&Topic) + 'static) -> Subscription {
        let listener: Listener = Rc::new(callback);
        self.register(Some(topic), &listener);
        Subscription { _listener: listener }
    }

    /// Register a callback for every topic, guarded like [`subscribe`](Self::subscribe).
    pub fn subscribe_any(&self, callback: impl Fn(&Topic) + 'static) -> Subscription {
        let listener: Listener = Rc::new(callback);
        self.register(None, &listener);
        Subscription { _listener: listener }
    }

    fn register(&self, interest: Option<Topic>, listener: &Listener) {
        let weak = Rc::downgrade(listener);
        let mut registrations = self.registrations.borrow_mut();
        let duplicate = registrations
            .iter()
            .any(|r| r.interest == interest && Weak::ptr_eq(&r.callback, &weak));
        if !duplicate {
            registrations.push(Registration {
                interest,
                callback: weak,
            });
        }
    }

    /// Deliver `topic` to every matching live listener.
    pub fn notify(&self, topic: &Topic) {
        let targets: Vec<Listener> = {
            let mut registrations = self.registrations.borrow_mut();
            registrations.retain(|r| r.callback.strong_count() > 0);
            registrations
                .iter()
                .filter(|r| r.wants(topic))
                .filter_map(|r| r.callback.upgrade())
                .collect()
        };
        for listener in targets {
            listener(topic);
        }
    }

    /// Number of live registrations.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registrations
            .borrow()
            .iter()
            .filter(|r| r.callback.strong_count() > 0)
            .count()
    }
}

/// RAII guard for a callback registered with [`Notifier::subscribe`].
///
/// Dropping the guard unsubscribes before the next notification.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _listener: Listener,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
