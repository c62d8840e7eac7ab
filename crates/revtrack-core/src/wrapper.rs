#![forbid(unsafe_code)]

//! Tracking wrapper around one entity.
//!
//! # Design
//!
//! [`EntityWrapper<T>`] is a cheap handle (`Rc`) to shared state holding the
//! entity, the ledger of original values, the registry of tracked children,
//! and a [`Notifier`]. Cloning a wrapper creates a new handle to the **same**
//! state; identity is [`TrackerId`].
//!
//! Children are registered once and linked upward through their notifier: a
//! child's [`Topic::IsChanged`] is re-raised by the parent only when it flips
//! the parent's aggregate state, so raw field events never cross a wrapper
//! boundary.
//!
//! # Invariants
//!
//! 1. A field is in the ledger iff its live value differs from its value at
//!    the last checkpoint. Setting a field back to its original removes the
//!    entry.
//! 2. A ledger entry keeps the value first captured, however many times the
//!    field is rewritten before the next checkpoint.
//! 3. `is_changed()` is ledger non-empty OR any child changed, computed on
//!    every call.
//! 4. An effective `set` raises `IsChanged` only on a flip, then
//!    `Value(field)`, then `Dirty(field)`. A no-op `set` raises nothing.
//! 5. `accept_changes`/`reject_changes` raise at most one `IsChanged` and
//!    always end with `Refresh`.
//!
//! # Panics
//!
//! Mutations borrow the entity mutably. Holding a `Ref` from
//! [`model`](EntityWrapper::model) across a `set` panics with a `RefCell`
//! borrow error.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::collection::CollectionTracker;
use crate::entity::{Entity, Field, Shared, shared};
use crate::error::{Result, TrackError};
use crate::notify::{Listener, Notifier, Subscription, Topic};
use crate::tracking::{ParentLink, RevertibleChangeTracking, TrackerId};
use crate::validation::ValidationFailure;
use crate::value::Value;

struct TrackedChild {
    tracker: Rc<dyn RevertibleChangeTracking>,
    /// Keeps the bubbling callback on the child's notifier alive.
    _link: Subscription,
}

struct WrapperInner<T: Entity> {
    model: Shared<T>,
    /// Original values of pending fields, keyed by field name.
    ledger: RefCell<BTreeMap<&'static str, Value>>,
    children: RefCell<Vec<TrackedChild>>,
    notifier: Notifier,
    parent: ParentLink,
    /// Set while accept/reject walks the children; their flips are coalesced.
    settling: Cell<bool>,
}

impl<T: Entity> WrapperInner<T> {
    fn is_changed(&self) -> bool {
        !self.ledger.borrow().is_empty()
            || self.children.borrow().iter().any(|c| c.tracker.is_changed())
    }

    /// Whether anything other than `child` keeps this wrapper changed.
    fn changed_besides(&self, child: TrackerId) -> bool {
        !self.ledger.borrow().is_empty()
            || self
                .children
                .borrow()
                .iter()
                .any(|c| c.tracker.tracker_id() != child && c.tracker.is_changed())
    }

    fn child_flipped(&self, child: TrackerId) {
        if self.settling.get() {
            return;
        }
        if !self.changed_besides(child) {
            tracing::trace!(message = "wrapper.bubble", entity = T::NAME);
            self.notifier.notify(&Topic::IsChanged);
        }
    }

    fn tracked(&self) -> Vec<Rc<dyn RevertibleChangeTracking>> {
        self.children
            .borrow()
            .iter()
            .map(|c| Rc::clone(&c.tracker))
            .collect()
    }

    /// Update the ledger after `field` went from `current` to `proposed`, then
    /// notify.
    fn record(&self, field: &'static str, current: Value, proposed: &Value) {
        let was_changed = self.is_changed();
        {
            let mut ledger = self.ledger.borrow_mut();
            let back_to_original = ledger.get(field).map(|original| original == proposed);
            match back_to_original {
                None => {
                    tracing::trace!(message = "wrapper.pending", entity = T::NAME, field);
                    ledger.insert(field, current);
                }
                Some(true) => {
                    tracing::trace!(message = "wrapper.restored", entity = T::NAME, field);
                    ledger.remove(field);
                }
                Some(false) => {}
            }
        }
        if was_changed != self.is_changed() {
            self.notifier.notify(&Topic::IsChanged);
        }
        self.notifier.notify(&Topic::Value(field));
        self.notifier.notify(&Topic::Dirty(field));
    }

    fn accept_changes(&self) {
        let was_changed = self.is_changed();
        self.settling.set(true);
        let committed = {
            let mut ledger = self.ledger.borrow_mut();
            let count = ledger.len();
            ledger.clear();
            count
        };
        for child in self.tracked() {
            child.accept_changes();
        }
        self.settling.set(false);
        tracing::debug!(message = "wrapper.accept", entity = T::NAME, fields = committed);
        self.finish_walk(was_changed);
    }

    fn reject_changes(&self) {
        let was_changed = self.is_changed();
        self.settling.set(true);
        let pending = std::mem::take(&mut *self.ledger.borrow_mut());
        let restored = pending.len();
        {
            let mut model = self.model.borrow_mut();
            for (field, original) in pending {
                // Ledger values were read from the same field, so the write
                // only fails for a hand-written table that disagrees with
                // itself.
                if let Err(err) = model.write_field(field, original) {
                    tracing::warn!(
                        message = "wrapper.restore_failed",
                        entity = T::NAME,
                        field,
                        error = %err
                    );
                }
            }
        }
        for child in self.tracked() {
            child.reject_changes();
        }
        self.settling.set(false);
        tracing::debug!(message = "wrapper.reject", entity = T::NAME, fields = restored);
        self.finish_walk(was_changed);
    }

    fn finish_walk(&self, was_changed: bool) {
        if was_changed != self.is_changed() {
            self.notifier.notify(&Topic::IsChanged);
        }
        self.notifier.notify(&Topic::Refresh);
    }

    fn is_valid(&self) -> bool {
        self.model.borrow().validate().is_empty()
            && self.children.borrow().iter().all(|c| c.tracker.is_valid())
    }
}

/// Change-tracking proxy around one [`Entity`].
///
/// ```ignore
/// let address = EntityWrapper::from_entity(Address { id: 1, city: "Berlin".into() });
/// address.set("city", "Munich")?;
/// assert!(address.is_field_changed("city"));
/// assert_eq!(address.original("city")?, Value::from("Berlin"));
/// address.reject_changes();
/// assert_eq!(address.get("city")?, Value::from("Berlin"));
/// ```
pub struct EntityWrapper<T: Entity> {
    inner: Rc<WrapperInner<T>>,
}

impl<T: Entity> Clone for EntityWrapper<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Entity> fmt::Debug for EntityWrapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityWrapper")
            .field("entity", &T::NAME)
            .field("pending", &self.changed_fields())
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}

impl<T: Entity> EntityWrapper<T> {
    /// Wrap a shared entity. Writes go through to the same instance.
    #[must_use]
    pub fn new(model: Shared<T>) -> Self {
        Self {
            inner: Rc::new(WrapperInner {
                model,
                ledger: RefCell::new(BTreeMap::new()),
                children: RefCell::new(Vec::new()),
                notifier: Notifier::new(),
                parent: ParentLink::default(),
                settling: Cell::new(false),
            }),
        }
    }

    /// Take ownership of a plain entity and wrap it.
    #[must_use]
    pub fn from_entity(entity: T) -> Self {
        Self::new(shared(entity))
    }

    /// Wrap an entity that may be absent.
    pub fn try_new(model: Option<Shared<T>>) -> Result<Self> {
        model
            .map(Self::new)
            .ok_or(TrackError::NullEntity { entity: T::NAME })
    }

    #[must_use]
    pub fn id(&self) -> TrackerId {
        TrackerId::of(&self.inner)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The wrapped entity handle.
    #[must_use]
    pub fn model(&self) -> Shared<T> {
        Rc::clone(&self.inner.model)
    }

    /// Read the wrapped entity without cloning the handle.
    pub fn with_model<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.model.borrow())
    }

    // ------------------------------------------------------------------
    // Field access
    // ------------------------------------------------------------------

    /// Current value of `field`.
    pub fn get(&self, field: &str) -> Result<Value> {
        self.inner
            .model
            .borrow()
            .read_field(field)
            .ok_or_else(|| TrackError::field_not_found(T::NAME, field))
    }

    /// Write `value` into `field`, updating the ledger.
    ///
    /// The ledger compares what the field holds after the write, so a value
    /// of another kind that converts to the current one (`Int(2)` into a
    /// float field holding `2.0`) is a no-op like an equal value: the ledger
    /// is untouched and nothing is notified.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        let key = T::field_key(field).ok_or_else(|| TrackError::field_not_found(T::NAME, field))?;
        let proposed = value.into();
        let current = self.get(key)?;
        if current == proposed {
            return Ok(());
        }
        let stored = {
            let mut model = self.inner.model.borrow_mut();
            model.write_field(key, proposed)?;
            model
                .read_field(key)
                .ok_or_else(|| TrackError::field_not_found(T::NAME, key))?
        };
        if stored == current {
            return Ok(());
        }
        self.inner.record(key, current, &stored);
        Ok(())
    }

    /// Typed read.
    pub fn value<V>(&self, field: Field<T, V>) -> V {
        field.read(&*self.inner.model.borrow())
    }

    /// Typed write; same ledger semantics as [`set`](Self::set), but cannot
    /// name a missing field or carry the wrong type.
    pub fn assign<V>(&self, field: Field<T, V>, value: V)
    where
        V: Clone + Into<Value>,
    {
        let current: Value = self.value(field).into();
        let proposed: Value = value.clone().into();
        if current == proposed {
            return;
        }
        field.write(&mut *self.inner.model.borrow_mut(), value);
        self.inner.record(field.name(), current, &proposed);
    }

    /// What `field` would hold after a reject right now.
    pub fn original(&self, field: &str) -> Result<Value> {
        let key = T::field_key(field).ok_or_else(|| TrackError::field_not_found(T::NAME, field))?;
        let stored = self.inner.ledger.borrow().get(key).cloned();
        match stored {
            Some(original) => Ok(original),
            None => self.get(key),
        }
    }

    /// Typed [`original`](Self::original).
    pub fn original_value<V>(&self, field: Field<T, V>) -> V
    where
        V: TryFrom<Value>,
    {
        let stored = self.inner.ledger.borrow().get(field.name()).cloned();
        match stored.map(V::try_from) {
            Some(Ok(original)) => original,
            Some(Err(_)) => {
                // Only a hand-written table whose read and write disagree
                // gets here.
                tracing::warn!(
                    message = "wrapper.original_mismatch",
                    entity = T::NAME,
                    field = field.name()
                );
                self.value(field)
            }
            None => self.value(field),
        }
    }

    /// Whether `field` is pending.
    #[must_use]
    pub fn is_field_changed(&self, field: &str) -> bool {
        self.inner.ledger.borrow().contains_key(field)
    }

    /// Typed [`is_field_changed`](Self::is_field_changed).
    #[must_use]
    pub fn is_changed_field<V>(&self, field: Field<T, V>) -> bool {
        self.is_field_changed(field.name())
    }

    /// Pending fields, in name order.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<&'static str> {
        self.inner.ledger.borrow().keys().copied().collect()
    }

    // ------------------------------------------------------------------
    // Checkpoint
    // ------------------------------------------------------------------

    /// Own ledger non-empty, or any registered child changed.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.inner.is_changed()
    }

    /// Clear the ledger and accept every child, in registration order.
    pub fn accept_changes(&self) {
        self.inner.accept_changes();
    }

    /// Restore every pending field, then reject every child.
    pub fn reject_changes(&self) {
        self.inner.reject_changes();
    }

    // ------------------------------------------------------------------
    // Nested tracking
    // ------------------------------------------------------------------

    fn register_tracker(
        &self,
        tracker: Rc<dyn RevertibleChangeTracking>,
        entity: &'static str,
    ) -> Result<bool> {
        let child = tracker.tracker_id();
        if self
            .inner
            .children
            .borrow()
            .iter()
            .any(|c| c.tracker.tracker_id() == child)
        {
            return Ok(false);
        }
        tracker.parent_link().attach(self.id(), entity)?;

        let was_changed = self.inner.is_changed();
        let weak = Rc::downgrade(&self.inner);
        let link = tracker.notifier().subscribe(Topic::IsChanged, move |topic| {
            // Refresh reaches every listener; only a flip bubbles.
            if *topic != Topic::IsChanged {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.child_flipped(child);
            }
        });
        self.inner.children.borrow_mut().push(TrackedChild {
            tracker,
            _link: link,
        });
        tracing::trace!(message = "wrapper.register", entity = T::NAME, child = entity);

        if was_changed != self.inner.is_changed() {
            self.inner.notifier.notify(&Topic::IsChanged);
        }
        Ok(true)
    }

    /// Track a nested wrapper. Registering the same wrapper twice is a no-op;
    /// registering one that already has another parent fails.
    pub fn register_complex<C: Entity>(&self, child: &EntityWrapper<C>) -> Result<()> {
        self.register_tracker(Rc::new(child.clone()), C::NAME)
            .map(|_| ())
    }

    /// Track a nested collection and keep `backing` (a projection onto this
    /// entity's plain sequence) mirroring its membership.
    pub fn register_collection<C: Entity>(
        &self,
        tracker: &CollectionTracker<C>,
        backing: fn(&mut T) -> Option<&mut Vec<Shared<C>>>,
    ) -> Result<()> {
        if self.register_tracker(Rc::new(tracker.clone()), C::NAME)? {
            let model = Rc::clone(&self.inner.model);
            tracker.bind_backing(move |items| {
                if let Some(list) = backing(&mut *model.borrow_mut()) {
                    *list = items;
                }
            });
        }
        Ok(())
    }

    /// Wrap and register the nested object `project` reads off the entity.
    ///
    /// Fails with [`TrackError::MissingNestedData`] when it is absent.
    pub fn track_complex<C: Entity>(
        &self,
        field: &'static str,
        project: impl FnOnce(&T) -> Option<Shared<C>>,
    ) -> Result<EntityWrapper<C>> {
        let nested = project(&*self.inner.model.borrow()).ok_or(TrackError::MissingNestedData {
            entity: T::NAME,
            field,
        })?;
        let child = EntityWrapper::new(nested);
        self.register_complex(&child)?;
        Ok(child)
    }

    /// Wrap every element of the nested sequence `backing` projects onto,
    /// register the resulting tracker, and keep the sequence in sync.
    ///
    /// Fails with [`TrackError::MissingNestedData`] when the sequence is
    /// absent.
    pub fn track_collection<C: Entity>(
        &self,
        field: &'static str,
        backing: fn(&mut T) -> Option<&mut Vec<Shared<C>>>,
    ) -> Result<CollectionTracker<C>> {
        let models = backing(&mut *self.inner.model.borrow_mut())
            .map(|list| list.to_vec())
            .ok_or(TrackError::MissingNestedData {
                entity: T::NAME,
                field,
            })?;
        let tracker = CollectionTracker::from_models(models)?;
        self.register_collection(&tracker, backing)?;
        Ok(tracker)
    }

    // ------------------------------------------------------------------
    // Notification
    // ------------------------------------------------------------------

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    pub fn on_change(&self, topic: Topic, listener: &Listener) {
        self.inner.notifier.on_change(topic, listener);
    }

    pub fn subscribe(&self, topic: Topic, callback: impl Fn(&Topic) + 'static) -> Subscription {
        self.inner.notifier.subscribe(topic, callback)
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Current validation failures of this entity. Not cached.
    #[must_use]
    pub fn validation_failures(&self) -> Vec<ValidationFailure> {
        self.inner.model.borrow().validate()
    }

    /// Messages of the failures concerning `field`.
    #[must_use]
    pub fn errors_for(&self, field: &str) -> Vec<String> {
        self.validation_failures()
            .into_iter()
            .filter(|failure| failure.concerns(field))
            .map(|failure| failure.message)
            .collect()
    }

    /// No own failures and every tracked child valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }
}

impl<T: Entity> RevertibleChangeTracking for EntityWrapper<T> {
    fn tracker_id(&self) -> TrackerId {
        self.id()
    }

    fn is_changed(&self) -> bool {
        self.inner.is_changed()
    }

    fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    fn accept_changes(&self) {
        self.inner.accept_changes();
    }

    fn reject_changes(&self) {
        self.inner.reject_changes();
    }

    fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    fn parent_link(&self) -> &ParentLink {
        &self.inner.parent
    }
}
