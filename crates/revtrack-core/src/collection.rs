#![forbid(unsafe_code)]

//! Change tracking over an ordered sequence of wrappers.
//!
//! # Design
//!
//! [`CollectionTracker<C>`] holds the current members and the baseline
//! membership captured at construction or at the last accept. Membership is
//! the ordered sequence of wrapper identities: moving a member to another
//! position is a change, and reject puts every baseline member back in its
//! baseline position.
//!
//! A tracker is a child to its parent wrapper and a parent to its members:
//! a member's [`Topic::IsChanged`] flip is re-raised by the tracker when it
//! flips the tracker's aggregate, exactly as a wrapper does for its children.
//!
//! # Invariants
//!
//! 1. After any membership edit (and after a reject that reshapes
//!    membership), the backing sequence equals the unwrapped current
//!    members, in order.
//! 2. `is_changed()` is membership differs from baseline OR any member
//!    changed.
//! 3. A wrapper is a member of at most one tracker.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::entity::{Entity, Shared};
use crate::error::{Result, TrackError};
use crate::notify::{Listener, Notifier, Subscription, Topic};
use crate::tracking::{ParentLink, RevertibleChangeTracking, TrackerId};
use crate::wrapper::EntityWrapper;

type Backing<C> = Box<dyn Fn(Vec<Shared<C>>)>;

struct Member<C: Entity> {
    wrapper: EntityWrapper<C>,
    _link: Subscription,
}

struct CollectionInner<C: Entity> {
    members: RefCell<Vec<Member<C>>>,
    baseline: RefCell<Vec<EntityWrapper<C>>>,
    backing: RefCell<Option<Backing<C>>>,
    notifier: Notifier,
    parent: ParentLink,
    settling: Cell<bool>,
}

impl<C: Entity> CollectionInner<C> {
    /// Attach `wrapper` to this tracker and listen for its flips.
    fn link(self: &Rc<Self>, wrapper: EntityWrapper<C>) -> Result<Member<C>> {
        if !wrapper.parent_link().attach(TrackerId::of(self), C::NAME)? {
            // Already a member here; a wrapper holds one position only.
            return Err(TrackError::AlreadyRegistered { entity: C::NAME });
        }
        let member = wrapper.id();
        let weak = Rc::downgrade(self);
        let link = wrapper.notifier().subscribe(Topic::IsChanged, move |topic| {
            if *topic != Topic::IsChanged {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.member_flipped(member);
            }
        });
        Ok(Member {
            wrapper,
            _link: link,
        })
    }

    fn membership_differs(&self) -> bool {
        let members = self.members.borrow();
        let baseline = self.baseline.borrow();
        members.len() != baseline.len()
            || members
                .iter()
                .zip(baseline.iter())
                .any(|(m, b)| !b.ptr_eq(&m.wrapper))
    }

    fn is_changed(&self) -> bool {
        self.membership_differs() || self.members.borrow().iter().any(|m| m.wrapper.is_changed())
    }

    fn changed_besides(&self, member: TrackerId) -> bool {
        self.membership_differs()
            || self
                .members
                .borrow()
                .iter()
                .any(|m| m.wrapper.id() != member && m.wrapper.is_changed())
    }

    fn member_flipped(&self, member: TrackerId) {
        if self.settling.get() {
            return;
        }
        if !self.changed_besides(member) {
            tracing::trace!(message = "collection.bubble", entity = C::NAME);
            self.notifier.notify(&Topic::IsChanged);
        }
    }

    fn wrappers(&self) -> Vec<EntityWrapper<C>> {
        self.members
            .borrow()
            .iter()
            .map(|m| m.wrapper.clone())
            .collect()
    }

    fn sync_backing(&self) {
        if let Some(backing) = self.backing.borrow().as_ref() {
            let models = self
                .members
                .borrow()
                .iter()
                .map(|m| m.wrapper.model())
                .collect();
            backing(models);
        }
    }

    fn announce(&self, was_changed: bool) {
        if was_changed != self.is_changed() {
            self.notifier.notify(&Topic::IsChanged);
        }
    }

    /// Put the baseline membership back, keeping surviving members' links.
    fn restore_baseline(self: &Rc<Self>) {
        let baseline = self.baseline.borrow().clone();
        let mut current = std::mem::take(&mut *self.members.borrow_mut());
        let mut restored = Vec::with_capacity(baseline.len());
        for wrapper in baseline {
            if let Some(pos) = current.iter().position(|m| m.wrapper.ptr_eq(&wrapper)) {
                restored.push(current.remove(pos));
                continue;
            }
            match self.link(wrapper) {
                Ok(member) => restored.push(member),
                Err(err) => {
                    tracing::warn!(
                        message = "collection.restore_skipped",
                        entity = C::NAME,
                        error = %err
                    );
                }
            }
        }
        for discarded in current {
            discarded.wrapper.parent_link().detach();
        }
        *self.members.borrow_mut() = restored;
    }

    fn accept_changes(&self) {
        let was_changed = self.is_changed();
        self.settling.set(true);
        let wrappers = self.wrappers();
        for wrapper in &wrappers {
            wrapper.accept_changes();
        }
        let size = wrappers.len();
        *self.baseline.borrow_mut() = wrappers;
        self.settling.set(false);
        tracing::debug!(message = "collection.accept", entity = C::NAME, size);
        self.announce(was_changed);
    }

    fn reject_changes(self: &Rc<Self>) {
        let was_changed = self.is_changed();
        self.settling.set(true);
        let reshaped = self.membership_differs();
        if reshaped {
            self.restore_baseline();
            self.sync_backing();
        }
        for wrapper in self.wrappers() {
            wrapper.reject_changes();
        }
        self.settling.set(false);
        tracing::debug!(message = "collection.reject", entity = C::NAME, reshaped);
        if reshaped {
            self.notifier.notify(&Topic::Items);
        }
        self.announce(was_changed);
    }

    fn is_valid(&self) -> bool {
        self.members.borrow().iter().all(|m| m.wrapper.is_valid())
    }
}

/// Change-tracking sequence of [`EntityWrapper`]s.
///
/// Cloning a `CollectionTracker` creates a new handle to the **same** state.
pub struct CollectionTracker<C: Entity> {
    inner: Rc<CollectionInner<C>>,
}

impl<C: Entity> Clone for CollectionTracker<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C: Entity> fmt::Debug for CollectionTracker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionTracker")
            .field("entity", &C::NAME)
            .field("len", &self.len())
            .field("baseline", &self.inner.baseline.borrow().len())
            .field("changed", &self.is_changed())
            .finish()
    }
}

impl<C: Entity> CollectionTracker<C> {
    /// Track `wrappers`; their order and identities become the baseline.
    ///
    /// Fails if any wrapper already has a parent.
    pub fn new(wrappers: impl IntoIterator<Item = EntityWrapper<C>>) -> Result<Self> {
        let inner = Rc::new(CollectionInner {
            members: RefCell::new(Vec::new()),
            baseline: RefCell::new(Vec::new()),
            backing: RefCell::new(None),
            notifier: Notifier::new(),
            parent: ParentLink::default(),
            settling: Cell::new(false),
        });
        let mut members: Vec<Member<C>> = Vec::new();
        for wrapper in wrappers {
            match inner.link(wrapper) {
                Ok(member) => members.push(member),
                Err(err) => {
                    for member in members {
                        member.wrapper.parent_link().detach();
                    }
                    return Err(err);
                }
            }
        }
        *inner.baseline.borrow_mut() = members.iter().map(|m| m.wrapper.clone()).collect();
        *inner.members.borrow_mut() = members;
        Ok(Self { inner })
    }

    /// Wrap each plain element and track the resulting wrappers.
    pub fn from_models(models: impl IntoIterator<Item = Shared<C>>) -> Result<Self> {
        Self::new(models.into_iter().map(EntityWrapper::new))
    }

    #[must_use]
    pub fn id(&self) -> TrackerId {
        TrackerId::of(&self.inner)
    }

    /// Mirror membership into a plain sequence from now on, starting with
    /// the current members.
    pub(crate) fn bind_backing(&self, backing: impl Fn(Vec<Shared<C>>) + 'static) {
        *self.inner.backing.borrow_mut() = Some(Box::new(backing));
        self.inner.sync_backing();
    }

    fn edit<R>(&self, apply: impl FnOnce(&mut Vec<Member<C>>) -> R) -> R {
        let was_changed = self.inner.is_changed();
        let out = apply(&mut self.inner.members.borrow_mut());
        self.inner.sync_backing();
        self.inner.notifier.notify(&Topic::Items);
        self.inner.announce(was_changed);
        out
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Append `wrapper`.
    pub fn add(&self, wrapper: EntityWrapper<C>) -> Result<()> {
        let index = self.len();
        self.insert(index, wrapper)
    }

    /// Insert `wrapper` at `index` (clamped to the current length).
    ///
    /// Fails if `wrapper` is already a member here or elsewhere.
    pub fn insert(&self, index: usize, wrapper: EntityWrapper<C>) -> Result<()> {
        let member = self.inner.link(wrapper)?;
        tracing::debug!(message = "collection.add", entity = C::NAME, index);
        self.edit(|members| {
            let index = index.min(members.len());
            members.insert(index, member);
        });
        Ok(())
    }

    /// Remove `wrapper`; returns whether it was a member.
    pub fn remove(&self, wrapper: &EntityWrapper<C>) -> bool {
        let position = self
            .inner
            .members
            .borrow()
            .iter()
            .position(|m| m.wrapper.ptr_eq(wrapper));
        position.and_then(|index| self.remove_at(index)).is_some()
    }

    /// Remove and return the member at `index`.
    pub fn remove_at(&self, index: usize) -> Option<EntityWrapper<C>> {
        if index >= self.len() {
            return None;
        }
        tracing::debug!(message = "collection.remove", entity = C::NAME, index);
        let removed = self.edit(|members| members.remove(index));
        removed.wrapper.parent_link().detach();
        Some(removed.wrapper)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.members.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.members.borrow().is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<EntityWrapper<C>> {
        self.inner
            .members
            .borrow()
            .get(index)
            .map(|m| m.wrapper.clone())
    }

    #[must_use]
    pub fn contains(&self, wrapper: &EntityWrapper<C>) -> bool {
        self.inner
            .members
            .borrow()
            .iter()
            .any(|m| m.wrapper.ptr_eq(wrapper))
    }

    /// Current members, in order.
    #[must_use]
    pub fn items(&self) -> Vec<EntityWrapper<C>> {
        self.inner.wrappers()
    }

    /// Unwrapped current members, in order.
    #[must_use]
    pub fn models(&self) -> Vec<Shared<C>> {
        self.inner
            .members
            .borrow()
            .iter()
            .map(|m| m.wrapper.model())
            .collect()
    }

    // ------------------------------------------------------------------
    // Change sets
    // ------------------------------------------------------------------

    /// Members not in the baseline.
    #[must_use]
    pub fn added_items(&self) -> Vec<EntityWrapper<C>> {
        let baseline = self.inner.baseline.borrow();
        self.items()
            .into_iter()
            .filter(|w| !baseline.iter().any(|b| b.ptr_eq(w)))
            .collect()
    }

    /// Baseline members no longer present.
    #[must_use]
    pub fn removed_items(&self) -> Vec<EntityWrapper<C>> {
        self.inner
            .baseline
            .borrow()
            .iter()
            .filter(|b| !self.contains(b))
            .cloned()
            .collect()
    }

    /// Baseline members still present with pending changes.
    #[must_use]
    pub fn modified_items(&self) -> Vec<EntityWrapper<C>> {
        let baseline = self.inner.baseline.borrow();
        self.items()
            .into_iter()
            .filter(|w| w.is_changed() && baseline.iter().any(|b| b.ptr_eq(w)))
            .collect()
    }

    // ------------------------------------------------------------------
    // Checkpoint
    // ------------------------------------------------------------------

    /// Membership differs from the baseline, or any member changed.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.inner.is_changed()
    }

    /// Accept every member, then make the current membership the baseline.
    pub fn accept_changes(&self) {
        self.inner.accept_changes();
    }

    /// Restore the baseline membership, sync the backing sequence, then
    /// reject every restored member.
    pub fn reject_changes(&self) {
        self.inner.reject_changes();
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.is_valid()
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
}

impl<C: Entity> RevertibleChangeTracking for CollectionTracker<C> {
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
