//! The revertible change-tracking contract shared by wrappers and collection
//! trackers, and the single upward link each of them may hold.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::TrackError;
use crate::notify::Notifier;

/// Identity of a tracker: the address of its shared state.
///
/// Cloned handles to the same wrapper share one `TrackerId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackerId(usize);

impl TrackerId {
    pub(crate) fn of<T>(rc: &Rc<T>) -> Self {
        Self(Rc::as_ptr(rc).cast::<()>() as usize)
    }
}

/// Something whose pending state can be inspected, committed, or rolled back.
///
/// A parent keeps its tracked children as `Rc<dyn RevertibleChangeTracking>`
/// and listens for [`Topic::IsChanged`](crate::Topic::IsChanged) on each
/// child's notifier.
pub trait RevertibleChangeTracking {
    fn tracker_id(&self) -> TrackerId;

    /// Whether anything is pending since the last checkpoint.
    fn is_changed(&self) -> bool;

    /// Whether this tracker and everything below it validate.
    fn is_valid(&self) -> bool;

    /// Advance the checkpoint to the current state.
    fn accept_changes(&self);

    /// Restore the state at the last checkpoint.
    fn reject_changes(&self);

    fn notifier(&self) -> &Notifier;

    fn parent_link(&self) -> &ParentLink;
}

/// The at-most-one upward link of a tracker.
///
/// Holding one parent at a time keeps notification ownership a tree: a
/// tracker registered under two parents would report every flip twice.
/// Outside this crate the link is read-only; only registration and
/// collection membership move it.
///
/// ```compile_fail
/// use revtrack_core::{EntityWrapper, RevertibleChangeTracking};
/// # use revtrack_core::{Entity, TrackError, Value};
/// # #[derive(Debug)]
/// # struct Unit;
/// # impl Entity for Unit {
/// #     const NAME: &'static str = "Unit";
/// #     const FIELDS: &'static [&'static str] = &[];
/// #     fn read_field(&self, _: &str) -> Option<Value> { None }
/// #     fn write_field(&mut self, field: &str, _: Value) -> Result<(), TrackError> {
/// #         Err(TrackError::field_not_found(Self::NAME, field))
/// #     }
/// # }
/// let child = EntityWrapper::from_entity(Unit);
/// child.parent_link().detach();
/// ```
#[derive(Debug, Default)]
pub struct ParentLink {
    parent: Cell<Option<TrackerId>>,
}

impl ParentLink {
    /// Link to `parent`. Returns `Ok(false)` when already linked to it.
    pub(crate) fn attach(&self, parent: TrackerId, entity: &'static str) -> Result<bool, TrackError> {
        match self.parent.get() {
            Some(current) if current == parent => Ok(false),
            Some(_) => Err(TrackError::AlreadyRegistered { entity }),
            None => {
                self.parent.set(Some(parent));
                Ok(true)
            }
        }
    }

    pub(crate) fn detach(&self) {
        self.parent.set(None);
    }

    #[must_use]
    pub fn parent(&self) -> Option<TrackerId> {
        self.parent.get()
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.parent.get().is_some()
    }
}
