#![forbid(unsafe_code)]

//! Core: entity wrappers, collection trackers, and change notification.
//!
//! A wrapper owns a shared handle to a plain entity, proxies field reads and
//! writes, and keeps a ledger of original values for every field that
//! currently differs from the last checkpoint. Nested wrappers and collection
//! trackers register with their parent so that "something below me changed"
//! surfaces as a single aggregate flag, and so that accept/reject walk the
//! whole graph in one call.
//!
//! # Invariants
//!
//! 1. A field is in the ledger iff its live value differs from its value at
//!    the last checkpoint.
//! 2. `is_changed` is derived on every call (ledger non-empty OR any tracked
//!    child changed), never cached.
//! 3. A tracker has at most one parent.
//! 4. After any membership edit, a collection's backing sequence equals the
//!    unwrapped current membership, in order.

pub mod collection;
pub mod entity;
pub mod error;
pub mod notify;
pub mod tracking;
pub mod validation;
pub mod value;
pub mod wrapper;

#[cfg(test)]
pub(crate) mod fixtures;

pub use collection::CollectionTracker;
pub use entity::{Entity, Field, Shared, shared};
pub use error::{Result, TrackError};
pub use notify::{Listener, Notifier, Subscription, Topic};
pub use tracking::{ParentLink, RevertibleChangeTracking, TrackerId};
pub use validation::ValidationFailure;
pub use value::{Value, ValueError};
pub use wrapper::EntityWrapper;
