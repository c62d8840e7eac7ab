#![forbid(unsafe_code)]

//! Revertible change tracking for plain entities.
//!
//! Wrap an entity in an [`EntityWrapper`] to get per-field original values,
//! `is_changed`, accept/reject, and change notification. Nested objects and
//! nested collections register with their parent so the whole graph answers
//! "did anything change?" and can be rolled back in one call.
//!
//! ```ignore
//! use revtrack::prelude::*;
//!
//! #[derive(Debug, Clone, Entity)]
//! struct Address {
//!     #[track(required = "City is required")]
//!     city: String,
//! }
//!
//! let address = EntityWrapper::from_entity(Address { city: "Berlin".into() });
//! address.assign(Address::CITY, "Munich".to_owned());
//! assert!(address.is_changed());
//! address.reject_changes();
//! assert_eq!(address.value(Address::CITY), "Berlin");
//! ```

pub use revtrack_core::{
    CollectionTracker, Entity, EntityWrapper, Field, Listener, Notifier, ParentLink, Result,
    RevertibleChangeTracking, Shared, Subscription, Topic, TrackError, TrackerId,
    ValidationFailure, Value, ValueError, shared,
};
pub use revtrack_derive::Entity;

/// Rule checks used by `#[track(required)]` and `#[track(email)]`.
pub mod validation {
    pub use revtrack_core::validation::{RuleInput, ValidationFailure, email, required};
}

/// Everything a typical consumer imports.
pub mod prelude {
    pub use crate::{
        CollectionTracker, Entity, EntityWrapper, Field, RevertibleChangeTracking, Shared,
        Subscription, Topic, TrackError, ValidationFailure, Value, shared,
    };
}
