#![forbid(unsafe_code)]

//! The entity access contract.
//!
//! An [`Entity`] is a plain record that can read and write its tracked fields
//! by name. Implementations are usually generated by `#[derive(Entity)]`,
//! which also emits one typed [`Field`] accessor per tracked field; the
//! generated table is a `match` over field names, built at compile time.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::TrackError;
use crate::validation::ValidationFailure;
use crate::value::Value;

/// A plain entity shared between its wrapper and external consumers.
///
/// Wrappers write through this handle, so anyone holding the same `Shared`
/// always observes the live value.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wrap a plain value in a [`Shared`] handle.
#[must_use]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Read/write access to an entity's tracked scalar fields by name.
///
/// Nested complex objects and nested collections are not part of the field
/// table; they are tracked through their own registered wrappers.
pub trait Entity: 'static {
    /// Type name used in errors and log records.
    const NAME: &'static str;

    /// Names of the tracked scalar fields, in declaration order.
    const FIELDS: &'static [&'static str];

    /// Current value of `field`, or `None` if the name is not tracked.
    fn read_field(&self, field: &str) -> Option<Value>;

    /// Overwrite `field` with `value`.
    ///
    /// Fails with [`TrackError::FieldNotFound`] for unknown names and
    /// [`TrackError::TypeMismatch`] when `value` has the wrong kind.
    fn write_field(&mut self, field: &str, value: Value) -> Result<(), TrackError>;

    /// Structural validation failures derived from current field values.
    fn validate(&self) -> Vec<ValidationFailure> {
        Vec::new()
    }

    /// Resolve a field name to its static key.
    #[must_use]
    fn field_key(field: &str) -> Option<&'static str> {
        Self::FIELDS.iter().copied().find(|name| *name == field)
    }
}

/// Typed accessor for one tracked field of `E`.
///
/// Gives the wrapper a compile-time-checked path next to the by-name one:
/// `wrapper.assign(Address::CITY, "Munich".to_owned())` cannot name a missing
/// field or pass the wrong type.
pub struct Field<E, V> {
    name: &'static str,
    get: fn(&E) -> V,
    set: fn(&mut E, V),
}

impl<E, V> Field<E, V> {
    #[must_use]
    pub const fn new(name: &'static str, get: fn(&E) -> V, set: fn(&mut E, V)) -> Self {
        Self { name, get, set }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Read the field off a plain entity.
    pub fn read(&self, entity: &E) -> V {
        (self.get)(entity)
    }

    /// Write the field on a plain entity, bypassing any tracking.
    pub fn write(&self, entity: &mut E, value: V) {
        (self.set)(entity, value);
    }
}

impl<E, V> Clone for Field<E, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, V> Copy for Field<E, V> {}

impl<E, V> fmt::Debug for Field<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field").field("name", &self.name).finish()
    }
}
