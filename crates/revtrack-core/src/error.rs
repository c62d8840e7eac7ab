use thiserror::Error;

use crate::value::ValueError;

pub type Result<T> = std::result::Result<T, TrackError>;

/// Construction and contract violations. None of these are retried
/// internally; they surface to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    #[error("cannot wrap an absent {entity} entity")]
    NullEntity { entity: &'static str },

    #[error("{entity}.{field} must be present to be tracked")]
    MissingNestedData {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity} has no field named `{field}`")]
    FieldNotFound { entity: &'static str, field: String },

    #[error("{entity}.{field}: {source}")]
    TypeMismatch {
        entity: &'static str,
        field: &'static str,
        source: ValueError,
    },

    #[error("{entity} tracker is already registered with another parent")]
    AlreadyRegistered { entity: &'static str },
}

impl TrackError {
    #[must_use]
    pub fn field_not_found(entity: &'static str, field: &str) -> Self {
        Self::FieldNotFound {
            entity,
            field: field.to_owned(),
        }
    }

    #[must_use]
    pub const fn type_mismatch(
        entity: &'static str,
        field: &'static str,
        source: ValueError,
    ) -> Self {
        Self::TypeMismatch {
            entity,
            field,
            source,
        }
    }
}
