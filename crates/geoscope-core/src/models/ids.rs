//! Identifier newtypes.
//!
//! All identifiers wrap a UUID, serialize as its string form, and order by the
//! UUID bytes so result sets can be sorted deterministically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::GeoscopeError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = GeoscopeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self).map_err(|e| {
                    GeoscopeError::validation($entity, format!("invalid identifier '{}': {}", s, e))
                })
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a dataset
    DatasetId,
    "dataset_id"
);

uuid_id!(
    /// Unique identifier for a spatial feature
    FeatureId,
    "feature_id"
);

uuid_id!(
    /// Unique identifier for an analysis task
    TaskId,
    "task_id"
);

uuid_id!(
    /// Reference to the project that owns a dataset
    ProjectId,
    "project_id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        let id = DatasetId::new();
        let parsed: DatasetId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<TaskId>().unwrap_err();
        assert!(matches!(err, GeoscopeError::Validation { ref field, .. } if field == "task_id"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = FeatureId(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
