//! Identifiers for PathTrack entities.
//!
//! Phase and task ids are owned by the curriculum provider, so they are
//! opaque strings rather than generated values.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw id.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_id!(
    /// Identifier of a curriculum phase.
    PhaseId
);

string_id!(
    /// Identifier of a task within a phase.
    TaskId
);

string_id!(
    /// Identifier of an authenticated user on the remote progress service.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = PhaseId::new("phase-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"phase-1\"");

        let back: PhaseId = serde_json::from_str("\"phase-1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_map_lookup_by_str() {
        let mut map = BTreeMap::new();
        map.insert(TaskId::from("t1"), 1);
        assert_eq!(map.get("t1"), Some(&1));
        assert!(map.get("t2").is_none());
    }
}
