use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse an id from untrusted input (e.g. a wire message).
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(DomainError::invalid_id(concat!(
                        $label,
                        " must not be empty"
                    )));
                }
                Ok(Self(value))
            }

            /// Wrap a value that is already known to be valid.
            pub fn from_trusted(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Session-scoped ids are supplied by clients, so they are strings with
// boundary validation rather than generated UUIDs.
define_id!(SessionId, "session id");
define_id!(ParticipantId, "participant id");

// Board space ids come from the board catalog (e.g. "go", "elm-street").
define_id!(SpaceId, "space id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_id() {
        assert!(SessionId::new("").is_err());
        assert!(ParticipantId::new("   ").is_err());
    }

    #[test]
    fn test_accepts_and_displays_id() {
        let id = SessionId::new("game-42").expect("valid id");
        assert_eq!(id.as_str(), "game-42");
        assert_eq!(id.to_string(), "game-42");
    }

    #[test]
    fn test_serializes_as_bare_string() {
        let id = SpaceId::from_trusted("go");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"go\"");
    }
}
