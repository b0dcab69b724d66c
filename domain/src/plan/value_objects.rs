//! Identifiers for sessions, plans, steps and users.
//!
//! Every identifier is an opaque string newtype. Generated identifiers are
//! UUID v4; identifiers supplied by clients (session ids, user principal
//! ids) are accepted as-is.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl<T: Into<String>> From<T> for $name {
            fn from(s: T) -> Self {
                Self::new(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Identifies a conversation session; all plans of a session share it.
    SessionId
);
string_id!(
    /// Identifies a plan document.
    PlanId
);
string_id!(
    /// Identifies a step document.
    StepId
);
string_id!(
    /// Identifies the authenticated user. Also the storage partition key.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        let a = PlanId::generate();
        let b = PlanId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_serializes_transparently() {
        let id = StepId::new("step-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"step-1\"");
        let back: StepId = serde_json::from_str("\"step-1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_empty_id() {
        assert!(PlanId::default().is_empty());
        assert!(!SessionId::from("s").is_empty());
    }
}
