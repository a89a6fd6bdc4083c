//! Newtype IDs for type-safe entity references.
//!
//! Every identifier in BarBuddy is a string: venue and special ids come from
//! the bundled fixture, user ids are the `#NameNNNNN` handles generated at
//! onboarding, and chat/photo ids are generated on the device. Use the
//! `define_id!` macro to create wrappers that prevent mixing them up.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>`, `From<String>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use barbuddy_core::define_id;
/// define_id!(VenueId);
/// define_id!(PhotoId);
///
/// let venue = VenueId::new("1");
/// let photo = PhotoId::new("1");
///
/// // These are different types, so this won't compile:
/// // let _: VenueId = photo;
/// assert_eq!(venue.as_str(), photo.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(UserId);
define_id!(VenueId);
define_id!(SpecialId);
define_id!(PhotoId);
define_id!(TaskId);
define_id!(AchievementId);
define_id!(ChatSessionId);
define_id!(ChatMessageId);

impl UserId {
    /// Placeholder id used before onboarding assigns a real handle.
    pub const DEFAULT: &'static str = "default";

    /// Returns `true` once the user has a real, shareable handle.
    ///
    /// Remote sync is skipped for the placeholder id.
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        !self.0.is_empty() && self.0 != Self::DEFAULT
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_id_is_unassigned() {
        assert!(!UserId::default().is_assigned());
        assert!(!UserId::new("").is_assigned());
        assert!(UserId::new("#BarBuddy12345").is_assigned());
    }

    #[test]
    fn test_serde_transparent() {
        let id = VenueId::new("3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"3\"");
        let parsed: VenueId = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_display() {
        assert_eq!(SpecialId::from("1-2").to_string(), "1-2");
    }
}
