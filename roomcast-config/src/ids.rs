//! Identity types for model entities
//!
//! Every category has its own id type so a speaker id can never be passed
//! where a room id is expected. Ids order lexically, which is what gives
//! compiled output its stable order.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Macro to generate an id newtype and its common implementations
macro_rules! impl_id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
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

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name::new(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_id_type!(
    /// Identifier of a multichannel amplifier, e.g. `amp1`
    AmplifierId
);

impl_id_type!(
    /// Identifier of a capture input
    InputId
);

impl_id_type!(
    /// Identifier of one physical speaker
    SpeakerId
);

impl_id_type!(
    /// Identifier of a room; also the suffix of its device name
    RoomId
);

impl_id_type!(
    /// Identifier of a zone
    ZoneId
);

impl_id_type!(
    /// Identifier of a stream in the model (not the server-side stream name)
    StreamId
);
