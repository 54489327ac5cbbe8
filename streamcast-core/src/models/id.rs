use serde::{Deserialize, Serialize};

/// Declare a transparent string identifier newtype.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub const fn from_string(id: String) -> Self {
                Self(id)
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Owning user of kiosks, servers, channels and cameras
    UserId
);
string_id!(
    /// Locally-managed display client
    KioskId
);
string_id!(
    /// Stored channel id (not the provider's `externalId`)
    ChannelId
);
string_id!(
    /// Standalone (RTSP) camera id
    CameraId
);
string_id!(
    /// Live-TV server configuration id
    ServerId
);
