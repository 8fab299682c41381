//! Playback failure taxonomy.
//!
//! These are not [`vc_core::Error`]s: a playback failure is recorded in the
//! session and advances the fallback chain instead of propagating.

use serde::Serialize;
use vc_core::AdaptiveErrorClass;

/// Why an attempt (or the whole chain) failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackError {
    /// Native code 1.
    #[error("Playback was aborted")]
    Aborted,

    /// Native code 2.
    #[error("A network error caused the video download to fail")]
    Network,

    /// Native code 3.
    #[error("The video could not be decoded; the format may be unsupported")]
    Decode,

    /// Native code 4.
    #[error("The video format is not supported or the address is invalid")]
    FormatUnsupported,

    /// A native code outside 1-4.
    #[error("Unknown error ({code})")]
    Unknown { code: u16 },

    /// A fatal adaptive-engine error that was not recovered in place.
    #[error("Streaming engine failed ({class}){}", .details.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    EngineFatal {
        class: AdaptiveErrorClass,
        details: Option<String>,
    },
}

impl PlaybackError {
    /// Map a native media-element error code.
    pub fn from_native_code(code: u16) -> Self {
        match code {
            1 => Self::Aborted,
            2 => Self::Network,
            3 => Self::Decode,
            4 => Self::FormatUnsupported,
            code => Self::Unknown { code },
        }
    }

    /// Native code, when the error came from the media element.
    pub fn native_code(&self) -> Option<u16> {
        match self {
            Self::Aborted => Some(1),
            Self::Network => Some(2),
            Self::Decode => Some(3),
            Self::FormatUnsupported => Some(4),
            Self::Unknown { code } => Some(*code),
            Self::EngineFatal { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_codes_map_to_variants() {
        assert_eq!(PlaybackError::from_native_code(1), PlaybackError::Aborted);
        assert_eq!(PlaybackError::from_native_code(2), PlaybackError::Network);
        assert_eq!(PlaybackError::from_native_code(3), PlaybackError::Decode);
        assert_eq!(
            PlaybackError::from_native_code(4),
            PlaybackError::FormatUnsupported
        );
        assert_eq!(
            PlaybackError::from_native_code(9),
            PlaybackError::Unknown { code: 9 }
        );
        assert_eq!(PlaybackError::from_native_code(9).native_code(), Some(9));
    }

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(
            PlaybackError::Network.to_string(),
            "A network error caused the video download to fail"
        );
        assert_eq!(
            PlaybackError::Unknown { code: 7 }.to_string(),
            "Unknown error (7)"
        );
        let fatal = PlaybackError::EngineFatal {
            class: AdaptiveErrorClass::Other,
            details: Some("manifestIncompatibleCodecsError".into()),
        };
        assert_eq!(
            fatal.to_string(),
            "Streaming engine failed (other): manifestIncompatibleCodecsError"
        );
        assert_eq!(fatal.native_code(), None);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(PlaybackError::Decode).unwrap();
        assert_eq!(json["kind"], "decode");
    }
}
