//! Media-domain enums for container kinds, playback strategies and error
//! classes.
//!
//! All enums serialize in snake_case and implement `Display` manually for
//! consistent string representation.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ContainerKind
// ---------------------------------------------------------------------------

/// Media wrapping format of a locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Hls,
    Dash,
    MpegTs,
    Mp4,
    Webm,
    Ogg,
    Quicktime,
    Flv,
    ThreeGp,
    Wmv,
    Avi,
    /// No recognized marker; played as MP4.
    UnknownDefaultMp4,
}

impl ContainerKind {
    /// MIME type advertised to the playback surface for this container.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Hls => "application/vnd.apple.mpegurl",
            Self::Dash => "application/dash+xml",
            Self::MpegTs => "video/mp2t",
            Self::Mp4 | Self::UnknownDefaultMp4 => "video/mp4",
            Self::Webm => "video/webm",
            Self::Ogg => "video/ogg",
            Self::Quicktime => "video/quicktime",
            Self::Flv => "video/x-flv",
            Self::ThreeGp => "video/3gpp",
            Self::Wmv => "video/x-ms-wmv",
            Self::Avi => "video/x-msvideo",
        }
    }

    /// Segmented, bitrate-switching delivery (HLS, DASH).
    pub fn is_adaptive_streaming(self) -> bool {
        matches!(self, Self::Hls | Self::Dash)
    }

    /// MPEG transport stream.
    pub fn is_transport_stream(self) -> bool {
        matches!(self, Self::MpegTs)
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hls => write!(f, "hls"),
            Self::Dash => write!(f, "dash"),
            Self::MpegTs => write!(f, "mpeg_ts"),
            Self::Mp4 => write!(f, "mp4"),
            Self::Webm => write!(f, "webm"),
            Self::Ogg => write!(f, "ogg"),
            Self::Quicktime => write!(f, "quicktime"),
            Self::Flv => write!(f, "flv"),
            Self::ThreeGp => write!(f, "three_gp"),
            Self::Wmv => write!(f, "wmv"),
            Self::Avi => write!(f, "avi"),
            Self::UnknownDefaultMp4 => write!(f, "unknown_default_mp4"),
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackStrategy
// ---------------------------------------------------------------------------

/// How a locator is handed to the playback surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStrategy {
    /// Native media element, classified MIME on the primary source plus
    /// speculative alternates.
    NativeElementDirect,
    /// Adaptive-streaming engine attached to the media element.
    AdaptiveStreamingLibrary,
    /// Native media element with a single source and an explicit MIME type.
    NativeElementWithExplicitMimeType,
}

impl PlaybackStrategy {
    /// Whether this strategy drives the surface through an adaptive engine.
    pub fn uses_engine(self) -> bool {
        matches!(self, Self::AdaptiveStreamingLibrary)
    }
}

impl fmt::Display for PlaybackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NativeElementDirect => write!(f, "native_direct"),
            Self::AdaptiveStreamingLibrary => write!(f, "adaptive_engine"),
            Self::NativeElementWithExplicitMimeType => write!(f, "native_explicit_mime"),
        }
    }
}

// ---------------------------------------------------------------------------
// AdaptiveErrorClass
// ---------------------------------------------------------------------------

/// Error class reported by an adaptive-streaming engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdaptiveErrorClass {
    Network,
    Media,
    Other,
}

impl fmt::Display for AdaptiveErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Media => write!(f, "media"),
            Self::Other => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_flags() {
        assert!(ContainerKind::Hls.is_adaptive_streaming());
        assert!(ContainerKind::Dash.is_adaptive_streaming());
        assert!(!ContainerKind::MpegTs.is_adaptive_streaming());
        assert!(ContainerKind::MpegTs.is_transport_stream());
        assert!(!ContainerKind::UnknownDefaultMp4.is_transport_stream());
    }

    #[test]
    fn container_mime_types() {
        assert_eq!(ContainerKind::Hls.mime_type(), "application/vnd.apple.mpegurl");
        assert_eq!(ContainerKind::UnknownDefaultMp4.mime_type(), "video/mp4");
        assert_eq!(ContainerKind::ThreeGp.mime_type(), "video/3gpp");
        assert_eq!(ContainerKind::Avi.mime_type(), "video/x-msvideo");
    }

    #[test]
    fn container_display_matches_serde() {
        for kind in [
            ContainerKind::Hls,
            ContainerKind::MpegTs,
            ContainerKind::ThreeGp,
            ContainerKind::UnknownDefaultMp4,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn strategy_display() {
        assert_eq!(PlaybackStrategy::NativeElementDirect.to_string(), "native_direct");
        assert_eq!(
            PlaybackStrategy::NativeElementWithExplicitMimeType.to_string(),
            "native_explicit_mime"
        );
        assert!(PlaybackStrategy::AdaptiveStreamingLibrary.uses_engine());
        assert!(!PlaybackStrategy::NativeElementDirect.uses_engine());
    }

    #[test]
    fn error_class_serde() {
        let back: AdaptiveErrorClass = serde_json::from_str(r#""media""#).unwrap();
        assert_eq!(back, AdaptiveErrorClass::Media);
    }
}
