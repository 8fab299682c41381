//! Format classification of media locators.
//!
//! [`classify`] is a pure function of the locator text and an optional
//! server-reported content type. The only side effect associated with
//! classification, the content-type probe for `.mp4` locators, lives in
//! [`crate::probe`] and is scheduled by the session.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use vc_core::{ContainerKind, Error, Result};

// ---------------------------------------------------------------------------
// MediaLocator
// ---------------------------------------------------------------------------

/// URL of a media resource, absolute or rooted at the backend origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MediaLocator(String);

impl MediaLocator {
    /// Normalize a raw locator. Relative locators get a leading `/`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("media locator is empty".into()));
        }

        if has_http_scheme(trimmed) || trimmed.starts_with('/') {
            Ok(Self(trimmed.to_string()))
        } else {
            Ok(Self(format!("/{trimmed}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the locator carries its own `http(s)` origin.
    pub fn is_absolute(&self) -> bool {
        has_http_scheme(&self.0)
    }

    /// The locator without its query string or fragment.
    pub fn path(&self) -> &str {
        let end = self.0.find(['?', '#']).unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// The path with its final extension removed, used to derive alternate
    /// sources that share the same file name.
    pub fn base_name(&self) -> &str {
        let path = self.path();
        let file_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
        match path[file_start..].rfind('.') {
            Some(dot) => &path[..file_start + dot],
            None => path,
        }
    }
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl FromStr for MediaLocator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MediaLocator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// ContentTypeHint
// ---------------------------------------------------------------------------

/// `Content-Type` reported by the server for a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeHint(String);

impl ContentTypeHint {
    pub fn new(content_type: impl AsRef<str>) -> Self {
        Self(content_type.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Container the content type positively identifies, if any.
    pub fn container(&self) -> Option<ContainerKind> {
        if self.0.contains("mp2t") {
            Some(ContainerKind::MpegTs)
        } else if self.0.contains("mpegurl") {
            Some(ContainerKind::Hls)
        } else if self.0.contains("dash+xml") {
            Some(ContainerKind::Dash)
        } else if self.0.starts_with("video/mp4") {
            Some(ContainerKind::Mp4)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// FormatClassification
// ---------------------------------------------------------------------------

/// Container kind of a locator together with the flags derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatClassification {
    container: ContainerKind,
    mime_type: &'static str,
    is_adaptive_streaming: bool,
    is_transport_stream: bool,
}

impl FormatClassification {
    pub fn for_container(container: ContainerKind) -> Self {
        Self {
            container,
            mime_type: container.mime_type(),
            is_adaptive_streaming: container.is_adaptive_streaming(),
            is_transport_stream: container.is_transport_stream(),
        }
    }

    /// Classification forced to MPEG-TS, used as the last-resort retry of
    /// plain containers.
    pub fn transport_stream() -> Self {
        Self::for_container(ContainerKind::MpegTs)
    }

    pub fn container(&self) -> ContainerKind {
        self.container
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn is_adaptive_streaming(&self) -> bool {
        self.is_adaptive_streaming
    }

    pub fn is_transport_stream(&self) -> bool {
        self.is_transport_stream
    }
}

impl fmt::Display for FormatClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.container, self.mime_type)
    }
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

/// Plain containers recognized by path suffix, checked in order.
const SUFFIX_RULES: &[(&str, ContainerKind)] = &[
    (".webm", ContainerKind::Webm),
    (".ogg", ContainerKind::Ogg),
    (".ogv", ContainerKind::Ogg),
    (".mov", ContainerKind::Quicktime),
    (".flv", ContainerKind::Flv),
    (".3gp", ContainerKind::ThreeGp),
    (".wmv", ContainerKind::Wmv),
    (".avi", ContainerKind::Avi),
];

/// Classify a locator, optionally refined by a server content type.
///
/// First match wins: HLS, DASH and MPEG-TS markers (suffix, `.ext?` or a
/// `=ext` query value), then plain container suffixes, then the MP4 default.
/// A hint naming TS, HLS or DASH overrides the locator; a `video/mp4` hint
/// only confirms the default.
pub fn classify(locator: &MediaLocator, hint: Option<&ContentTypeHint>) -> FormatClassification {
    let by_locator = classify_locator(locator);

    match hint.and_then(ContentTypeHint::container) {
        Some(ContainerKind::Mp4) if by_locator.container == ContainerKind::UnknownDefaultMp4 => {
            FormatClassification::for_container(ContainerKind::Mp4)
        }
        Some(kind @ (ContainerKind::MpegTs | ContainerKind::Hls | ContainerKind::Dash)) => {
            FormatClassification::for_container(kind)
        }
        _ => by_locator,
    }
}

/// Whether a content-type probe should be scheduled for this locator.
pub fn needs_probe(locator: &MediaLocator) -> bool {
    locator.path().to_ascii_lowercase().ends_with(".mp4")
}

fn classify_locator(locator: &MediaLocator) -> FormatClassification {
    let lower = locator.as_str().to_ascii_lowercase();
    let path = locator.path().to_ascii_lowercase();

    for (ext, kind) in [
        ("m3u8", ContainerKind::Hls),
        ("mpd", ContainerKind::Dash),
        ("ts", ContainerKind::MpegTs),
    ] {
        if has_marker(&lower, &path, ext) {
            return FormatClassification::for_container(kind);
        }
    }

    SUFFIX_RULES
        .iter()
        .find(|(suffix, _)| path.ends_with(suffix))
        .map(|(_, kind)| FormatClassification::for_container(*kind))
        .unwrap_or_else(|| FormatClassification::for_container(ContainerKind::UnknownDefaultMp4))
}

/// `lower` is the whole lowercased locator, `path` the lowercased locator
/// without query or fragment.
fn has_marker(lower: &str, path: &str, ext: &str) -> bool {
    let dotted = format!(".{ext}");
    if path.ends_with(&dotted) || lower.contains(&format!("{dotted}?")) {
        return true;
    }

    // `=ext` only counts as a whole query value.
    let value = format!("={ext}");
    lower.match_indices(&value).any(|(at, _)| {
        matches!(
            lower[at + value.len()..].chars().next(),
            None | Some('&') | Some('#')
        )
    })
}
