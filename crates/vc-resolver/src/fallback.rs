//! Fallback strategy selection.
//!
//! [`FallbackController`] maps a classification to the first strategy to try,
//! the strategy that follows a failure, and the reaction to adaptive-engine
//! errors. It holds no per-session state.

use serde::Serialize;

use vc_core::config::PlaybackConfig;
use vc_core::{AdaptiveErrorClass, PlaybackStrategy};

use crate::classifier::{FormatClassification, MediaLocator};

// ---------------------------------------------------------------------------
// PlaybackEnvironment
// ---------------------------------------------------------------------------

/// What the host runtime can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackEnvironment {
    /// An adaptive-streaming engine implementation is loaded.
    pub engine_available: bool,
    /// The loaded engine reports support for this runtime.
    pub engine_supported: bool,
    /// The native element plays adaptive manifests on its own.
    pub native_adaptive: bool,
}

impl PlaybackEnvironment {
    /// Whether the adaptive engine can be used at all.
    pub fn engine_usable(&self) -> bool {
        self.engine_available && self.engine_supported
    }
}

impl Default for PlaybackEnvironment {
    fn default() -> Self {
        Self {
            engine_available: true,
            engine_supported: true,
            native_adaptive: false,
        }
    }
}

impl From<&PlaybackConfig> for PlaybackEnvironment {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            engine_available: config.engine_available,
            engine_supported: config.engine_supported,
            native_adaptive: config.native_adaptive,
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy steps
// ---------------------------------------------------------------------------

/// Result of advancing the fallback chain after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Try `strategy`, with `classification` replacing the current one.
    Attempt {
        strategy: PlaybackStrategy,
        classification: FormatClassification,
    },
    /// Nothing left to try.
    Exhausted,
}

/// An error reported by the adaptive engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub class: AdaptiveErrorClass,
    pub fatal: bool,
    pub details: Option<String>,
}

impl EngineError {
    pub fn fatal(class: AdaptiveErrorClass) -> Self {
        Self {
            class,
            fatal: true,
            details: None,
        }
    }

    pub fn non_fatal(class: AdaptiveErrorClass, details: impl Into<String>) -> Self {
        Self {
            class,
            fatal: false,
            details: Some(details.into()),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Reaction to an adaptive-engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAction {
    /// Log only.
    Ignore,
    /// Ask the engine to reload its source in place.
    ReloadSource,
    /// Ask the engine to recover from a media error in place.
    RecoverMediaError,
    /// Tear the engine down and advance the fallback chain.
    DestroyAndAdvance,
}

// ---------------------------------------------------------------------------
// FallbackController
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackController {
    env: PlaybackEnvironment,
}

impl FallbackController {
    pub fn new(env: PlaybackEnvironment) -> Self {
        Self { env }
    }

    pub fn environment(&self) -> PlaybackEnvironment {
        self.env
    }

    /// Strategy to attempt first for a freshly classified locator.
    pub fn first_strategy(&self, classification: &FormatClassification) -> PlaybackStrategy {
        if classification.is_transport_stream() {
            return PlaybackStrategy::NativeElementWithExplicitMimeType;
        }

        if classification.is_adaptive_streaming() {
            if self.env.engine_usable() {
                return PlaybackStrategy::AdaptiveStreamingLibrary;
            }
            if !self.env.native_adaptive {
                tracing::warn!(
                    container = %classification.container(),
                    "no adaptive engine and no native adaptive support; trying native element anyway"
                );
            }
            return PlaybackStrategy::NativeElementWithExplicitMimeType;
        }

        PlaybackStrategy::NativeElementDirect
    }

    /// Strategy to attempt after `failed` did not play.
    pub fn next_strategy(
        &self,
        classification: &FormatClassification,
        failed: PlaybackStrategy,
    ) -> NextStep {
        match failed {
            PlaybackStrategy::NativeElementWithExplicitMimeType => NextStep::Exhausted,
            _ if classification.is_transport_stream() => NextStep::Exhausted,
            PlaybackStrategy::AdaptiveStreamingLibrary => NextStep::Attempt {
                strategy: PlaybackStrategy::NativeElementWithExplicitMimeType,
                classification: *classification,
            },
            PlaybackStrategy::NativeElementDirect if classification.is_adaptive_streaming() => {
                NextStep::Attempt {
                    strategy: PlaybackStrategy::NativeElementWithExplicitMimeType,
                    classification: *classification,
                }
            }
            // Misnamed transport streams are common; retry as TS.
            PlaybackStrategy::NativeElementDirect => NextStep::Attempt {
                strategy: PlaybackStrategy::NativeElementWithExplicitMimeType,
                classification: FormatClassification::transport_stream(),
            },
        }
    }

    /// Reaction to an error reported by the adaptive engine.
    pub fn on_engine_error(&self, error: &EngineError) -> EngineAction {
        if !error.fatal {
            return EngineAction::Ignore;
        }

        match error.class {
            AdaptiveErrorClass::Network => EngineAction::ReloadSource,
            AdaptiveErrorClass::Media => EngineAction::RecoverMediaError,
            AdaptiveErrorClass::Other => EngineAction::DestroyAndAdvance,
        }
    }

    /// The whole chain for a classification, assuming every attempt fails.
    pub fn chain(&self, classification: &FormatClassification) -> Vec<(PlaybackStrategy, FormatClassification)> {
        let mut current = *classification;
        let mut strategy = self.first_strategy(&current);
        let mut chain = vec![(strategy, current)];

        while let NextStep::Attempt {
            strategy: next,
            classification,
        } = self.next_strategy(&current, strategy)
        {
            strategy = next;
            current = classification;
            chain.push((strategy, current));
        }

        chain
    }
}

// ---------------------------------------------------------------------------
// SourcePlan
// ---------------------------------------------------------------------------

/// One `<source>` slot of the media element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaSource {
    pub url: String,
    pub mime_type: &'static str,
}

/// Sources attached to the native element for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcePlan {
    pub primary: MediaSource,
    /// Same base name in other containers, for browser-negotiated selection.
    pub alternates: Vec<MediaSource>,
}

impl SourcePlan {
    /// Build the source slots for a native strategy.
    ///
    /// Alternates are only offered for plain containers attempted directly;
    /// the explicit-MIME strategy always attaches a single source.
    pub fn build(
        locator: &MediaLocator,
        classification: &FormatClassification,
        strategy: PlaybackStrategy,
        speculative_alternates: bool,
    ) -> Self {
        let primary = MediaSource {
            url: locator.as_str().to_string(),
            mime_type: classification.mime_type(),
        };

        let plain = !classification.is_adaptive_streaming() && !classification.is_transport_stream();
        let alternates = if speculative_alternates
            && plain
            && strategy == PlaybackStrategy::NativeElementDirect
        {
            let base = locator.base_name();
            [("webm", "video/webm"), ("ogg", "video/ogg")]
                .into_iter()
                .map(|(ext, mime_type)| MediaSource {
                    url: format!("{base}.{ext}"),
                    mime_type,
                })
                .filter(|alt| alt.url != primary.url)
                .collect()
        } else {
            Vec::new()
        };

        Self { primary, alternates }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use vc_core::ContainerKind;

    fn classified(raw: &str) -> (MediaLocator, FormatClassification) {
        let locator = MediaLocator::parse(raw).unwrap();
        let classification = classify(&locator, None);
        (locator, classification)
    }

    fn no_engine(native_adaptive: bool) -> FallbackController {
        FallbackController::new(PlaybackEnvironment {
            engine_available: false,
            engine_supported: false,
            native_adaptive,
        })
    }

    #[test]
    fn transport_stream_goes_straight_to_explicit_mime() {
        let (_, c) = classified("/seg/ep1.ts");
        let controller = FallbackController::default();
        assert_eq!(
            controller.first_strategy(&c),
            PlaybackStrategy::NativeElementWithExplicitMimeType
        );
        assert_eq!(
            controller.next_strategy(&c, PlaybackStrategy::NativeElementWithExplicitMimeType),
            NextStep::Exhausted
        );
    }

    #[test]
    fn hls_prefers_engine_when_usable() {
        let (_, c) = classified("/stream.m3u8");
        let controller = FallbackController::default();
        assert_eq!(
            controller.first_strategy(&c),
            PlaybackStrategy::AdaptiveStreamingLibrary
        );
        assert_eq!(
            controller.next_strategy(&c, PlaybackStrategy::AdaptiveStreamingLibrary),
            NextStep::Attempt {
                strategy: PlaybackStrategy::NativeElementWithExplicitMimeType,
                classification: c,
            }
        );
    }

    #[test]
    fn unsupported_engine_is_not_used() {
        let (_, c) = classified("/stream.m3u8");
        let controller = FallbackController::new(PlaybackEnvironment {
            engine_available: true,
            engine_supported: false,
            native_adaptive: true,
        });
        assert_eq!(
            controller.first_strategy(&c),
            PlaybackStrategy::NativeElementWithExplicitMimeType
        );
    }

    #[test]
    fn hls_without_engine_or_native_support_exhausts_after_one_try() {
        let (_, c) = classified("stream.m3u8");
        let controller = no_engine(false);
        let first = controller.first_strategy(&c);
        assert_eq!(first, PlaybackStrategy::NativeElementWithExplicitMimeType);
        assert_eq!(controller.next_strategy(&c, first), NextStep::Exhausted);
    }

    #[test]
    fn plain_container_retries_as_transport_stream() {
        let (_, c) = classified("/video123.mp4");
        let controller = FallbackController::default();
        assert_eq!(controller.first_strategy(&c), PlaybackStrategy::NativeElementDirect);

        match controller.next_strategy(&c, PlaybackStrategy::NativeElementDirect) {
            NextStep::Attempt {
                strategy,
                classification,
            } => {
                assert_eq!(strategy, PlaybackStrategy::NativeElementWithExplicitMimeType);
                assert!(classification.is_transport_stream());
            }
            NextStep::Exhausted => panic!("expected a transport-stream retry"),
        }
    }

    #[test]
    fn chain_lists_every_step() {
        let controller = FallbackController::default();

        let (_, mp4) = classified("/a.mp4");
        let chain = controller.chain(&mp4);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].0, PlaybackStrategy::NativeElementDirect);
        assert_eq!(chain[1].1.container(), ContainerKind::MpegTs);

        let (_, hls) = classified("/a.m3u8");
        let strategies: Vec<_> = controller.chain(&hls).into_iter().map(|(s, _)| s).collect();
        assert_eq!(
            strategies,
            vec![
                PlaybackStrategy::AdaptiveStreamingLibrary,
                PlaybackStrategy::NativeElementWithExplicitMimeType,
            ]
        );

        let (_, ts) = classified("/a.ts");
        assert_eq!(controller.chain(&ts).len(), 1);
    }

    #[test]
    fn engine_error_reactions() {
        let controller = FallbackController::default();
        assert_eq!(
            controller.on_engine_error(&EngineError::fatal(AdaptiveErrorClass::Network)),
            EngineAction::ReloadSource
        );
        assert_eq!(
            controller.on_engine_error(&EngineError::fatal(AdaptiveErrorClass::Media)),
            EngineAction::RecoverMediaError
        );
        assert_eq!(
            controller.on_engine_error(&EngineError::fatal(AdaptiveErrorClass::Other)),
            EngineAction::DestroyAndAdvance
        );
        assert_eq!(
            controller.on_engine_error(&EngineError::non_fatal(
                AdaptiveErrorClass::Other,
                "bufferStalledError"
            )),
            EngineAction::Ignore
        );
    }

    #[test]
    fn direct_plan_has_speculative_alternates() {
        let (locator, c) = classified("/video/3/ep2.mp4");
        let plan = SourcePlan::build(&locator, &c, PlaybackStrategy::NativeElementDirect, true);
        assert_eq!(plan.primary.url, "/video/3/ep2.mp4");
        assert_eq!(plan.primary.mime_type, "video/mp4");
        let urls: Vec<_> = plan.alternates.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["/video/3/ep2.webm", "/video/3/ep2.ogg"]);
    }

    #[test]
    fn alternates_skip_the_primary_itself() {
        let (locator, c) = classified("/clip.webm");
        let plan = SourcePlan::build(&locator, &c, PlaybackStrategy::NativeElementDirect, true);
        assert_eq!(plan.alternates.len(), 1);
        assert_eq!(plan.alternates[0].url, "/clip.ogg");
    }

    #[test]
    fn explicit_mime_plan_is_single_source() {
        let (locator, _) = classified("/video123.mp4");
        let ts = FormatClassification::transport_stream();
        let plan = SourcePlan::build(
            &locator,
            &ts,
            PlaybackStrategy::NativeElementWithExplicitMimeType,
            true,
        );
        assert_eq!(plan.primary.url, "/video123.mp4");
        assert_eq!(plan.primary.mime_type, "video/mp2t");
        assert!(plan.alternates.is_empty());
    }

    #[test]
    fn alternates_can_be_disabled() {
        let (locator, c) = classified("/a.mp4");
        let plan = SourcePlan::build(&locator, &c, PlaybackStrategy::NativeElementDirect, false);
        assert!(plan.alternates.is_empty());
    }
}
