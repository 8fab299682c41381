//! Classification and playback-plan reports for the CLI.
//!
//! `plan` runs a real [`PlaybackSession`] and fails every attempt, so the
//! steps it lists are exactly the fallback chain a host would walk.

use serde::Serialize;

use vc_core::config::Config;
use vc_core::{AdaptiveErrorClass, PlaybackStrategy};
use vc_resolver::{
    classify, needs_probe, Command, ContentTypeHint, EngineError, FallbackController,
    FormatClassification, MediaLocator, PlaybackEnvironment, PlaybackError, PlaybackSession,
    SessionEvent, SessionOptions, SourcePlan,
};

/// Upper bound on simulated attempts; real chains are at most two long.
const MAX_SIMULATED_ATTEMPTS: usize = 8;

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyReport {
    pub locator: MediaLocator,
    pub classification: FormatClassification,
    pub content_type: Option<String>,
    /// Whether a host would issue a content-type probe for this locator.
    pub needs_probe: bool,
}

impl ClassifyReport {
    pub fn new(locator: MediaLocator, content_type: Option<&str>) -> Self {
        let hint = content_type.map(ContentTypeHint::new);
        Self {
            classification: classify(&locator, hint.as_ref()),
            needs_probe: needs_probe(&locator),
            content_type: hint.map(|h| h.as_str().to_string()),
            locator,
        }
    }
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptTarget {
    Native { sources: SourcePlan },
    Engine { url: String, mime_type: &'static str },
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanStep {
    pub attempt: u32,
    pub strategy: PlaybackStrategy,
    pub classification: FormatClassification,
    pub target: AttemptTarget,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub locator: MediaLocator,
    pub environment: PlaybackEnvironment,
    pub content_type: Option<String>,
    pub steps: Vec<PlanStep>,
    /// Message shown once every step has failed.
    pub exhausted_message: Option<String>,
}

/// Walk the fallback chain for `locator`, optionally answering the
/// content-type probe with `content_type`.
pub fn plan(locator: MediaLocator, config: &Config, content_type: Option<&str>) -> PlanReport {
    let environment = PlaybackEnvironment::from(&config.playback);
    let mut session = PlaybackSession::new(
        FallbackController::new(environment),
        SessionOptions {
            probe_enabled: content_type.is_some(),
            speculative_alternates: config.playback.speculative_alternates,
        },
    );

    let mut steps = Vec::new();
    let mut exhausted_message = None;

    let commands = session.handle(SessionEvent::Select(locator.clone()));
    let probe_requested = commands
        .iter()
        .any(|c| matches!(c, Command::Probe { .. }));
    record(&session, &commands, &mut steps, &mut exhausted_message);

    if let (true, Some(content_type)) = (probe_requested, content_type) {
        let commands = session.handle(SessionEvent::ProbeCompleted {
            generation: session.generation(),
            locator: locator.clone(),
            content_type: Some(content_type.to_string()),
        });
        if commands.iter().any(is_attempt) {
            // Reclassified: the chain restarts from scratch.
            steps.clear();
        }
        record(&session, &commands, &mut steps, &mut exhausted_message);
    }

    for _ in 0..MAX_SIMULATED_ATTEMPTS {
        if session.state().is_terminal() {
            break;
        }
        let event = match (session.strategy(), session.engine()) {
            (Some(PlaybackStrategy::AdaptiveStreamingLibrary), Some(engine)) => {
                SessionEvent::EngineError {
                    engine,
                    error: EngineError::fatal(AdaptiveErrorClass::Other),
                }
            }
            _ => SessionEvent::SurfaceError {
                generation: session.generation(),
                error: PlaybackError::FormatUnsupported,
            },
        };
        let commands = session.handle(event);
        record(&session, &commands, &mut steps, &mut exhausted_message);
    }

    PlanReport {
        locator,
        environment,
        content_type: content_type.map(|c| ContentTypeHint::new(c).as_str().to_string()),
        steps,
        exhausted_message,
    }
}

fn is_attempt(command: &Command) -> bool {
    matches!(
        command,
        Command::AttachNative { .. } | Command::StartEngine { .. }
    )
}

fn record(
    session: &PlaybackSession,
    commands: &[Command],
    steps: &mut Vec<PlanStep>,
    exhausted_message: &mut Option<String>,
) {
    for command in commands {
        let target = match command {
            Command::AttachNative { plan, .. } => AttemptTarget::Native {
                sources: plan.clone(),
            },
            Command::StartEngine { url, mime_type, .. } => AttemptTarget::Engine {
                url: url.clone(),
                mime_type: *mime_type,
            },
            Command::ShowError { message, .. } => {
                *exhausted_message = Some(message.clone());
                continue;
            }
            _ => continue,
        };

        if let (Some(strategy), Some(classification)) =
            (session.strategy(), session.classification())
        {
            steps.push(PlanStep {
                attempt: session.attempts(),
                strategy,
                classification: *classification,
                target,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_core::ContainerKind;

    fn loc(raw: &str) -> MediaLocator {
        MediaLocator::parse(raw).unwrap()
    }

    #[test]
    fn classify_report_applies_hint() {
        let report = ClassifyReport::new(loc("/video123.mp4"), Some("video/MP2T"));
        assert_eq!(report.classification.container(), ContainerKind::MpegTs);
        assert_eq!(report.content_type.as_deref(), Some("video/mp2t"));
        assert!(report.needs_probe);
    }

    #[test]
    fn mp4_plan_has_two_steps() {
        let report = plan(loc("/video123.mp4"), &Config::default(), None);
        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.steps[0].strategy, PlaybackStrategy::NativeElementDirect);
        assert_eq!(
            report.steps[1].strategy,
            PlaybackStrategy::NativeElementWithExplicitMimeType
        );
        assert!(report.steps[1].classification.is_transport_stream());
        assert!(report.exhausted_message.is_some());
    }

    #[test]
    fn hls_plan_uses_engine_then_native() {
        let report = plan(loc("/live/index.m3u8"), &Config::default(), None);
        let strategies: Vec<_> = report.steps.iter().map(|s| s.strategy).collect();
        assert_eq!(
            strategies,
            vec![
                PlaybackStrategy::AdaptiveStreamingLibrary,
                PlaybackStrategy::NativeElementWithExplicitMimeType,
            ]
        );
        assert!(matches!(report.steps[0].target, AttemptTarget::Engine { .. }));
    }

    #[test]
    fn hls_plan_without_engine() {
        let mut config = Config::default();
        config.playback.engine_available = false;
        let report = plan(loc("stream.m3u8"), &config, None);
        assert_eq!(report.steps.len(), 1);
        assert_eq!(
            report.steps[0].strategy,
            PlaybackStrategy::NativeElementWithExplicitMimeType
        );
    }

    #[test]
    fn probe_hint_restarts_plan_as_ts() {
        let report = plan(loc("/video123.mp4"), &Config::default(), Some("video/mp2t"));
        assert_eq!(report.steps.len(), 1);
        assert!(report.steps[0].classification.is_transport_stream());
    }
}
