//! Playback session state machine.
//!
//! A [`PlaybackSession`] consumes [`SessionEvent`]s and returns the
//! [`Command`]s the host must execute. It never performs I/O itself, which
//! keeps every transition testable without a real media surface.
//!
//! Asynchronous results carry the [`Generation`] they were issued under (or
//! the [`EngineId`] of the engine that produced them); anything that does not
//! match the current selection is dropped.

use std::sync::Arc;

use serde::Serialize;
use vc_core::config::Config;
use vc_core::events::{EventBus, EventPayload};
use vc_core::{ContainerKind, EngineId, Generation, PlaybackStrategy, SessionId};

use crate::classifier::{classify, needs_probe, ContentTypeHint, FormatClassification, MediaLocator};
use crate::error::PlaybackError;
use crate::fallback::{
    EngineAction, EngineError, FallbackController, NextStep, PlaybackEnvironment, SourcePlan,
};

// ---------------------------------------------------------------------------
// State, events, commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Classifying,
    Attempting(PlaybackStrategy),
    Playing,
    /// Terminal for the current locator; only a new selection leaves it.
    Failed(PlaybackError),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Classifying => "classifying",
            Self::Attempting(_) => "attempting",
            Self::Playing => "playing",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Inputs to the session: user selections and surface/engine/probe callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user picked a locator to play.
    Select(MediaLocator),
    /// The page went away; release everything.
    Stop,
    ProbeCompleted {
        generation: Generation,
        locator: MediaLocator,
        content_type: Option<String>,
    },
    ProbeFailed {
        generation: Generation,
        locator: MediaLocator,
        error: String,
    },
    /// The surface can play (or is playing) the current source.
    SurfaceReady { generation: Generation },
    /// The native element reported an error.
    SurfaceError {
        generation: Generation,
        error: PlaybackError,
    },
    /// The surface rejected a play request (autoplay policy and the like).
    PlayRejected {
        generation: Generation,
        reason: String,
    },
    Ended { generation: Generation },
    ManifestParsed { engine: EngineId },
    EngineError { engine: EngineId, error: EngineError },
}

/// Effects for the host to carry out, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Header-only fetch of the locator, answered with a probe event.
    Probe {
        generation: Generation,
        locator: MediaLocator,
    },
    DestroyEngine(EngineId),
    AttachNative {
        generation: Generation,
        plan: SourcePlan,
    },
    StartEngine {
        generation: Generation,
        engine: EngineId,
        url: String,
        mime_type: &'static str,
    },
    ReloadEngine(EngineId),
    RecoverEngine(EngineId),
    Play { generation: Generation },
    ShowError {
        generation: Generation,
        message: String,
    },
}

/// Per-session switches taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub probe_enabled: bool,
    pub speculative_alternates: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            probe_enabled: true,
            speculative_alternates: true,
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            probe_enabled: config.probe.enabled,
            speculative_alternates: config.playback.speculative_alternates,
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackSession
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PlaybackSession {
    id: SessionId,
    controller: FallbackController,
    options: SessionOptions,
    generation: Generation,
    state: SessionState,
    locator: Option<MediaLocator>,
    classification: Option<FormatClassification>,
    strategy: Option<PlaybackStrategy>,
    attempts: u32,
    engine: Option<EngineId>,
    probe_pending: bool,
    events: Option<Arc<EventBus>>,
}

impl PlaybackSession {
    pub fn new(controller: FallbackController, options: SessionOptions) -> Self {
        Self {
            id: SessionId::new(),
            controller,
            options,
            generation: Generation::default(),
            state: SessionState::Idle,
            locator: None,
            classification: None,
            strategy: None,
            attempts: 0,
            engine: None,
            probe_pending: false,
            events: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            FallbackController::new(PlaybackEnvironment::from(&config.playback)),
            SessionOptions::from(config),
        )
    }

    /// Publish lifecycle events on `bus`.
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn locator(&self) -> Option<&MediaLocator> {
        self.locator.as_ref()
    }

    pub fn classification(&self) -> Option<&FormatClassification> {
        self.classification.as_ref()
    }

    pub fn strategy(&self) -> Option<PlaybackStrategy> {
        self.strategy
    }

    /// Attempts made for the current classification.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn engine(&self) -> Option<EngineId> {
        self.engine
    }

    pub fn controller(&self) -> &FallbackController {
        &self.controller
    }

    /// Apply one event and return the resulting commands.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Command> {
        let mut commands = Vec::new();

        match event {
            SessionEvent::Select(locator) => self.select(locator, &mut commands),
            SessionEvent::Stop => self.stop(&mut commands),
            SessionEvent::ProbeCompleted {
                generation,
                locator,
                content_type,
            } => {
                if self.take_probe(generation, &locator) {
                    self.probe_completed(&locator, content_type, &mut commands);
                }
            }
            SessionEvent::ProbeFailed {
                generation,
                locator,
                error,
            } => {
                if self.take_probe(generation, &locator) {
                    tracing::warn!(
                        session = %self.id,
                        locator = %locator,
                        error = %error,
                        "content-type probe failed; keeping extension classification"
                    );
                    self.publish(EventPayload::ProbeFailed {
                        session_id: self.id,
                        generation,
                        error,
                    });
                }
            }
            SessionEvent::SurfaceReady { generation } => {
                if self.is_current(generation, "surface ready") {
                    self.surface_ready();
                }
            }
            SessionEvent::SurfaceError { generation, error } => {
                if self.is_current(generation, "surface error") {
                    self.surface_error(error, &mut commands);
                }
            }
            SessionEvent::PlayRejected { generation, reason } => {
                if self.is_current(generation, "play rejected") {
                    tracing::warn!(session = %self.id, reason = %reason, "play request rejected");
                }
            }
            SessionEvent::Ended { generation } => {
                if self.is_current(generation, "ended") && self.state == SessionState::Playing {
                    tracing::info!(session = %self.id, "playback ended");
                    self.state = SessionState::Idle;
                    self.publish(EventPayload::PlaybackEnded {
                        session_id: self.id,
                        generation,
                    });
                }
            }
            SessionEvent::ManifestParsed { engine } => {
                if self.is_current_engine(engine, "manifest parsed")
                    && self.state == SessionState::Attempting(PlaybackStrategy::AdaptiveStreamingLibrary)
                {
                    commands.push(Command::Play {
                        generation: self.generation,
                    });
                }
            }
            SessionEvent::EngineError { engine, error } => {
                if self.is_current_engine(engine, "engine error") {
                    self.engine_error(engine, error, &mut commands);
                }
            }
        }

        commands
    }

    // -- transitions --------------------------------------------------------

    fn select(&mut self, locator: MediaLocator, commands: &mut Vec<Command>) {
        self.generation = self.generation.next();
        self.release_engine(commands);
        self.state = SessionState::Classifying;

        let classification = classify(&locator, None);
        tracing::info!(
            session = %self.id,
            generation = %self.generation,
            locator = %locator,
            classification = %classification,
            "locator selected"
        );
        self.publish(EventPayload::LocatorSelected {
            session_id: self.id,
            generation: self.generation,
            locator: locator.to_string(),
            container: classification.container(),
        });

        self.probe_pending = self.options.probe_enabled && needs_probe(&locator);
        if self.probe_pending {
            commands.push(Command::Probe {
                generation: self.generation,
                locator: locator.clone(),
            });
        }

        self.locator = Some(locator);
        self.restart(classification, commands);
    }

    fn stop(&mut self, commands: &mut Vec<Command>) {
        self.generation = self.generation.next();
        self.release_engine(commands);
        self.state = SessionState::Idle;
        self.locator = None;
        self.classification = None;
        self.strategy = None;
        self.attempts = 0;
        self.probe_pending = false;
    }

    fn probe_completed(
        &mut self,
        locator: &MediaLocator,
        content_type: Option<String>,
        commands: &mut Vec<Command>,
    ) {
        let Some(current) = self.classification else {
            return;
        };
        let hint = content_type.map(ContentTypeHint::new);
        let corrected = classify(locator, hint.as_ref());

        if corrected == current {
            return;
        }

        if !corrected.is_transport_stream() && !corrected.is_adaptive_streaming() {
            // Confirmation only (e.g. video/mp4); valid while the direct
            // attempt for the default classification is still current.
            if current.container() == ContainerKind::UnknownDefaultMp4
                && self.strategy == Some(PlaybackStrategy::NativeElementDirect)
                && !self.state.is_terminal()
            {
                self.classification = Some(corrected);
            } else {
                tracing::debug!(
                    session = %self.id,
                    state = self.state.name(),
                    classification = %current,
                    "content-type confirmation ignored"
                );
            }
            return;
        }

        if !matches!(
            self.state,
            SessionState::Attempting(_) | SessionState::Playing
        ) {
            tracing::debug!(
                session = %self.id,
                state = self.state.name(),
                "reclassification ignored in current state"
            );
            return;
        }

        tracing::info!(
            session = %self.id,
            locator = %locator,
            classification = %corrected,
            "locator reclassified by content type"
        );
        self.publish(EventPayload::Reclassified {
            session_id: self.id,
            generation: self.generation,
            container: corrected.container(),
        });
        self.restart(corrected, commands);
    }

    fn surface_ready(&mut self) {
        let SessionState::Attempting(strategy) = self.state else {
            return;
        };
        tracing::info!(session = %self.id, strategy = %strategy, "playback started");
        self.state = SessionState::Playing;
        self.publish(EventPayload::PlaybackStarted {
            session_id: self.id,
            generation: self.generation,
            strategy,
        });
    }

    fn surface_error(&mut self, error: PlaybackError, commands: &mut Vec<Command>) {
        let active = matches!(
            self.state,
            SessionState::Attempting(_) | SessionState::Playing
        );
        match self.strategy {
            Some(failed) if active => self.advance(failed, error, commands),
            _ if self.state.is_terminal() => {
                tracing::debug!(session = %self.id, error = %error, "error after exhaustion");
            }
            _ => {
                tracing::debug!(
                    session = %self.id,
                    state = self.state.name(),
                    error = %error,
                    "surface error ignored"
                );
            }
        }
    }

    fn engine_error(&mut self, engine: EngineId, error: EngineError, commands: &mut Vec<Command>) {
        match self.controller.on_engine_error(&error) {
            EngineAction::Ignore => {
                tracing::debug!(
                    session = %self.id,
                    class = %error.class,
                    details = ?error.details,
                    "non-fatal engine error"
                );
            }
            EngineAction::ReloadSource => {
                tracing::warn!(session = %self.id, engine = %engine, "fatal network error; reloading source");
                commands.push(Command::ReloadEngine(engine));
                self.publish_recovering(engine, error.class);
            }
            EngineAction::RecoverMediaError => {
                tracing::warn!(session = %self.id, engine = %engine, "fatal media error; recovering");
                commands.push(Command::RecoverEngine(engine));
                self.publish_recovering(engine, error.class);
            }
            EngineAction::DestroyAndAdvance => {
                self.release_engine(commands);
                let failure = PlaybackError::EngineFatal {
                    class: error.class,
                    details: error.details,
                };
                match self.strategy {
                    Some(failed) if !self.state.is_terminal() => {
                        self.advance(failed, failure, commands)
                    }
                    _ => {}
                }
            }
        }
    }

    /// Start the fallback chain over for `classification`.
    fn restart(&mut self, classification: FormatClassification, commands: &mut Vec<Command>) {
        self.classification = Some(classification);
        self.attempts = 0;
        let strategy = self.controller.first_strategy(&classification);
        self.attempt(strategy, commands);
    }

    fn advance(&mut self, failed: PlaybackStrategy, error: PlaybackError, commands: &mut Vec<Command>) {
        let Some(current) = self.classification else {
            return;
        };

        match self.controller.next_strategy(&current, failed) {
            NextStep::Attempt {
                strategy,
                classification,
            } => {
                tracing::warn!(
                    session = %self.id,
                    failed = %failed,
                    next = %strategy,
                    error = %error,
                    "playback attempt failed; falling back"
                );
                self.classification = Some(classification);
                self.attempt(strategy, commands);
            }
            NextStep::Exhausted => {
                tracing::error!(
                    session = %self.id,
                    locator = ?self.locator.as_ref().map(MediaLocator::as_str),
                    attempts = self.attempts,
                    error = %error,
                    "all playback strategies failed"
                );
                self.release_engine(commands);
                let message = error.to_string();
                self.state = SessionState::Failed(error);
                commands.push(Command::ShowError {
                    generation: self.generation,
                    message: message.clone(),
                });
                self.publish(EventPayload::PlaybackFailed {
                    session_id: self.id,
                    generation: self.generation,
                    message,
                });
            }
        }
    }

    fn attempt(&mut self, strategy: PlaybackStrategy, commands: &mut Vec<Command>) {
        let (Some(locator), Some(classification)) = (self.locator.clone(), self.classification)
        else {
            return;
        };

        self.release_engine(commands);
        self.attempts += 1;
        self.strategy = Some(strategy);
        self.state = SessionState::Attempting(strategy);

        if strategy.uses_engine() {
            let engine = EngineId::new();
            self.engine = Some(engine);
            commands.push(Command::StartEngine {
                generation: self.generation,
                engine,
                url: locator.to_string(),
                mime_type: classification.mime_type(),
            });
        } else {
            let plan = SourcePlan::build(
                &locator,
                &classification,
                strategy,
                self.options.speculative_alternates,
            );
            commands.push(Command::AttachNative {
                generation: self.generation,
                plan,
            });
            commands.push(Command::Play {
                generation: self.generation,
            });
        }

        tracing::debug!(
            session = %self.id,
            strategy = %strategy,
            attempt = self.attempts,
            "attempting playback"
        );
        self.publish(EventPayload::StrategyAttempted {
            session_id: self.id,
            generation: self.generation,
            strategy,
            attempt: self.attempts,
        });
    }

    // -- helpers ------------------------------------------------------------

    fn release_engine(&mut self, commands: &mut Vec<Command>) {
        if let Some(engine) = self.engine.take() {
            commands.push(Command::DestroyEngine(engine));
        }
    }

    fn is_current(&self, generation: Generation, what: &str) -> bool {
        let current = generation == self.generation;
        if !current {
            tracing::debug!(
                session = %self.id,
                stale = %generation,
                current = %self.generation,
                "discarding stale {what}"
            );
        }
        current
    }

    fn is_current_engine(&self, engine: EngineId, what: &str) -> bool {
        let current = self.engine == Some(engine);
        if !current {
            tracing::debug!(session = %self.id, engine = %engine, "discarding {what} from released engine");
        }
        current
    }

    /// Accept a probe result at most once, and only for the current locator.
    fn take_probe(&mut self, generation: Generation, locator: &MediaLocator) -> bool {
        if !self.is_current(generation, "probe result") || self.locator.as_ref() != Some(locator) {
            return false;
        }
        std::mem::replace(&mut self.probe_pending, false)
    }

    fn publish(&self, payload: EventPayload) {
        if let Some(bus) = &self.events {
            bus.broadcast(payload);
        }
    }

    fn publish_recovering(&self, engine: EngineId, class: vc_core::AdaptiveErrorClass) {
        self.publish(EventPayload::EngineRecovering {
            session_id: self.id,
            engine_id: engine,
            class,
        });
    }
}
