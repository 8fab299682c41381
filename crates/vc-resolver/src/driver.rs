//! Async driver that owns a [`PlaybackSession`] and executes its commands.
//!
//! The host pushes user selections and surface callbacks through a
//! [`DriverHandle`]; the driver task is the only code that touches the
//! session, so the queue is the single serialization point. Content-type
//! probes run as spawned tasks and post their results back into the queue.

use std::sync::Arc;

use tokio::sync::mpsc;

use vc_core::config::EngineConfig;
use vc_core::{EngineId, Error, Generation, Result};

use crate::classifier::MediaLocator;
use crate::fallback::SourcePlan;
use crate::probe::ContentTypeProber;
use crate::session::{Command, PlaybackSession, SessionEvent};

// ---------------------------------------------------------------------------
// PlaybackSurface
// ---------------------------------------------------------------------------

/// The rendering surface (media element plus optional adaptive engine).
///
/// Outcomes are reported asynchronously through a [`DriverHandle`], never
/// as return values.
#[async_trait::async_trait]
pub trait PlaybackSurface: Send {
    /// Replace the element's sources with `plan` and load them.
    async fn attach_native(&mut self, generation: Generation, plan: &SourcePlan);

    /// Create engine `engine`, attach it and load `url`.
    async fn start_engine(
        &mut self,
        generation: Generation,
        engine: EngineId,
        url: &str,
        mime_type: &str,
        config: &EngineConfig,
    );

    async fn destroy_engine(&mut self, engine: EngineId);

    /// Restart loading in place after a fatal network error.
    async fn reload_engine(&mut self, engine: EngineId);

    /// Recover in place after a fatal media error.
    async fn recover_engine(&mut self, engine: EngineId);

    async fn play(&mut self, generation: Generation);

    async fn show_error(&mut self, message: &str);
}

// ---------------------------------------------------------------------------
// DriverHandle
// ---------------------------------------------------------------------------

/// Host-facing sender into a running [`PlaybackDriver`].
#[derive(Debug, Clone)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl DriverHandle {
    pub fn send(&self, event: SessionEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| Error::Internal("playback driver has stopped".into()))
    }

    /// Parse and select a locator.
    pub fn select(&self, locator: &str) -> Result<()> {
        self.send(SessionEvent::Select(MediaLocator::parse(locator)?))
    }

    pub fn stop(&self) -> Result<()> {
        self.send(SessionEvent::Stop)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ---------------------------------------------------------------------------
// PlaybackDriver
// ---------------------------------------------------------------------------

pub struct PlaybackDriver<S> {
    session: PlaybackSession,
    surface: S,
    prober: Option<Arc<dyn ContentTypeProber>>,
    engine_config: EngineConfig,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
    // Weak so the loop ends once every host handle is dropped.
    tx: mpsc::WeakUnboundedSender<SessionEvent>,
}

impl<S: PlaybackSurface> PlaybackDriver<S> {
    pub fn new(
        session: PlaybackSession,
        surface: S,
        engine_config: EngineConfig,
    ) -> (Self, DriverHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let driver = Self {
            session,
            surface,
            prober: None,
            engine_config,
            rx,
            tx: tx.downgrade(),
        };
        (driver, DriverHandle { tx })
    }

    pub fn with_prober(mut self, prober: Arc<dyn ContentTypeProber>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Process events until every handle (and in-flight probe) is gone.
    /// Returns the surface.
    ///
    /// Probes requested after the last handle was dropped are skipped.
    pub async fn run(mut self) -> S {
        tracing::debug!(session = %self.session.id(), "playback driver started");
        while self.step().await {}
        tracing::debug!(session = %self.session.id(), "playback driver stopped");
        self.surface
    }

    /// Wait for one event and apply it. Returns `false` once the queue is
    /// closed.
    pub async fn step(&mut self) -> bool {
        match self.rx.recv().await {
            Some(event) => {
                self.dispatch(event).await;
                true
            }
            None => false,
        }
    }

    async fn dispatch(&mut self, event: SessionEvent) {
        let before = self.session.state().name();
        let commands = self.session.handle(event);
        let after = self.session.state().name();
        if before != after {
            tracing::debug!(
                session = %self.session.id(),
                from = before,
                to = after,
                "session transition"
            );
        }

        for command in commands {
            self.execute(command).await;
        }
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Probe {
                generation,
                locator,
            } => self.spawn_probe(generation, locator),
            Command::DestroyEngine(engine) => self.surface.destroy_engine(engine).await,
            Command::AttachNative { generation, plan } => {
                self.surface.attach_native(generation, &plan).await
            }
            Command::StartEngine {
                generation,
                engine,
                url,
                mime_type,
            } => {
                self.surface
                    .start_engine(generation, engine, &url, mime_type, &self.engine_config)
                    .await
            }
            Command::ReloadEngine(engine) => self.surface.reload_engine(engine).await,
            Command::RecoverEngine(engine) => self.surface.recover_engine(engine).await,
            Command::Play { generation } => self.surface.play(generation).await,
            Command::ShowError { message, .. } => self.surface.show_error(&message).await,
        }
    }

    fn spawn_probe(&self, generation: Generation, locator: MediaLocator) {
        let Some(prober) = self.prober.clone() else {
            tracing::debug!(locator = %locator, "no prober configured; skipping probe");
            return;
        };
        let Some(tx) = self.tx.upgrade() else {
            return;
        };

        tokio::spawn(async move {
            let event = match prober.probe(&locator).await {
                Ok(hint) => SessionEvent::ProbeCompleted {
                    generation,
                    content_type: hint.map(|h| h.as_str().to_string()),
                    locator,
                },
                Err(e) => SessionEvent::ProbeFailed {
                    generation,
                    error: e.to_string(),
                    locator,
                },
            };
            tracing::trace!(prober = prober.name(), "probe finished");
            // The driver may already be gone.
            let _ = tx.send(event);
        });
    }
}
