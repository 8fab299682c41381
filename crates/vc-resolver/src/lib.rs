//! Media source resolution for vidcue.
//!
//! - [`classifier`]: container classification of media locators
//! - [`fallback`]: strategy selection and adaptive-engine error reactions
//! - [`session`]: the playback session state machine
//! - [`probe`]: header-only content-type probing
//! - [`driver`]: async loop executing session commands against a surface

pub mod classifier;
pub mod driver;
pub mod error;
pub mod fallback;
pub mod probe;
pub mod session;

pub use classifier::{classify, needs_probe, ContentTypeHint, FormatClassification, MediaLocator};
pub use driver::{DriverHandle, PlaybackDriver, PlaybackSurface};
pub use error::PlaybackError;
pub use fallback::{
    EngineAction, EngineError, FallbackController, MediaSource, NextStep, PlaybackEnvironment,
    SourcePlan,
};
pub use probe::{ContentTypeProber, HeadProber};
pub use session::{Command, PlaybackSession, SessionEvent, SessionOptions, SessionState};
