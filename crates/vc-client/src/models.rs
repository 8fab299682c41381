//! Wire models for the cache backend's REST API.
//!
//! The backend is loose about types (ids arrive as numbers or strings,
//! booleans as `0`/`1`, episode numbers occasionally as `"ep3"`), so the
//! deserializers here accept every shape it is known to send.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// An entry of the catalog list or search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeSummary {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub update_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeDetail {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub year: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub update_info: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Updating,
    Completed,
    Partial,
    Failed,
    Terminated,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Updating)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Updating => write!(f, "updating"),
            Self::Completed => write!(f, "completed"),
            Self::Partial => write!(f, "partial"),
            Self::Failed => write!(f, "failed"),
            Self::Terminated => write!(f, "terminated"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A caching task as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(deserialize_with = "lenient::string")]
    pub anime_id: String,
    #[serde(default)]
    pub anime_title: Option<String>,
    pub start_episode: u32,
    #[serde(default)]
    pub end_episode: Option<u32>,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub is_periodic: bool,
    #[serde(default)]
    pub daily_update_time: DailyTime,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub next_run: Option<DateTime<Utc>>,
}

impl Task {
    /// `"3-12"`, or `"3-"` for an open-ended range.
    pub fn episode_range(&self) -> String {
        match self.end_episode {
            Some(end) => format!("{}-{}", self.start_episode, end),
            None => format!("{}-", self.start_episode),
        }
    }
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub anime_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anime_title: Option<String>,
    pub start_episode: u32,
    pub end_episode: Option<u32>,
    pub is_periodic: bool,
    pub daily_update_time: DailyTime,
}

impl NewTask {
    pub fn new(anime_id: impl Into<String>, start_episode: u32) -> Self {
        Self {
            anime_id: anime_id.into(),
            anime_title: None,
            start_episode,
            end_episode: None,
            is_periodic: false,
            daily_update_time: DailyTime::default(),
        }
    }
}

/// Per-episode outcome of a task run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub episode_number: EpisodeNumber,
    pub status: String,
    #[serde(default)]
    pub cache_url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub download_progress: u32,
    #[serde(default)]
    pub file_size: u64,
}

// ---------------------------------------------------------------------------
// Cached videos
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedVideo {
    #[serde(deserialize_with = "lenient::string")]
    pub anime_id: String,
    #[serde(default)]
    pub anime_title: String,
    pub episode_number: EpisodeNumber,
    pub cache_url: String,
}

/// Payload of the source-refresh endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshedSource {
    pub url: String,
}

// ---------------------------------------------------------------------------
// EpisodeNumber
// ---------------------------------------------------------------------------

/// Episode number as sent by the backend, compared numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EpisodeNumber(String);

impl EpisodeNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value, ignoring an `ep` prefix.
    pub fn number(&self) -> Option<u32> {
        let trimmed = self.0.trim();
        let digits = match trimmed.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("ep") => &trimmed[2..],
            _ => trimmed,
        };
        digits.trim().parse().ok()
    }
}

impl From<u32> for EpisodeNumber {
    fn from(n: u32) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for EpisodeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EpisodeNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::string(deserializer).map(Self)
    }
}

// ---------------------------------------------------------------------------
// DailyTime
// ---------------------------------------------------------------------------

/// Time of day for periodic tasks, stored as seconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyTime(u32);

impl DailyTime {
    pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then(|| Self(hour * 3600 + minute * 60))
    }

    pub fn seconds(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DailyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0 % Self::SECONDS_PER_DAY;
        write!(f, "{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
    }
}

impl FromStr for DailyTime {
    type Err = String;

    /// Parses `HH:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("expected HH:MM, got '{s}'"))?;
        let hour = h.parse().map_err(|_| format!("invalid hour '{h}'"))?;
        let minute = m.parse().map_err(|_| format!("invalid minute '{m}'"))?;
        Self::from_hm(hour, minute).ok_or_else(|| format!("time out of range: '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Lenient deserializers
// ---------------------------------------------------------------------------

mod lenient {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    impl Scalar {
        fn into_string(self) -> String {
            match self {
                Scalar::Str(s) => s,
                Scalar::Int(n) => n.to_string(),
                Scalar::Float(n) => n.to_string(),
                Scalar::Bool(b) => b.to_string(),
            }
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Scalar::deserialize(deserializer).map(Scalar::into_string)
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
    }

    pub fn boolean<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Scalar::deserialize(deserializer)? {
            Scalar::Bool(b) => Ok(b),
            Scalar::Int(n) => Ok(n != 0),
            Scalar::Float(n) => Ok(n != 0.0),
            Scalar::Str(s) => match s.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" | "" => Ok(false),
                other => Err(D::Error::custom(format!("invalid boolean '{other}'"))),
            },
        }
    }
}
