//! Client for the anime cache backend.
//!
//! [`ApiClient`] wraps the REST endpoints (catalog, caching tasks, cached
//! videos, source refresh). [`CachedLibrary`] answers previous/next episode
//! questions over the cached-video list.

pub mod client;
pub mod library;
pub mod models;

pub use client::ApiClient;
pub use library::{CachedAnime, CachedLibrary, Navigation};
pub use models::{
    AnimeDetail, AnimeSummary, CachedVideo, DailyTime, Episode, EpisodeNumber, NewTask,
    RefreshedSource, Task, TaskResult, TaskStatus,
};
