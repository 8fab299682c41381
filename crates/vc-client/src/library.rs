//! Episode sequencing over the cached-video list.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::CachedVideo;

/// Whether previous/next controls should be enabled for an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Navigation {
    pub has_previous: bool,
    pub has_next: bool,
}

/// One anime's worth of cached episodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedAnime<'a> {
    pub anime_id: &'a str,
    pub anime_title: &'a str,
    pub episodes: usize,
}

/// Cached videos indexed for playback order.
#[derive(Debug, Clone, Default)]
pub struct CachedLibrary {
    videos: Vec<CachedVideo>,
}

impl CachedLibrary {
    /// Episodes without a numeric episode number are kept but never
    /// reachable through `next`/`previous`.
    pub fn new(mut videos: Vec<CachedVideo>) -> Self {
        videos.sort_by(|a, b| {
            a.anime_id
                .cmp(&b.anime_id)
                .then_with(|| a.episode_number.number().cmp(&b.episode_number.number()))
        });
        Self { videos }
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    pub fn videos(&self) -> &[CachedVideo] {
        &self.videos
    }

    /// Episodes of one anime in episode order.
    pub fn episodes<'a>(&'a self, anime_id: &'a str) -> impl Iterator<Item = &'a CachedVideo> + 'a {
        self.videos.iter().filter(move |v| v.anime_id == anime_id)
    }

    /// Anime that have at least one cached episode.
    pub fn anime(&self) -> Vec<CachedAnime<'_>> {
        let mut grouped: BTreeMap<&str, CachedAnime<'_>> = BTreeMap::new();
        for video in &self.videos {
            grouped
                .entry(video.anime_id.as_str())
                .and_modify(|a| a.episodes += 1)
                .or_insert(CachedAnime {
                    anime_id: &video.anime_id,
                    anime_title: &video.anime_title,
                    episodes: 1,
                });
        }
        grouped.into_values().collect()
    }

    pub fn find(&self, anime_id: &str, episode: u32) -> Option<&CachedVideo> {
        self.videos
            .iter()
            .find(|v| v.anime_id == anime_id && v.episode_number.number() == Some(episode))
    }

    /// Episode `episode + 1`, if cached.
    pub fn next(&self, anime_id: &str, episode: u32) -> Option<&CachedVideo> {
        self.find(anime_id, episode.checked_add(1)?)
    }

    /// Episode `episode - 1`, if cached.
    pub fn previous(&self, anime_id: &str, episode: u32) -> Option<&CachedVideo> {
        self.find(anime_id, episode.checked_sub(1)?)
    }

    pub fn navigation(&self, anime_id: &str, episode: u32) -> Navigation {
        Navigation {
            has_previous: self.previous(anime_id, episode).is_some(),
            has_next: self.next(anime_id, episode).is_some(),
        }
    }
}
