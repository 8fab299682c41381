use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vc_client::DailyTime;

#[derive(Parser)]
#[command(name = "vidcue")]
#[command(author, version, about = "Media source resolver and anime cache client")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Backend base URL (overrides api.base_url)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a media URL by container format
    Classify {
        /// Media URL, absolute or relative to the backend
        url: String,

        /// Ask the server for the content type with a HEAD request
        #[arg(long)]
        probe: bool,

        /// Use this content type instead of probing
        #[arg(long, conflicts_with = "probe")]
        content_type: Option<String>,
    },

    /// Show the playback strategies that would be tried for a URL
    Plan {
        /// Media URL, absolute or relative to the backend
        url: String,

        /// Assume no adaptive-streaming engine is available
        #[arg(long)]
        no_engine: bool,

        /// Assume the native element plays HLS itself
        #[arg(long)]
        native_adaptive: bool,

        /// Content type reported by the probe
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Browse the anime catalog
    Anime {
        #[command(subcommand)]
        command: AnimeCommands,
    },

    /// Manage caching tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// List cached videos
    Cached {
        /// Only show episodes of this anime
        #[arg(long)]
        anime_id: Option<String>,

        /// Show previous/next episodes around this one (requires --anime-id)
        #[arg(long, requires = "anime_id")]
        episode: Option<u32>,
    },

    /// Fetch a fresh source URL for an episode
    Refresh {
        #[arg(long)]
        anime_id: String,

        #[arg(long)]
        episode_id: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum AnimeCommands {
    /// List catalog entries
    List {
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Search the catalog
    Search {
        query: String,
    },

    /// Show details and episodes of one anime
    Detail {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List all tasks
    List,

    /// Show one task
    Show {
        id: i64,
    },

    /// Create a caching task
    Create {
        /// Anime id on the source site
        #[arg(long)]
        anime_id: String,

        /// Title to record if the backend does not know the anime yet
        #[arg(long)]
        title: Option<String>,

        #[arg(long, default_value = "1")]
        start: u32,

        #[arg(long)]
        end: Option<u32>,

        /// Re-run daily to pick up new episodes
        #[arg(long)]
        periodic: bool,

        /// Time of day for periodic runs (HH:MM)
        #[arg(long, default_value = "00:00")]
        at: DailyTime,
    },

    /// Start a task run now
    Execute {
        id: i64,
    },

    /// Delete a task
    Delete {
        id: i64,
    },

    /// Show per-episode results of a task
    Results {
        id: i64,
    },
}
