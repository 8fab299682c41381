//! Backend commands: catalog, caching tasks, cached videos.

use anyhow::Result;
use serde::Serialize;
use vc_client::{
    AnimeSummary, ApiClient, CachedLibrary, DailyTime, NewTask, Task, TaskResult,
};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

pub async fn anime_list(client: &ApiClient, page: u32, json: bool) -> Result<()> {
    let list = client.anime_list(page).await?;
    if json {
        return print_json(&list);
    }
    println!("Page {} ({} entries)", page, list.len());
    print_summaries(&list);
    Ok(())
}

pub async fn anime_search(client: &ApiClient, query: &str, json: bool) -> Result<()> {
    let list = client.search_anime(query).await?;
    if json {
        return print_json(&list);
    }
    if list.is_empty() {
        println!("No results for {:?}", query);
        return Ok(());
    }
    print_summaries(&list);
    Ok(())
}

fn print_summaries(list: &[AnimeSummary]) {
    for anime in list {
        match anime.update_info {
            Some(ref info) => println!("  [{}] {} ({})", anime.id, anime.title, info),
            None => println!("  [{}] {}", anime.id, anime.title),
        }
    }
}

pub async fn anime_detail(client: &ApiClient, id: &str, json: bool) -> Result<()> {
    let detail = client.anime_detail(id).await?;
    if json {
        return print_json(&detail);
    }

    println!("{} [{}]", detail.title, detail.id);
    if let Some(ref alias) = detail.alias {
        println!("Alias: {}", alias);
    }
    if let (Some(region), Some(year)) = (&detail.region, &detail.year) {
        println!("{} {}", region, year);
    }
    if !detail.tags.is_empty() {
        println!("Tags: {}", detail.tags.join(", "));
    }
    if let Some(ref description) = detail.description {
        println!("\n{}", description);
    }

    println!("\nEpisodes: {}", detail.episodes.len());
    for episode in &detail.episodes {
        println!("  [{}] {}", episode.id, episode.title);
    }
    Ok(())
}

pub async fn refresh(client: &ApiClient, anime_id: &str, episode_id: &str, json: bool) -> Result<()> {
    let source = client.refresh_source(anime_id, episode_id).await?;
    if json {
        return print_json(&source);
    }
    println!("{}", source.url);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

pub async fn task_list(client: &ApiClient, json: bool) -> Result<()> {
    let tasks = client.tasks().await?;
    if json {
        return print_json(&tasks);
    }
    if tasks.is_empty() {
        println!("No tasks");
        return Ok(());
    }
    for task in &tasks {
        println!(
            "  #{:<4} {:<10} {} ep {}",
            task.id,
            task.status.to_string(),
            task_title(task),
            task.episode_range()
        );
    }
    Ok(())
}

fn task_title(task: &Task) -> &str {
    task.anime_title.as_deref().unwrap_or(&task.anime_id)
}

fn print_task(task: &Task) {
    println!("Task #{}", task.id);
    println!("  Anime: {} [{}]", task_title(task), task.anime_id);
    println!("  Episodes: {}", task.episode_range());
    println!("  Status: {}", task.status);
    if task.is_periodic {
        println!("  Daily update at {}", task.daily_update_time);
    }
    println!("  Created: {}", task.created_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(last_run) = task.last_run {
        println!("  Last run: {}", last_run.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(next_run) = task.next_run {
        println!("  Next run: {}", next_run.format("%Y-%m-%d %H:%M:%S"));
    }
}

pub async fn task_show(client: &ApiClient, id: i64, json: bool) -> Result<()> {
    let task = client.task(id).await?;
    if json {
        return print_json(&task);
    }
    print_task(&task);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn task_create(
    client: &ApiClient,
    anime_id: String,
    title: Option<String>,
    start: u32,
    end: Option<u32>,
    periodic: bool,
    at: DailyTime,
    json: bool,
) -> Result<()> {
    let mut new_task = NewTask::new(anime_id, start);
    new_task.anime_title = title;
    new_task.end_episode = end;
    new_task.is_periodic = periodic;
    new_task.daily_update_time = at;

    let task = client.create_task(&new_task).await?;
    tracing::info!(task = task.id, "created task");
    if json {
        return print_json(&task);
    }
    print_task(&task);
    Ok(())
}

pub async fn task_execute(client: &ApiClient, id: i64) -> Result<()> {
    let message = client.execute_task(id).await?;
    println!("{}", message);
    Ok(())
}

pub async fn task_delete(client: &ApiClient, id: i64) -> Result<()> {
    let message = client.delete_task(id).await?;
    println!("{}", message);
    Ok(())
}

pub async fn task_results(client: &ApiClient, id: i64, json: bool) -> Result<()> {
    let results = client.task_results(id).await?;
    if json {
        return print_json(&results);
    }
    println!("Task #{}: {} episodes", id, results.len());
    for result in &results {
        print_result(result);
    }
    Ok(())
}

fn print_result(result: &TaskResult) {
    print!(
        "  EP {:<5} {:<10} {:>3}%",
        result.episode_number.as_str(),
        result.status,
        result.download_progress
    );
    if result.file_size > 0 {
        print!("  {:.1} MiB", result.file_size as f64 / (1024.0 * 1024.0));
    }
    if let Some(ref url) = result.cache_url {
        print!("  {}", url);
    }
    if let Some(ref error) = result.error_message {
        print!("  ({})", error);
    }
    println!();
}

// ---------------------------------------------------------------------------
// Cached videos
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EpisodeNeighbours<'a> {
    anime_id: &'a str,
    episode: u32,
    cache_url: Option<&'a str>,
    previous: Option<&'a str>,
    next: Option<&'a str>,
}

pub async fn cached(
    client: &ApiClient,
    anime_id: Option<&str>,
    episode: Option<u32>,
    json: bool,
) -> Result<()> {
    let library = CachedLibrary::new(client.cached_videos().await?);

    match (anime_id, episode) {
        (Some(anime_id), Some(episode)) => {
            let neighbours = EpisodeNeighbours {
                anime_id,
                episode,
                cache_url: library.find(anime_id, episode).map(|v| v.cache_url.as_str()),
                previous: library.previous(anime_id, episode).map(|v| v.cache_url.as_str()),
                next: library.next(anime_id, episode).map(|v| v.cache_url.as_str()),
            };
            if json {
                return print_json(&neighbours);
            }
            match neighbours.cache_url {
                Some(url) => println!("Episode {}: {}", episode, url),
                None => println!("Episode {} is not cached", episode),
            }
            println!("  Previous: {}", neighbours.previous.unwrap_or("-"));
            println!("  Next: {}", neighbours.next.unwrap_or("-"));
        }
        (Some(anime_id), None) => {
            let episodes: Vec<_> = library.episodes(anime_id).collect();
            if json {
                return print_json(&episodes);
            }
            if episodes.is_empty() {
                println!("No cached episodes for {}", anime_id);
            }
            for video in episodes {
                println!("  EP {:<5} {}", video.episode_number.as_str(), video.cache_url);
            }
        }
        _ => {
            if json {
                return print_json(library.videos());
            }
            println!("Cached videos: {}", library.len());
            for anime in library.anime() {
                println!(
                    "  [{}] {} ({} episodes)",
                    anime.anime_id, anime.anime_title, anime.episodes
                );
            }
        }
    }
    Ok(())
}
