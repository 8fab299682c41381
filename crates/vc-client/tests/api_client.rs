//! ApiClient against a mocked backend.

use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use vc_client::{ApiClient, CachedLibrary, DailyTime, NewTask, TaskStatus};
use vc_core::Error;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&server.uri(), Duration::from_secs(5));
    (server, client)
}

fn task_json(id: i64, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "anime_id": "2031",
        "anime_title": "Frieren",
        "start_episode": 1,
        "end_episode": 12,
        "is_periodic": 0,
        "daily_update_time": 0,
        "status": status,
        "created_at": 1_700_000_000
    })
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anime_list_passes_page() {
    let (server, client) = client().await;
    Mock::given(method("GET"))
        .and(path("/api/anime/list"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"id": 1, "title": "A", "cover_url": "/c/1.jpg", "update_info": "EP 3"},
                {"id": "2", "title": "B"}
            ]
        })))
        .mount(&server)
        .await;

    let list = client.anime_list(2).await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, "1");
    assert_eq!(list[0].update_info.as_deref(), Some("EP 3"));
    assert!(list[1].cover_url.is_none());
}

#[tokio::test]
async fn search_failure_envelope_is_api_error() {
    let (server, client) = client().await;
    Mock::given(method("GET"))
        .and(path("/api/anime/search"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "error": "crawler offline"
        })))
        .mount(&server)
        .await;

    let err = client.search_anime("frieren").await.unwrap_err();
    assert_matches!(err, Error::Api { status: Some(500), ref message } if message == "crawler offline");
}

#[tokio::test]
async fn empty_search_is_rejected_locally() {
    let (_server, client) = client().await;
    assert_matches!(client.search_anime("  ").await, Err(Error::Validation(_)));
}

#[tokio::test]
async fn anime_detail_with_episodes() {
    let (server, client) = client().await;
    Mock::given(method("GET"))
        .and(path("/api/anime/detail/2031"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "id": "2031",
                "title": "Frieren",
                "region": "JP",
                "year": "2023",
                "tags": ["fantasy", "adventure"],
                "description": "After the journey.",
                "episodes": [
                    {"id": "1", "title": "EP 1", "url": "/play/2031-1-1"},
                    {"id": "2", "title": "EP 2", "url": "/play/2031-1-2"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let detail = client.anime_detail("2031").await.unwrap();
    assert_eq!(detail.episodes.len(), 2);
    assert_eq!(detail.tags, vec!["fantasy", "adventure"]);
}

#[tokio::test]
async fn refresh_source_accepts_code_envelope() {
    let (server, client) = client().await;
    Mock::given(method("GET"))
        .and(path("/api/anime/video/refresh"))
        .and(query_param("anime_id", "2031"))
        .and(query_param("episode_id", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "msg": "ok",
            "data": {"url": "https://cdn.example/2031/4/index.m3u8"}
        })))
        .mount(&server)
        .await;

    let source = client.refresh_source("2031", "4").await.unwrap();
    assert_eq!(source.url, "https://cdn.example/2031/4/index.m3u8");
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_and_fetch_tasks() {
    let (server, client) = client().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [task_json(1, "completed"), task_json(2, "partial")]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": task_json(2, "partial")
        })))
        .mount(&server)
        .await;

    let tasks = client.tasks().await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].status, TaskStatus::Completed);

    let task = client.task(2).await.unwrap();
    assert_eq!(task.status, TaskStatus::Partial);
    assert_eq!(task.episode_range(), "1-12");
}

#[tokio::test]
async fn missing_task_is_not_found() {
    let (server, client) = client().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "error": "task does not exist"
        })))
        .mount(&server)
        .await;

    let err = client.task(99).await.unwrap_err();
    assert_matches!(err, Error::NotFound { ref entity, ref id } if entity == "task" && id == "99");
}

#[tokio::test]
async fn create_task_posts_body() {
    let (server, client) = client().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .and(body_json(json!({
            "anime_id": "2031",
            "start_episode": 1,
            "end_episode": 12,
            "is_periodic": true,
            "daily_update_time": 75600
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": task_json(5, "pending"),
            "message": "task created"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut new_task = NewTask::new("2031", 1);
    new_task.end_episode = Some(12);
    new_task.is_periodic = true;
    new_task.daily_update_time = "21:00".parse::<DailyTime>().unwrap();

    let task = client.create_task(&new_task).await.unwrap();
    assert_eq!(task.id, 5);
    assert_eq!(task.status, TaskStatus::Pending);
}

#[tokio::test]
async fn create_task_validates_range() {
    let (_server, client) = client().await;
    let mut new_task = NewTask::new("2031", 5);
    new_task.end_episode = Some(2);
    assert_matches!(client.create_task(&new_task).await, Err(Error::Validation(_)));
}

#[tokio::test]
async fn execute_and_delete_return_message() {
    let (server, client) = client().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/3/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "task started"
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "task deleted"
        })))
        .mount(&server)
        .await;

    assert_eq!(client.execute_task(3).await.unwrap(), "task started");
    assert_eq!(client.delete_task(3).await.unwrap(), "task deleted");
}

#[tokio::test]
async fn task_results_decode() {
    let (server, client) = client().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/3/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"episode_number": 1, "status": "completed", "cache_url": "/video/2031/1.mp4",
                 "download_progress": 100, "file_size": 104857600},
                {"episode_number": "ep2", "status": "failed", "error_message": "403 from CDN"}
            ]
        })))
        .mount(&server)
        .await;

    let results = client.task_results(3).await.unwrap();
    assert_eq!(results[0].download_progress, 100);
    assert_eq!(results[1].episode_number.number(), Some(2));
    assert_eq!(results[1].error_message.as_deref(), Some("403 from CDN"));
    assert_eq!(results[1].file_size, 0);
}

// ---------------------------------------------------------------------------
// Cached videos
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cached_videos_feed_library() {
    let (server, client) = client().await;
    Mock::given(method("GET"))
        .and(path("/api/videos/cached"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"anime_id": "2031", "anime_title": "Frieren", "episode_number": 2, "cache_url": "/video/2031/2.mp4"},
                {"anime_id": "2031", "anime_title": "Frieren", "episode_number": 1, "cache_url": "/video/2031/1.mp4"}
            ]
        })))
        .mount(&server)
        .await;

    let library = CachedLibrary::new(client.cached_videos().await.unwrap());
    assert_eq!(library.len(), 2);
    assert_eq!(
        library.next("2031", 1).map(|v| v.cache_url.as_str()),
        Some("/video/2031/2.mp4")
    );
    assert!(library.navigation("2031", 2).has_previous);
}

#[tokio::test]
async fn unreachable_backend_is_http_error() {
    let client = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(500));
    assert_matches!(client.tasks().await, Err(Error::Http { .. }));
}
