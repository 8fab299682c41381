use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use vc_core::config::ApiConfig;
use vc_core::{Error, Result};

use crate::models::{
    AnimeDetail, AnimeSummary, CachedVideo, NewTask, RefreshedSource, Task, TaskResult,
};

/// Response wrapper used by every endpoint.
///
/// Most routes answer `{success, data | error, message}`; the source-refresh
/// route answers `{code, msg, data}` with `code == 0` meaning success.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
}

impl<T> Envelope<T> {
    fn failure_text(&self) -> Option<String> {
        self.error
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.message.clone())
    }

    fn is_success(&self) -> bool {
        match (self.success, self.code) {
            (Some(success), _) => success,
            (None, Some(code)) => code == 0,
            (None, None) => self.error.is_none(),
        }
    }
}

/// What a successful call returned.
struct Reply<T> {
    data: Option<T>,
    message: Option<String>,
}

impl<T> Reply<T> {
    fn require(self, what: &str) -> Result<T> {
        self.data
            .ok_or_else(|| Error::Decode(format!("{what}: response carried no data")))
    }
}

/// Typed client for the cache backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            tracing::warn!("Failed to build HTTP client with timeout: {}", e);
            Client::new()
        });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<Reply<T>> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{what}: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("{what}: {e}")))?;

        tracing::debug!(what, status = status.as_u16(), bytes = body.len(), "api response");
        decode(status, &body, what)
    }

    // -- catalog ------------------------------------------------------------

    pub async fn anime_list(&self, page: u32) -> Result<Vec<AnimeSummary>> {
        let request = self
            .request(Method::GET, "/api/anime/list")
            .query(&[("page", page)]);
        Ok(self.call(request, "anime list").await?.data.unwrap_or_default())
    }

    pub async fn search_anime(&self, query: &str) -> Result<Vec<AnimeSummary>> {
        if query.trim().is_empty() {
            return Err(Error::Validation("search query is empty".into()));
        }
        let request = self
            .request(Method::GET, "/api/anime/search")
            .query(&[("q", query)]);
        Ok(self.call(request, "anime search").await?.data.unwrap_or_default())
    }

    pub async fn anime_detail(&self, id: &str) -> Result<AnimeDetail> {
        let path = format!("/api/anime/detail/{id}");
        self.call(self.request(Method::GET, &path), "anime detail")
            .await?
            .require("anime detail")
    }

    /// Ask the backend for a fresh playable URL of an episode.
    pub async fn refresh_source(&self, anime_id: &str, episode_id: &str) -> Result<RefreshedSource> {
        let request = self
            .request(Method::GET, "/api/anime/video/refresh")
            .query(&[("anime_id", anime_id), ("episode_id", episode_id)]);
        self.call(request, "source refresh")
            .await?
            .require("source refresh")
    }

    // -- tasks --------------------------------------------------------------

    pub async fn tasks(&self) -> Result<Vec<Task>> {
        Ok(self
            .call(self.request(Method::GET, "/api/tasks"), "task list")
            .await?
            .data
            .unwrap_or_default())
    }

    pub async fn task(&self, id: i64) -> Result<Task> {
        let path = format!("/api/tasks/{id}");
        match self.call(self.request(Method::GET, &path), "task").await {
            Ok(reply) => reply.require("task"),
            Err(e) if e.is_not_found() => Err(Error::not_found("task", id)),
            Err(e) => Err(e),
        }
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task> {
        if task.anime_id.trim().is_empty() {
            return Err(Error::Validation("anime_id is required".into()));
        }
        if let Some(end) = task.end_episode.filter(|end| *end < task.start_episode) {
            return Err(Error::Validation(format!(
                "end episode {end} is before start episode {}",
                task.start_episode
            )));
        }

        let request = self.request(Method::POST, "/api/tasks").json(task);
        let reply = self.call(request, "create task").await?;
        if let Some(message) = &reply.message {
            tracing::info!(anime_id = %task.anime_id, "{message}");
        }
        reply.require("create task")
    }

    /// Start a task run; returns the server's acknowledgement.
    pub async fn execute_task(&self, id: i64) -> Result<String> {
        self.acknowledge(Method::POST, &format!("/api/tasks/{id}/execute"), "execute task", id)
            .await
    }

    pub async fn delete_task(&self, id: i64) -> Result<String> {
        self.acknowledge(Method::DELETE, &format!("/api/tasks/{id}"), "delete task", id)
            .await
    }

    pub async fn task_results(&self, id: i64) -> Result<Vec<TaskResult>> {
        let path = format!("/api/tasks/{id}/results");
        Ok(self
            .call(self.request(Method::GET, &path), "task results")
            .await?
            .data
            .unwrap_or_default())
    }

    async fn acknowledge(&self, method: Method, path: &str, what: &str, id: i64) -> Result<String> {
        match self.call::<serde_json::Value>(self.request(method, path), what).await {
            Ok(reply) => Ok(reply.message.unwrap_or_else(|| "ok".into())),
            Err(e) if e.is_not_found() => Err(Error::not_found("task", id)),
            Err(e) => Err(e),
        }
    }

    // -- cache --------------------------------------------------------------

    pub async fn cached_videos(&self) -> Result<Vec<CachedVideo>> {
        Ok(self
            .call(self.request(Method::GET, "/api/videos/cached"), "cached videos")
            .await?
            .data
            .unwrap_or_default())
    }
}

fn decode<T: DeserializeOwned>(status: StatusCode, body: &str, what: &str) -> Result<Reply<T>> {
    let envelope: Envelope<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => {
            return Err(Error::Decode(format!("{what}: {e}")));
        }
        Err(_) => {
            let text = body.trim();
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text.chars().take(200).collect()
            };
            return Err(Error::api(Some(status.as_u16()), message));
        }
    };

    if !status.is_success() || !envelope.is_success() {
        let message = envelope
            .failure_text()
            .unwrap_or_else(|| format!("{what} failed"));
        let status = (!status.is_success()).then(|| status.as_u16());
        return Err(Error::api(status, message));
    }

    Ok(Reply {
        data: envelope.data,
        message: envelope.message.or(envelope.msg),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn decodes_success_envelope() {
        let reply: Reply<Vec<u32>> =
            decode(StatusCode::OK, r#"{"success":true,"data":[1,2]}"#, "x").unwrap();
        assert_eq!(reply.data, Some(vec![1, 2]));
    }

    #[test]
    fn success_false_is_api_error_without_status() {
        let err = decode::<Vec<u32>>(
            StatusCode::OK,
            r#"{"success":false,"error":"missing keyword"}"#,
            "search",
        )
        .err()
        .unwrap();
        assert_matches!(err, Error::Api { status: None, ref message } if message == "missing keyword");
    }

    #[test]
    fn error_status_carries_envelope_text() {
        let err = decode::<serde_json::Value>(
            StatusCode::NOT_FOUND,
            r#"{"success":false,"error":"task does not exist"}"#,
            "task",
        )
        .err()
        .unwrap();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("task does not exist"));
    }

    #[test]
    fn error_status_without_json() {
        let err = decode::<serde_json::Value>(StatusCode::BAD_GATEWAY, "", "task")
            .err()
            .unwrap();
        assert_matches!(err, Error::Api { status: Some(502), .. });
    }

    #[test]
    fn refresh_shape_with_code() {
        let reply: Reply<RefreshedSource> = decode(
            StatusCode::OK,
            r#"{"code":0,"msg":"ok","data":{"url":"https://cdn.example/v.m3u8"}}"#,
            "refresh",
        )
        .unwrap();
        assert_eq!(reply.data.unwrap().url, "https://cdn.example/v.m3u8");

        let err = decode::<RefreshedSource>(
            StatusCode::OK,
            r#"{"code":1,"msg":"episode offline","data":null}"#,
            "refresh",
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("episode offline"));
    }

    #[test]
    fn malformed_success_body_is_decode_error() {
        let err = decode::<Vec<u32>>(StatusCode::OK, "<html>", "list")
            .err()
            .unwrap();
        assert_matches!(err, Error::Decode(_));
    }

    #[test]
    fn base_url_is_trimmed() {
        let client = ApiClient::new("http://cache.lan:5000/", Duration::from_secs(1));
        assert_eq!(client.url("/api/tasks"), "http://cache.lan:5000/api/tasks");
    }
}
