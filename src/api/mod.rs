use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::models::NotificationRecord;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} returned status {status}")]
    Status { path: String, status: StatusCode },

    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Notification endpoints of the marketplace API.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// `GET /notifications`: the full list for the signed-in user.
    async fn fetch_notifications(&self) -> Result<Vec<NotificationRecord>, ApiError>;

    /// `PATCH /notifications/{id}/read`. The returned record is not used.
    async fn mark_as_read(&self, id: i64) -> Result<(), ApiError>;
}

/// `reqwest`-backed client authenticated with the session's bearer token.
#[derive(Clone)]
pub struct HttpNotificationApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpNotificationApi {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn fetch_notifications(&self) -> Result<Vec<NotificationRecord>, ApiError> {
        let path = "/notifications".to_string();

        let response = self
            .client
            .get(self.url(&path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { path, status });
        }

        response
            .json::<Vec<NotificationRecord>>()
            .await
            .map_err(|source| ApiError::Decode { path, source })
    }

    async fn mark_as_read(&self, id: i64) -> Result<(), ApiError> {
        let path = format!("/notifications/{id}/read");

        let response = self
            .client
            .patch(self.url(&path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { path, status });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_without_double_slashes() {
        let api = HttpNotificationApi::new("https://api.example.test/v1/", "token", Duration::from_secs(5))
            .unwrap();
        assert_eq!(
            api.url("/notifications"),
            "https://api.example.test/v1/notifications"
        );
        assert_eq!(
            api.url("notifications/7/read"),
            "https://api.example.test/v1/notifications/7/read"
        );
    }

    #[test]
    fn status_error_names_the_endpoint() {
        let err = ApiError::Status {
            path: "/notifications/7/read".into(),
            status: StatusCode::NOT_FOUND,
        };
        assert_eq!(
            err.to_string(),
            "/notifications/7/read returned status 404 Not Found"
        );
    }
}
