//! REST client for the users, lessons and completed-lessons endpoints.

use std::time::Duration;

use report_core::error::{ReportError, Result};
use report_core::models::{LessonRecord, UserRecord};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

/// Thin wrapper around a [`reqwest::Client`] with a request timeout.
///
/// Every fetch fails on a non-2xx status.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// GET `url` and deserialize the JSON body.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let http_err = |source: reqwest::Error| ReportError::Http {
            url: url.to_string(),
            source: Box::new(source),
        };

        let response = self.client.get(url).send().await.map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(http_err)?;
        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(serde_json::from_slice(&body)?)
    }

    /// Users with their nested enrollments and subscriptions.
    pub async fn fetch_users(&self, url: &str) -> Result<Vec<UserRecord>> {
        self.fetch_json(url).await
    }

    /// Lesson progress records.
    pub async fn fetch_lessons(&self, url: &str) -> Result<Vec<LessonRecord>> {
        self.fetch_json(url).await
    }

    /// Completed-lessons feed, kept schema-less for a pass-through export.
    pub async fn fetch_completed(&self, url: &str) -> Result<Vec<Map<String, Value>>> {
        self.fetch_json(url).await
    }
}
