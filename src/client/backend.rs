use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::{
    CalendarEvent, ConfirmRequest, ConfirmResponse, CreatedEvent, OAuthCredentials,
    ProposalResult, ProposeRequest, ProposeResponse,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait SchedulerBackend: Send + Sync {
    async fn propose(&self, prompt: &str) -> Result<ProposalResult, AppError>;

    async fn confirm(
        &self,
        event: &CalendarEvent,
        token: Option<&OAuthCredentials>,
    ) -> Result<CreatedEvent, AppError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(600),
        }
    }
}

/// Talks to the `/propose` and `/confirm` endpoints.
pub struct HttpBackend {
    base_url: String,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
            client,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn propose_once(&self, prompt: &str) -> Result<ProposalResult, String> {
        let resp = self
            .client
            .post(format!("{}/propose", self.base_url))
            .json(&ProposeRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = resp.status();
        let data: Value = resp.json().await.map_err(|_| {
            format!("Backend returned non-JSON (status={}).", status.as_u16())
        })?;

        if status != StatusCode::OK || data["status"] != "ok" {
            return Err(data["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Backend error (status {})", status.as_u16())));
        }

        match serde_json::from_value(data) {
            Ok(ProposeResponse::Ok(result)) => Ok(result),
            Ok(ProposeResponse::Error { message }) => Err(message),
            Err(e) => Err(format!("Malformed proposal from backend: {e}")),
        }
    }
}

#[async_trait]
impl SchedulerBackend for HttpBackend {
    async fn propose(&self, prompt: &str) -> Result<ProposalResult, AppError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut last_err = String::new();

        for attempt in 1..=attempts {
            match self.propose_once(prompt).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "propose attempt failed");
                    last_err = e;
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.retry.delay).await;
            }
        }

        Err(AppError::Transport(format!("Failed to propose: {last_err}")))
    }

    /// Single attempt: retrying could create the same event twice.
    async fn confirm(
        &self,
        event: &CalendarEvent,
        token: Option<&OAuthCredentials>,
    ) -> Result<CreatedEvent, AppError> {
        let payload = ConfirmRequest {
            event: event.clone(),
            token_dict: token.cloned(),
        };

        let resp = self
            .client
            .post(format!("{}/confirm", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        let status = resp.status();
        let data: ConfirmResponse = resp.json().await.map_err(|_| {
            AppError::Transport(format!(
                "Invalid response from backend (status {})",
                status.as_u16()
            ))
        })?;

        match data {
            ConfirmResponse::Ok { created } => Ok(created),
            ConfirmResponse::Error { message } => Err(AppError::Transport(message)),
        }
    }
}
