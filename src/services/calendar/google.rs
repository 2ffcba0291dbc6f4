use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::json;

use crate::errors::AppError;
use crate::models::event::ValidCredentials;
use crate::models::{CalendarEvent, CreatedEvent};

const CALENDAR_ID: &str = "primary";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google Calendar v3 over plain HTTPS, authorized by refresh-token exchange.
pub struct GoogleCalendarClient {
    api_base: String,
    timezone: Tz,
    client: reqwest::Client,
}

impl GoogleCalendarClient {
    pub fn new(api_base: String, timezone: Tz) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            timezone,
            client,
        }
    }

    pub async fn create_event(
        &self,
        creds: &ValidCredentials,
        event: &CalendarEvent,
    ) -> Result<CreatedEvent, AppError> {
        let access_token = self.refresh_access_token(creds).await?;
        self.insert_event(&access_token, event).await
    }

    pub async fn refresh_access_token(&self, creds: &ValidCredentials) -> Result<String, AppError> {
        let resp = self
            .client
            .post(&creds.token_uri)
            .form(&[
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("refresh_token", creds.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("token refresh failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AppError::Gateway(format!("token refresh failed: {e}")))?;

        if !status.is_success() {
            tracing::error!(%status, "token refresh rejected");
            return Err(AppError::Gateway(body));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::Gateway(format!("unexpected token response: {e}")))?;
        Ok(token.access_token)
    }

    pub async fn insert_event(
        &self,
        access_token: &str,
        event: &CalendarEvent,
    ) -> Result<CreatedEvent, AppError> {
        let timezone = event
            .timezone
            .clone()
            .unwrap_or_else(|| self.timezone.name().to_string());

        let body = json!({
            "summary": event.summary,
            "start": { "dateTime": event.start.to_rfc3339(), "timeZone": timezone },
            "end": { "dateTime": event.end.to_rfc3339(), "timeZone": timezone },
        });

        tracing::info!(summary = %event.summary, start = %event.start, "creating calendar event");

        let resp = self
            .client
            .post(format!("{}/calendars/{CALENDAR_ID}/events", self.api_base))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("failed to call Calendar API: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AppError::Gateway(format!("failed to read Calendar API response: {e}")))?;

        if !status.is_success() {
            tracing::error!(%status, "Calendar API rejected event");
            return Err(AppError::Gateway(text));
        }

        serde_json::from_str(&text)
            .map_err(|e| AppError::Gateway(format!("unexpected Calendar API response: {e}")))
    }
}
