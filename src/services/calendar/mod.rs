pub mod google;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{CalendarEvent, CreatedEvent, OAuthCredentials};

use google::GoogleCalendarClient;

#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Creates exactly one event. `credentials` is the caller's token_dict, if any.
    async fn create_event(
        &self,
        event: &CalendarEvent,
        credentials: Option<&OAuthCredentials>,
    ) -> Result<CreatedEvent, AppError>;
}

/// Demo mode: every event lands on the server's own calendar account.
pub struct SharedCalendar {
    credentials: OAuthCredentials,
    client: GoogleCalendarClient,
}

impl SharedCalendar {
    pub fn new(credentials: OAuthCredentials, client: GoogleCalendarClient) -> Self {
        Self {
            credentials,
            client,
        }
    }
}

#[async_trait]
impl CalendarGateway for SharedCalendar {
    async fn create_event(
        &self,
        event: &CalendarEvent,
        _credentials: Option<&OAuthCredentials>,
    ) -> Result<CreatedEvent, AppError> {
        tracing::info!("demo mode, using server refresh token");
        let creds = self.credentials.validate()?;
        self.client.create_event(&creds, event).await
    }
}

/// Production mode: the caller supplies its own OAuth fields.
pub struct UserCalendar {
    client: GoogleCalendarClient,
}

impl UserCalendar {
    pub fn new(client: GoogleCalendarClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CalendarGateway for UserCalendar {
    async fn create_event(
        &self,
        event: &CalendarEvent,
        credentials: Option<&OAuthCredentials>,
    ) -> Result<CreatedEvent, AppError> {
        let creds = credentials.cloned().unwrap_or_default().validate()?;
        self.client.create_event(&creds, event).await
    }
}

pub fn from_config(config: &AppConfig) -> Box<dyn CalendarGateway> {
    let client = GoogleCalendarClient::new(config.google_calendar_api.clone(), config.timezone);

    if config.demo_mode {
        tracing::info!("calendar gateway: shared demo credentials");
        Box::new(SharedCalendar::new(
            OAuthCredentials {
                refresh_token: Some(config.demo_refresh_token.clone()),
                client_id: Some(config.google_client_id.clone()),
                client_secret: Some(config.google_client_secret.clone()),
                token_uri: Some(config.google_token_uri.clone()),
            },
            client,
        ))
    } else {
        tracing::info!("calendar gateway: per-user credentials");
        Box::new(UserCalendar::new(client))
    }
}
