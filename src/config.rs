use std::env;

use chrono_tz::Tz;

use crate::models::OAuthCredentials;
use crate::services::interpreter::AnchorRounding;
use crate::services::slots::SlotSpacing;

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub backend_url: String,
    pub demo_mode: bool,
    pub timezone: Tz,
    pub demo_refresh_token: String,
    pub user_refresh_token: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_token_uri: String,
    pub google_calendar_api: String,
    pub database_url: Option<String>,
    pub slot_count: usize,
    pub slot_spacing: SlotSpacing,
    pub anchor_rounding: AnchorRounding,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            backend_url: env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            demo_mode: env::var("DEMO_MODE")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(true),
            timezone: env::var("TIMEZONE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(chrono_tz::Asia::Kolkata),
            demo_refresh_token: env::var("DEMO_REFRESH_TOKEN").unwrap_or_default(),
            user_refresh_token: env::var("USER_REFRESH_TOKEN").unwrap_or_default(),
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            google_token_uri: env::var("GOOGLE_TOKEN_URI")
                .unwrap_or_else(|_| GOOGLE_TOKEN_URI.to_string()),
            google_calendar_api: env::var("GOOGLE_CALENDAR_API")
                .unwrap_or_else(|_| GOOGLE_CALENDAR_API.to_string()),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            slot_count: env::var("SLOT_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            slot_spacing: env::var("SLOT_SPACING")
                .map(|v| SlotSpacing::parse(&v))
                .unwrap_or_default(),
            anchor_rounding: env::var("ANCHOR_ROUNDING")
                .map(|v| AnchorRounding::parse(&v))
                .unwrap_or_default(),
        }
    }

    /// The `token_dict` a client sends with confirmations outside demo mode.
    /// `None` until a user refresh token is configured.
    pub fn user_credentials(&self) -> Option<OAuthCredentials> {
        if self.user_refresh_token.trim().is_empty() {
            return None;
        }
        Some(OAuthCredentials {
            refresh_token: Some(self.user_refresh_token.clone()),
            client_id: Some(self.google_client_id.clone()),
            client_secret: Some(self.google_client_secret.clone()),
            token_uri: Some(self.google_token_uri.clone()),
        })
    }
}
