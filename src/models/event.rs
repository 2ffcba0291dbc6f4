use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::config::GOOGLE_TOKEN_URI;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// OAuth fields needed to act on a user's calendar (the `token_dict` on the wire).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OAuthCredentials {
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

/// Credentials that passed validation; every field is non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCredentials {
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub token_uri: String,
}

impl OAuthCredentials {
    pub fn validate(&self) -> Result<ValidCredentials, AppError> {
        fn required(name: &str, value: &Option<String>) -> Result<String, AppError> {
            match value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => Err(AppError::Config(format!("Missing required OAuth field: {name}"))),
            }
        }

        Ok(ValidCredentials {
            refresh_token: required("refresh_token", &self.refresh_token)?,
            client_id: required("client_id", &self.client_id)?,
            client_secret: required("client_secret", &self.client_secret)?,
            token_uri: self
                .token_uri
                .clone()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string()),
        })
    }
}
