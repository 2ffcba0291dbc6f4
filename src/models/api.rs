use serde::{Deserialize, Serialize};

use super::event::{CalendarEvent, CreatedEvent, OAuthCredentials};
use super::slot::ProposalResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProposeResponse {
    Ok(ProposalResult),
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmRequest {
    pub event: CalendarEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_dict: Option<OAuthCredentials>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConfirmResponse {
    Ok { created: CreatedEvent },
    Error { message: String },
}
