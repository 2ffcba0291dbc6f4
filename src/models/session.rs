use serde::{Deserialize, Serialize};

use super::slot::ProposalResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Proposed,
    Confirming,
    Confirmed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Proposed => "proposed",
            Phase::Confirming => "confirming",
            Phase::Confirmed => "confirmed",
        }
    }
}

/// Per-session state of the propose/confirm exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfirmationState {
    pub messages: Vec<ChatMessage>,
    pub pending_proposal: Option<ProposalResult>,
    pub lock_held: bool,
    pub retry_count: u32,
    pub confirmed: bool,
    pub last_request_text: Option<String>,
}

impl ConfirmationState {
    pub fn phase(&self) -> Phase {
        if self.lock_held {
            Phase::Confirming
        } else if self.confirmed {
            Phase::Confirmed
        } else if self.pending_proposal.is_some() {
            Phase::Proposed
        } else {
            Phase::Idle
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
        });
    }

    pub fn last_message(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }
}
