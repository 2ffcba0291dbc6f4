use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::ProposalResult;
use crate::services::interpreter::TextInterpreter;
use crate::services::slots::{generate_slots, SlotSpacing};

pub const MEETING_SUMMARY: &str = "Meeting";
pub const DEFAULT_SLOT_COUNT: usize = 3;

pub struct ProposalService {
    interpreter: TextInterpreter,
    spacing: SlotSpacing,
}

impl ProposalService {
    pub fn new(interpreter: TextInterpreter, spacing: SlotSpacing) -> Self {
        Self {
            interpreter,
            spacing,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let interpreter =
            TextInterpreter::new(config.timezone).with_rounding(config.anchor_rounding);
        Self::new(interpreter, config.slot_spacing)
    }

    pub fn propose(&self, text: &str, count: usize) -> Result<ProposalResult, AppError> {
        self.propose_at(text, count, Utc::now())
    }

    pub fn propose_at(
        &self,
        text: &str,
        count: usize,
        now: DateTime<Utc>,
    ) -> Result<ProposalResult, AppError> {
        tracing::info!(prompt = %text, "incoming propose request");

        let intent = self.interpreter.interpret_at(text, now);
        let anchor = intent.anchor.ok_or(AppError::NoDateResolved)?;

        let slots = generate_slots(anchor, intent.duration_minutes, count, self.spacing);

        tracing::debug!(
            anchor = %anchor,
            duration = intent.duration_minutes,
            emails = intent.emails.len(),
            slots = slots.len(),
            "proposed slots"
        );

        Ok(ProposalResult {
            summary: MEETING_SUMMARY.to_string(),
            duration_minutes: intent.duration_minutes,
            emails: intent.emails,
            slots,
        })
    }
}
