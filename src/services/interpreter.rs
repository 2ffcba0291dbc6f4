use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use regex::Regex;

use crate::models::ExtractedIntent;
use crate::services::datesearch::{DateSearch, NaturalDateSearch, EMAIL_RE};

pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Parsed when the request mentions no date at all.
pub const FALLBACK_ANCHOR: &str = "tomorrow at 10:00";

static MINUTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:minute|min|mins|minutes)").unwrap());

static HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:hour|hr|hrs|hours)").unwrap());

pub fn extract_emails(text: &str) -> Vec<String> {
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Minutes win over hours; only the first mention of the winning unit counts.
/// A zero or unrepresentable count falls back to the default.
pub fn extract_duration(text: &str) -> u32 {
    let minutes = match MINUTES_RE.captures(text) {
        Some(caps) => caps[1].parse::<u32>().ok(),
        None => HOURS_RE
            .captures(text)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .and_then(|h| h.checked_mul(60)),
    };

    minutes
        .filter(|m| *m > 0)
        .unwrap_or(DEFAULT_DURATION_MINUTES)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnchorRounding {
    #[default]
    Verbatim,
    FloorToHour,
}

impl AnchorRounding {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "floor_to_hour" | "hour" => AnchorRounding::FloorToHour,
            _ => AnchorRounding::Verbatim,
        }
    }

    pub fn apply(&self, anchor: DateTime<Tz>) -> DateTime<Tz> {
        match self {
            AnchorRounding::Verbatim => anchor,
            AnchorRounding::FloorToHour => anchor
                .with_minute(0)
                .and_then(|a| a.with_second(0))
                .and_then(|a| a.with_nanosecond(0))
                .unwrap_or(anchor),
        }
    }
}

pub struct TextInterpreter {
    search: Arc<dyn DateSearch>,
    timezone: Tz,
    rounding: AnchorRounding,
}

impl TextInterpreter {
    pub fn new(timezone: Tz) -> Self {
        Self::with_search(Arc::new(NaturalDateSearch), timezone)
    }

    pub fn with_search(search: Arc<dyn DateSearch>, timezone: Tz) -> Self {
        Self {
            search,
            timezone,
            rounding: AnchorRounding::default(),
        }
    }

    pub fn with_rounding(mut self, rounding: AnchorRounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn interpret(&self, text: &str) -> ExtractedIntent {
        self.interpret_at(text, Utc::now())
    }

    pub fn interpret_at(&self, text: &str, now: DateTime<Utc>) -> ExtractedIntent {
        ExtractedIntent {
            emails: extract_emails(text),
            duration_minutes: extract_duration(text),
            anchor: self.resolve_anchor_datetime_at(text, now),
        }
    }

    pub fn resolve_anchor_datetime(&self, text: &str) -> Option<DateTime<Tz>> {
        self.resolve_anchor_datetime_at(text, Utc::now())
    }

    /// First date mentioned in `text`, else tomorrow at 10:00, in the configured zone.
    pub fn resolve_anchor_datetime_at(
        &self,
        text: &str,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Tz>> {
        let now = now.with_timezone(&self.timezone);

        let found = self.search.search(text, now).into_iter().next();

        let anchor = match found {
            Some(anchor) => Some(anchor),
            None => {
                tracing::debug!(fallback = FALLBACK_ANCHOR, "no date in request, using fallback");
                self.search.search(FALLBACK_ANCHOR, now).into_iter().next()
            }
        };

        anchor.map(|a| self.rounding.apply(a))
    }
}
