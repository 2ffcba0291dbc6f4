use chrono::DateTime;
use chrono_tz::Tz;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedIntent {
    pub emails: Vec<String>,
    pub duration_minutes: u32,
    pub anchor: Option<DateTime<Tz>>,
}
