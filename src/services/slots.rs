use chrono::{DateTime, Duration};
use chrono_tz::Tz;

use crate::models::Slot;

/// How far apart consecutive candidate slots start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlotSpacing {
    /// One hour apart regardless of duration; meetings longer than an hour overlap.
    #[default]
    FixedHour,
    /// One hour apart, or one meeting length apart when that is longer.
    BackToBack,
}

impl SlotSpacing {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "back_to_back" | "duration" => SlotSpacing::BackToBack,
            _ => SlotSpacing::FixedHour,
        }
    }

    pub fn stride_minutes(&self, duration_minutes: u32) -> i64 {
        match self {
            SlotSpacing::FixedHour => 60,
            SlotSpacing::BackToBack => i64::from(duration_minutes).max(60),
        }
    }
}

pub fn generate_slots(
    anchor: DateTime<Tz>,
    duration_minutes: u32,
    count: usize,
    spacing: SlotSpacing,
) -> Vec<Slot> {
    let stride = spacing.stride_minutes(duration_minutes);
    let length = Duration::minutes(i64::from(duration_minutes));

    (0..count as i64)
        .map(|i| {
            let start = anchor + Duration::minutes(stride * i);
            let end = start + length;
            Slot {
                start: start.fixed_offset(),
                end: end.fixed_offset(),
                label: format_label(&start, &end),
            }
        })
        .collect()
}

pub fn format_label(start: &DateTime<Tz>, end: &DateTime<Tz>) -> String {
    format!(
        "{} - {} ({})",
        start.format("%Y-%m-%d %H:%M"),
        end.format("%H:%M"),
        start.timezone().name()
    )
}
