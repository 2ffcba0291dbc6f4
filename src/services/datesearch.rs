use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Weekday,
};
use chrono_tz::Tz;
use regex::{Captures, Regex};

pub static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+").unwrap()
});

static RELATIVE_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(day after tomorrow|tomorrow|today|tonight)\b").unwrap()
});

static WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(this|next)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues|tue|wed|thurs|thur|thu|fri|sat|sun)\b",
    )
    .unwrap()
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{2}):(\d{2}))?\b").unwrap()
});

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTHS})\b\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?"
    ))
    .unwrap()
});

static DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({MONTHS})\b(?:,?\s+(\d{{4}})\b)?"
    ))
    .unwrap()
});

static TIME_AMPM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(a\.m\.|p\.m\.|am\b|pm\b)").unwrap()
});

static TIME_24H: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap());

static TIME_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(noon|midnight)\b").unwrap());

static TIME_OCLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})\s*o'?clock\b").unwrap());

static TIME_AT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bat\s+(\d{1,2})\b").unwrap());

/// Free-text date/time search.
///
/// Returns every resolved mention in text order. `now` is both the reference
/// point for relative expressions ("tomorrow", "friday") and the zone every
/// result is expressed in.
pub trait DateSearch: Send + Sync {
    fn search(&self, text: &str, now: DateTime<Tz>) -> Vec<DateTime<Tz>>;
}

/// English date/time expressions, resolved with a preference for the future.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalDateSearch;

#[derive(Debug)]
struct DateToken {
    span: Range<usize>,
    date: NaiveDate,
    time: Option<NaiveTime>,
}

#[derive(Debug)]
struct TimeToken {
    span: Range<usize>,
    time: NaiveTime,
}

impl DateSearch for NaturalDateSearch {
    fn search(&self, text: &str, now: DateTime<Tz>) -> Vec<DateTime<Tz>> {
        let text = mask_emails(text);
        let today = now.date_naive();
        let dates = find_dates(&text, today);
        let times: Vec<TimeToken> = find_times(&text)
            .into_iter()
            .filter(|t| !dates.iter().any(|d| overlaps(&d.span, &t.span)))
            .collect();

        let tz = now.timezone();

        if dates.is_empty() {
            return times
                .iter()
                .filter_map(|t| {
                    let instant = localize(&tz, today.and_time(t.time))?;
                    if instant > now {
                        Some(instant)
                    } else {
                        localize(&tz, (today + Duration::days(1)).and_time(t.time))
                    }
                })
                .collect();
        }

        let current_time = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0);

        dates
            .iter()
            .filter_map(|d| {
                let time = match (d.time, times.first()) {
                    (Some(own), _) => own,
                    (None, Some(t)) => t.time,
                    (None, None) => current_time?,
                };
                localize(&tz, d.date.and_time(time))
            })
            .collect()
    }
}

/// Blanks out email addresses so their local parts and domains ("sat@", "@today.com")
/// never read as dates. Offsets are preserved since addresses are ASCII.
fn mask_emails(text: &str) -> Cow<'_, str> {
    EMAIL_RE.replace_all(text, |caps: &Captures| " ".repeat(caps[0].len()))
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Resolves a wall-clock time in `tz`, skipping forward over a DST gap.
fn localize(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
}

trait Spanned {
    fn span(&self) -> &Range<usize>;
}

impl Spanned for DateToken {
    fn span(&self) -> &Range<usize> {
        &self.span
    }
}

impl Spanned for TimeToken {
    fn span(&self) -> &Range<usize> {
        &self.span
    }
}

/// Earlier patterns win: a token overlapping one already accepted is dropped.
fn push_unique<T: Spanned>(tokens: &mut Vec<T>, token: T) {
    if !tokens.iter().any(|t| overlaps(t.span(), token.span())) {
        tokens.push(token);
    }
}

fn find_dates(text: &str, today: NaiveDate) -> Vec<DateToken> {
    let mut tokens: Vec<DateToken> = Vec::new();

    for caps in ISO_DATE.captures_iter(text) {
        let Some(date) = ymd(&caps, 1, 2, 3) else { continue };
        let time = match (caps.get(4), caps.get(5)) {
            (Some(h), Some(m)) => hm(h.as_str(), m.as_str()),
            _ => None,
        };
        push_unique(&mut tokens, DateToken { span: whole(&caps), date, time });
    }

    for caps in MONTH_DAY.captures_iter(text) {
        if let Some(date) = month_date(&caps[1], &caps[2], caps.get(3).map(|m| m.as_str()), today) {
            push_unique(&mut tokens, DateToken { span: whole(&caps), date, time: None });
        }
    }

    for caps in DAY_MONTH.captures_iter(text) {
        if let Some(date) = month_date(&caps[2], &caps[1], caps.get(3).map(|m| m.as_str()), today) {
            push_unique(&mut tokens, DateToken { span: whole(&caps), date, time: None });
        }
    }

    for caps in RELATIVE_DAY.captures_iter(text) {
        let offset = match caps[1].to_lowercase().as_str() {
            "tomorrow" => 1,
            "day after tomorrow" => 2,
            _ => 0,
        };
        let date = today + Duration::days(offset);
        push_unique(&mut tokens, DateToken { span: whole(&caps), date, time: None });
    }

    for caps in WEEKDAY.captures_iter(text) {
        let Some(target) = weekday(&caps[2]) else { continue };
        let allow_today = caps
            .get(1)
            .is_some_and(|p| p.as_str().eq_ignore_ascii_case("this"));
        let mut ahead = (i64::from(target.num_days_from_monday()) + 7
            - i64::from(today.weekday().num_days_from_monday()))
            % 7;
        if ahead == 0 && !allow_today {
            ahead = 7;
        }
        let date = today + Duration::days(ahead);
        push_unique(&mut tokens, DateToken { span: whole(&caps), date, time: None });
    }

    tokens.sort_by_key(|t| t.span.start);
    tokens
}

fn find_times(text: &str) -> Vec<TimeToken> {
    let mut tokens: Vec<TimeToken> = Vec::new();

    for caps in TIME_AMPM.captures_iter(text) {
        let Ok(hour) = caps[1].parse::<u32>() else { continue };
        let minute = caps.get(2).map(|m| m.as_str()).unwrap_or("0");
        if !(1..=12).contains(&hour) {
            continue;
        }
        let pm = caps[3].to_lowercase().starts_with('p');
        let hour = if pm { hour % 12 + 12 } else { hour % 12 };
        if let Some(time) = hm(&hour.to_string(), minute) {
            push_unique(&mut tokens, TimeToken { span: whole(&caps), time });
        }
    }

    for caps in TIME_24H.captures_iter(text) {
        if let Some(time) = hm(&caps[1], &caps[2]) {
            push_unique(&mut tokens, TimeToken { span: whole(&caps), time });
        }
    }

    for caps in TIME_WORD.captures_iter(text) {
        let hour = if caps[1].eq_ignore_ascii_case("noon") { 12 } else { 0 };
        if let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) {
            push_unique(&mut tokens, TimeToken { span: whole(&caps), time });
        }
    }

    for re in [&*TIME_OCLOCK, &*TIME_AT] {
        for caps in re.captures_iter(text) {
            if let Some(time) = hm(&caps[1], "0") {
                push_unique(&mut tokens, TimeToken { span: whole(&caps), time });
            }
        }
    }

    tokens.sort_by_key(|t| t.span.start);
    tokens
}

fn whole(caps: &Captures) -> Range<usize> {
    caps.get(0).map(|m| m.range()).unwrap_or(0..0)
}

fn hm(hour: &str, minute: &str) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
}

fn ymd(caps: &Captures, y: usize, m: usize, d: usize) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(caps[y].parse().ok()?, caps[m].parse().ok()?, caps[d].parse().ok()?)
}

/// A month-name date; without an explicit year, a day already past rolls over to next year.
fn month_date(month: &str, day: &str, year: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
    let month = month_number(month)?;
    let day: u32 = day.parse().ok()?;

    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year.parse().ok()?, month, day);
    }

    match NaiveDate::from_ymd_opt(today.year(), month, day) {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
    }
}

fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    let n = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

fn weekday(name: &str) -> Option<Weekday> {
    let name = name.to_lowercase();
    let day = match name.get(..3)? {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}
