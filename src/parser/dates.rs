//! Dates embedded in free text: "(od: 12.03.2004 do: 1. 2. 2010)",
//! "Vznik funkcie: 15.06.2015".

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

const DATE: &str = r"(\d{1,2})\s*\.\s*(\d{1,2})\s*\.\s*(\d{4})";

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(DATE).unwrap());
static VALID_FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\bod\s*:\s*{DATE}")).unwrap());
static VALID_UNTIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\bdo\s*:\s*{DATE}")).unwrap());
static APPOINTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)vznik\s+funkcie\s*:\s*{DATE}")).unwrap());
static DISMISSED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)skon[čc]enie\s+funkcie\s*:\s*{DATE}")).unwrap());
static TRAILING_VALIDITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\(\s*od\s*:[^)]*\)\s*$").unwrap());

/// Which pair of labels introduces the two dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLabels {
    /// "od:" / "do:" on every registry entry.
    Validity,
    /// "Vznik funkcie:" / "Skončenie funkcie:" on officers.
    Function,
}

impl DateLabels {
    fn patterns(self) -> (&'static Regex, &'static Regex) {
        match self {
            DateLabels::Validity => (&*VALID_FROM_RE, &*VALID_UNTIL_RE),
            DateLabels::Function => (&*APPOINTED_RE, &*DISMISSED_RE),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
}

impl DateRange {
    /// Look for both labelled dates; either may be missing.
    pub fn scan(text: &str, labels: DateLabels) -> DateRange {
        let (from, until) = labels.patterns();
        let since = from.captures(text).and_then(|c| date_from_captures(&c));
        let until = until.captures(text).and_then(|c| date_from_captures(&c));
        DateRange { since, until }
    }

    pub fn is_empty(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }

    pub fn since_date(&self) -> Option<NaiveDate> {
        self.since.as_deref().and_then(parse_date)
    }

    /// Fill whichever side is missing from `other`.
    pub fn or(self, other: DateRange) -> DateRange {
        DateRange {
            since: self.since.or(other.since),
            until: self.until.or(other.until),
        }
    }
}

fn date_from_captures(caps: &regex::Captures<'_>) -> Option<String> {
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(format_date)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// First D.M.YYYY date in `text`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(text)?;
    NaiveDate::from_ymd_opt(caps[3].parse().ok()?, caps[2].parse().ok()?, caps[1].parse().ok()?)
}

/// First date in `text` rewritten as DD.MM.YYYY.
pub fn normalize_date(text: &str) -> Option<String> {
    parse_date(text).map(format_date)
}

/// Drop a trailing "(od: ...)" validity note.
pub fn strip_validity(text: &str) -> String {
    TRAILING_VALIDITY_RE.replace(text, "").trim().to_string()
}
