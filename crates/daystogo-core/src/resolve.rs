//! Finding a task's date and turning free text into `YYYY-MM-DD`.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::config::Settings;
use crate::datetime::CalendarDate;
use crate::task::TaskSnapshot;

/// A month/day token this far in the past is read as next year's.
pub const NEXT_YEAR_THRESHOLD_DAYS: i64 = 180;

/// Which source a [`DateInfo`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Due,
    Datetime,
    Deadline,
}

impl Provenance {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Due => "due",
            Self::Datetime => "datetime",
            Self::Deadline => "deadline",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInfo {
    pub date: String,
    pub provenance: Provenance,
}

impl DateInfo {
    pub fn new(date: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            date: date.into(),
            provenance,
        }
    }
}

/// Reads the last date token in `text` as the deadline.
///
/// Only month and day are written in the text, so the year is guessed from
/// `today`: the current year, unless that puts the date more than
/// [`NEXT_YEAR_THRESHOLD_DAYS`] in the past.
#[instrument(skip(text, settings), fields(locale = %settings.locale))]
pub fn extract_deadline_from_text(
    text: &str,
    settings: &Settings,
    today: NaiveDate,
) -> Option<DateInfo> {
    let locale = settings.locale.definition();
    let matches = locale.date_matches(text);
    let Some(last) = matches.last() else {
        trace!("no date token in text");
        return None;
    };

    let parsed = locale.parse_match(last)?;
    if parsed.month == 0 || parsed.day == 0 {
        debug!(?parsed, "date token has a zero component");
        return None;
    }

    let year = infer_year(parsed.month, parsed.day, today);
    let date = CalendarDate::new(year, parsed.month, parsed.day);
    debug!(
        token = last.get(0).map(|m| m.as_str()).unwrap_or_default(),
        candidates = matches.len(),
        %date,
        "resolved deadline from text"
    );
    Some(DateInfo::new(date.to_string(), Provenance::Deadline))
}

fn infer_year(month: u32, day: u32, today: NaiveDate) -> i32 {
    let year = today.year();
    let Some(candidate) = CalendarDate::new(year, month, day).to_naive_date() else {
        return year;
    };

    let gap = (today - candidate).num_days();
    if candidate < today && gap > NEXT_YEAR_THRESHOLD_DAYS {
        trace!(%candidate, gap, "candidate far in the past; assuming next year");
        year + 1
    } else {
        year
    }
}

/// Tries the row's sources in order: due-date attribute, `datetime`
/// attributes, then the row text.
#[instrument(skip_all, fields(task = snapshot.display_id()))]
pub fn extract_date_from_task(
    snapshot: &TaskSnapshot,
    settings: &Settings,
    today: NaiveDate,
) -> Option<DateInfo> {
    if let Some(due) = snapshot.due_date.as_deref().filter(|v| !v.is_empty()) {
        trace!(due, "using due-date attribute");
        return Some(DateInfo::new(due, Provenance::Due));
    }

    if let Some(datetime) = snapshot.datetimes.iter().find(|v| !v.is_empty()) {
        trace!(datetime = %datetime, "using datetime attribute");
        return Some(DateInfo::new(datetime.as_str(), Provenance::Datetime));
    }

    extract_deadline_from_text(&snapshot.text, settings, today)
}
