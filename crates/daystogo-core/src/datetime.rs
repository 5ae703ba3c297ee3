use std::fmt;
use std::sync::OnceLock;

use chrono::{
  Datelike,
  Duration,
  Local,
  NaiveDate,
  NaiveDateTime
};
use regex::Regex;

pub const MS_PER_DAY: i64 = 86_400_000;

/// A wall-clock date as written, with no
/// range checking on month or day.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub struct CalendarDate {
  pub year:  i32,
  pub month: u32,
  pub day:   u32
}

impl CalendarDate {
  #[must_use]
  pub const fn new(
    year: i32,
    month: u32,
    day: u32
  ) -> Self {
    Self {
      year,
      month,
      day
    }
  }

  #[must_use]
  pub fn from_naive(
    date: NaiveDate
  ) -> Self {
    Self {
      year:  date.year(),
      month: date.month(),
      day:   date.day()
    }
  }

  /// Resolves the date on a real calendar.
  /// Month 13 is January of the next
  /// year, day 0 is the last day of the
  /// previous month, and so on.
  #[must_use]
  pub fn to_naive_date(
    self
  ) -> Option<NaiveDate> {
    let months = i64::from(self.year)
      * 12
      + i64::from(self.month)
      - 1;
    let year = i32::try_from(
      months.div_euclid(12)
    )
    .ok()?;
    let month = u32::try_from(
      months.rem_euclid(12)
    )
    .ok()?
      + 1;
    let first =
      NaiveDate::from_ymd_opt(
        year, month, 1
      )?;
    first.checked_add_signed(
      Duration::days(
        i64::from(self.day) - 1
      )
    )
  }

  #[must_use]
  pub fn midnight(
    self
  ) -> Option<NaiveDateTime> {
    self
      .to_naive_date()?
      .and_hms_opt(0, 0, 0)
  }
}

impl fmt::Display for CalendarDate {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:04}-{:02}-{:02}",
      self.year, self.month, self.day
    )
  }
}

fn ymd_pattern() -> &'static Regex {
  static YMD: OnceLock<Regex> =
    OnceLock::new();
  YMD.get_or_init(|| {
    Regex::new(
      r"([0-9]{4})-([0-9]{2})-([0-9]{2})"
    )
    .expect(
      "YYYY-MM-DD pattern must compile"
    )
  })
}

/// Pulls the first `YYYY-MM-DD` out of
/// `input`, wherever it sits.
#[must_use]
pub fn parse_date(
  input: Option<&str>
) -> Option<CalendarDate> {
  let raw = input?;
  if raw.is_empty() {
    return None;
  }

  let caps =
    ymd_pattern().captures(raw)?;
  let year =
    caps.get(1)?.as_str().parse().ok()?;
  let month =
    caps.get(2)?.as_str().parse().ok()?;
  let day =
    caps.get(3)?.as_str().parse().ok()?;

  Some(CalendarDate::new(
    year, month, day
  ))
}

/// Whole days from `reference` to
/// `target`, rounded half away from zero.
#[must_use]
pub fn days_between(
  target: NaiveDateTime,
  reference: NaiveDateTime
) -> i64 {
  let ms = (target - reference)
    .num_milliseconds();
  let half = MS_PER_DAY / 2;
  if ms >= 0 {
    (ms + half) / MS_PER_DAY
  } else {
    -((half - ms) / MS_PER_DAY)
  }
}

/// Day offset between two calendar
/// dates, each taken at midnight.
#[must_use]
pub fn days_between_dates(
  target: CalendarDate,
  reference: NaiveDate
) -> Option<i64> {
  let target = target.midnight()?;
  let reference =
    reference.and_hms_opt(0, 0, 0)?;
  Some(days_between(target, reference))
}

/// The one place the engine's notion of
/// "now" comes from.
pub trait Clock {
  fn now(&self) -> NaiveDateTime;

  fn today(&self) -> NaiveDate {
    self.now().date()
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> NaiveDateTime {
    Local::now().naive_local()
  }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(
  pub NaiveDateTime
);

impl FixedClock {
  #[must_use]
  pub fn at_date(
    date: NaiveDate
  ) -> Self {
    Self(
      date
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
    )
  }
}

impl Clock for FixedClock {
  fn now(&self) -> NaiveDateTime {
    self.0
  }
}
