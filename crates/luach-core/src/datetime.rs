use std::sync::OnceLock;

use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Weekday
};
use regex::Regex;

use crate::error::CalendarError;

/// Canonical textual form of a day key.
pub const DAY_KEY_FORMAT: &str =
  "%Y-%m-%d";

/// Every generated range starts on this
/// weekday.
pub const WEEK_START: Weekday =
  Weekday::Sun;

/// Every generated range ends on this
/// weekday.
pub const WEEK_END: Weekday =
  Weekday::Sat;

pub const REST_DAY: Weekday =
  Weekday::Sat;

pub const REST_DAY_EVE: Weekday =
  Weekday::Fri;

fn has_key_shape(raw: &str) -> bool {
  static KEY_PATTERN: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  KEY_PATTERN
    .get_or_init(|| {
      Regex::new(
        r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$"
      )
      .ok()
    })
    .as_ref()
    .is_some_and(|re| re.is_match(raw))
}

/// Parses a `YYYY-MM-DD` day key.
///
/// The shape check is strict (four-digit
/// year, two-digit month and day). Beyond
/// that, legality is whatever
/// [`NaiveDate`] accepts, so `2026-02-30`
/// is rejected as well.
pub fn parse_key(
  raw: &str
) -> Result<NaiveDate, CalendarError> {
  parse_field(raw, "day key")
}

pub(crate) fn parse_field(
  raw: &str,
  field: &'static str
) -> Result<NaiveDate, CalendarError> {
  let invalid = || {
    CalendarError::InvalidFormat {
      field,
      value: raw.to_string()
    }
  };

  if !has_key_shape(raw) {
    return Err(invalid());
  }

  NaiveDate::parse_from_str(
    raw,
    DAY_KEY_FORMAT
  )
  .map_err(|_| invalid())
}

/// Whether `date` has a four-digit year,
/// so its key round-trips through
/// [`parse_key`].
#[must_use]
pub fn has_key_form(
  date: NaiveDate
) -> bool {
  (0..=9999).contains(&date.year())
}

#[must_use]
pub fn format_key(
  date: NaiveDate
) -> String {
  date.format(DAY_KEY_FORMAT).to_string()
}

/// Returns `date` itself when it is a
/// Sunday, else the closest earlier
/// Sunday.
#[must_use]
pub fn week_start_before(
  date: NaiveDate
) -> NaiveDate {
  let back = date
    .weekday()
    .days_since(WEEK_START)
    as i64;
  date
    .checked_sub_signed(Duration::days(
      back
    ))
    .unwrap_or(date)
}

/// Returns `date` itself when it is a
/// Saturday, else the closest later
/// Saturday.
#[must_use]
pub fn week_end_after(
  date: NaiveDate
) -> NaiveDate {
  let ahead = WEEK_END
    .days_since(date.weekday())
    as i64;
  date
    .checked_add_signed(Duration::days(
      ahead
    ))
    .unwrap_or(date)
}

#[must_use]
pub fn is_rest_day(
  date: NaiveDate
) -> bool {
  date.weekday() == REST_DAY
}

#[must_use]
pub fn is_eve_of_rest_day(
  date: NaiveDate
) -> bool {
  date.weekday() == REST_DAY_EVE
}

/// Inclusive ascending walk over calendar
/// days. Empty when `end < start`.
#[derive(Debug, Clone)]
pub struct DayIter {
  next: Option<NaiveDate>,
  end:  NaiveDate
}

impl Iterator for DayIter {
  type Item = NaiveDate;

  fn next(&mut self) -> Option<Self::Item> {
    let current = self.next?;
    if current > self.end {
      self.next = None;
      return None;
    }
    self.next = current.succ_opt();
    Some(current)
  }

  fn size_hint(
    &self
  ) -> (usize, Option<usize>) {
    let remaining = match self.next {
      | Some(next) if next <= self.end => {
        (self.end - next).num_days()
          as usize
          + 1
      }
      | _ => 0
    };
    (remaining, Some(remaining))
  }
}

impl ExactSizeIterator for DayIter {}

#[must_use]
pub fn iter_days(
  start: NaiveDate,
  end: NaiveDate
) -> DayIter {
  DayIter {
    next: Some(start),
    end
  }
}

/// `Feb 1`
#[must_use]
pub fn format_short(
  date: NaiveDate
) -> String {
  date.format("%b %-d").to_string()
}

/// `February 1`
#[must_use]
pub fn format_long(
  date: NaiveDate
) -> String {
  date.format("%B %-d").to_string()
}

/// `February 1, 2026`
#[must_use]
pub fn format_long_with_year(
  date: NaiveDate
) -> String {
  date.format("%B %-d, %Y").to_string()
}
