//! Arithmetic Hebrew calendar.
//!
//! Day numbers are fixed "rata die" counts
//! (0001-01-01 proleptic Gregorian is day
//! 1), which is what
//! [`Datelike::num_days_from_ce`] returns.
//! Months are numbered from Nisan = 1, so
//! the civil year starts at Tishrei = 7
//! and a leap year has Adar II = 13.

use chrono::{
  Datelike,
  NaiveDate
};

use crate::annotate::SecondaryCalendar;
use crate::error::CalendarError;

/// Fixed day of 1 Tishrei AM 1.
const EPOCH: i64 = -1_373_427;

const NISAN: u32 = 1;
const TISHREI: u32 = 7;
const ADAR: u32 = 12;
const ADAR_II: u32 = 13;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct HebrewDate {
  pub year:  i64,
  pub month: u32,
  pub day:   u32
}

impl HebrewDate {
  /// Converts a Gregorian date. `None`
  /// before the start of AM 1.
  pub fn from_gregorian(
    date: NaiveDate
  ) -> Option<Self> {
    let fixed =
      i64::from(date.num_days_from_ce());
    if fixed < new_year(1) {
      return None;
    }

    let approx = (fixed - EPOCH) * 98_496
      / 35_975_351
      + 1;
    let mut year = (approx - 1).max(1);
    while new_year(year + 1) <= fixed {
      year += 1;
    }

    let mut month = if fixed
      < fixed_from_hebrew(year, NISAN, 1)
    {
      TISHREI
    } else {
      NISAN
    };
    while fixed
      > fixed_from_hebrew(
        year,
        month,
        days_in_month(year, month)
      )
    {
      month += 1;
    }

    let day = fixed
      - fixed_from_hebrew(year, month, 1)
      + 1;

    Some(Self {
      year,
      month,
      day: day as u32
    })
  }

  pub fn month_name(&self) -> &'static str {
    month_name(self.year, self.month)
  }

  /// `14 Sh'vat 5786`
  pub fn label(&self) -> String {
    format!(
      "{} {} {}",
      self.day,
      self.month_name(),
      self.year
    )
  }
}

pub fn is_leap_year(year: i64) -> bool {
  (7 * year + 1).rem_euclid(19) < 7
}

fn last_month(year: i64) -> u32 {
  if is_leap_year(year) {
    ADAR_II
  } else {
    ADAR
  }
}

fn elapsed_days(year: i64) -> i64 {
  let months =
    (235 * year - 234).div_euclid(19);
  let parts = 12_084 + 13_753 * months;
  let days =
    29 * months + parts.div_euclid(25_920);
  // Molad postponement.
  if (3 * (days + 1)).rem_euclid(7) < 3 {
    days + 1
  } else {
    days
  }
}

fn year_length_correction(
  year: i64
) -> i64 {
  let previous = elapsed_days(year - 1);
  let current = elapsed_days(year);
  let next = elapsed_days(year + 1);

  if next - current == 356 {
    2
  } else if current - previous == 382 {
    1
  } else {
    0
  }
}

fn new_year(year: i64) -> i64 {
  EPOCH
    + elapsed_days(year)
    + year_length_correction(year)
}

pub fn days_in_year(year: i64) -> i64 {
  new_year(year + 1) - new_year(year)
}

pub fn days_in_month(
  year: i64,
  month: u32
) -> u32 {
  let year_len = days_in_year(year);
  let short = match month {
    | 2 | 4 | 6 | 10 | ADAR_II => true,
    | ADAR => !is_leap_year(year),
    // Cheshvan is long only in complete
    // years, Kislev short only in
    // deficient ones.
    | 8 => year_len % 10 != 5,
    | 9 => year_len % 10 == 3,
    | _ => false
  };
  if short { 29 } else { 30 }
}

fn fixed_from_hebrew(
  year: i64,
  month: u32,
  day: u32
) -> i64 {
  let month_days = |range: std::ops::Range<u32>| {
    range
      .map(|m| {
        i64::from(days_in_month(year, m))
      })
      .sum::<i64>()
  };

  let before_month = if month < TISHREI {
    month_days(TISHREI..last_month(year) + 1)
      + month_days(NISAN..month)
  } else {
    month_days(TISHREI..month)
  };

  new_year(year) + before_month
    + i64::from(day)
    - 1
}

fn month_name(
  year: i64,
  month: u32
) -> &'static str {
  match month {
    | 1 => "Nisan",
    | 2 => "Iyyar",
    | 3 => "Sivan",
    | 4 => "Tamuz",
    | 5 => "Av",
    | 6 => "Elul",
    | 7 => "Tishrei",
    | 8 => "Cheshvan",
    | 9 => "Kislev",
    | 10 => "Teves",
    | 11 => "Sh'vat",
    | ADAR if is_leap_year(year) => {
      "Adar I"
    }
    | ADAR => "Adar",
    | _ => "Adar II"
  }
}

/// Labels days with their Hebrew date.
#[derive(
  Debug, Clone, Copy, Default,
)]
pub struct HebrewCalendar;

impl SecondaryCalendar for HebrewCalendar {
  fn convert(
    &self,
    date: NaiveDate
  ) -> Result<String, CalendarError> {
    HebrewDate::from_gregorian(date)
      .map(|hebrew| hebrew.label())
      .ok_or_else(|| {
        CalendarError::ConversionFailure {
          date,
          reason: "date precedes the \
                   Hebrew epoch"
            .to_string()
        }
      })
  }
}
