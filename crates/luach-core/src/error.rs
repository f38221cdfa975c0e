use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised by the calendar pipeline before anything is written.
///
/// Loader and filesystem layers wrap these in `anyhow` with context; the
/// merge step never produces one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
  #[error(
    "invalid {field}: {value} \
     (expected YYYY-MM-DD)"
  )]
  InvalidFormat {
    field: &'static str,
    value: String
  },

  #[error(
    "invalid date range {start} to \
     {end}: {reason}"
  )]
  InvalidRange {
    start:  NaiveDate,
    end:    NaiveDate,
    reason: &'static str
  },

  #[error("usage: {usage}")]
  MissingArgument { usage: &'static str },

  #[error(
    "secondary calendar conversion \
     failed for {date}: {reason}"
  )]
  ConversionFailure {
    date:   NaiveDate,
    reason: String
  },

  #[error(
    "parent directory does not exist: \
     {}",
    parent.display()
  )]
  DestinationUnavailable { parent: PathBuf }
}
