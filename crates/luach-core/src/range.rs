use chrono::NaiveDate;
use tracing::debug;

use crate::calendar::{CalendarRange, DaySkeleton};
use crate::datetime::{has_key_form, iter_days, parse_field, week_end_after, week_start_before};
use crate::error::CalendarError;

/// Checks both inputs and their order before any padding happens. The padded weeks must
/// also stay within four-digit years, where day keys are defined.
pub fn validate_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), CalendarError> {
    let start_date = parse_field(start, "start date")?;
    let end_date = parse_field(end, "end date")?;

    let invalid = |reason| CalendarError::InvalidRange {
        start: start_date,
        end: end_date,
        reason,
    };
    if start_date >= end_date {
        return Err(invalid("start date must be before end date"));
    }
    if !has_key_form(week_start_before(start_date)) || !has_key_form(week_end_after(end_date)) {
        return Err(invalid("padded weeks fall outside years 0000 to 9999"));
    }

    Ok((start_date, end_date))
}

/// Expands `start..=end` to whole Sunday-to-Saturday weeks, one empty skeleton per day.
#[tracing::instrument]
pub fn generate(start: &str, end: &str) -> Result<CalendarRange, CalendarError> {
    let (start, end) = validate_range(start, end)?;

    let start_date = week_start_before(start);
    let end_date = week_end_after(end);
    let days = iter_days(start_date, end_date)
        .map(|day| (day, DaySkeleton::default()))
        .collect();

    let range = CalendarRange {
        start_date,
        end_date,
        secondary_range_label: None,
        days,
    };
    debug!(
        start = %range.start_date,
        end = %range.end_date,
        days = range.days.len(),
        "generated padded range"
    );
    Ok(range)
}
