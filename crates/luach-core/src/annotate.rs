use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::calendar::{CalendarRange, DaySkeleton};
use crate::error::CalendarError;

/// Joins the first and last day labels into the range label.
pub const RANGE_SEPARATOR: &str = " \u{2013} ";

/// Converts a Gregorian day into a label in some other calendar system.
pub trait SecondaryCalendar {
    fn convert(&self, date: NaiveDate) -> Result<String, CalendarError>;
}

pub fn format_range_label(first: &str, last: &str) -> String {
    format!("{first}{RANGE_SEPARATOR}{last}")
}

/// Returns a copy of `range` with every day labelled and the range label set.
///
/// Labels are collected by day key and only attached once every conversion succeeded; the
/// first failing day aborts the whole annotation.
#[tracing::instrument(skip_all, fields(days = range.days.len()))]
pub fn annotate<C>(range: &CalendarRange, calendar: &C) -> Result<CalendarRange, CalendarError>
where
    C: SecondaryCalendar + ?Sized,
{
    let labels = range
        .days
        .keys()
        .map(|day| calendar.convert(*day).map(|label| (*day, label)))
        .collect::<Result<BTreeMap<NaiveDate, String>, CalendarError>>()?;

    let secondary_range_label = match (labels.values().next(), labels.values().next_back()) {
        (Some(first), Some(last)) => Some(format_range_label(first, last)),
        _ => None,
    };

    let days = labels
        .into_iter()
        .map(|(day, label)| {
            (
                day,
                DaySkeleton {
                    secondary_label: Some(label),
                },
            )
        })
        .collect();

    debug!(label = ?secondary_range_label, "annotated range");
    Ok(CalendarRange {
        start_date: range.start_date,
        end_date: range.end_date,
        secondary_range_label,
        days,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::NaiveDate;

    use super::{SecondaryCalendar, annotate};
    use crate::datetime::{format_key, parse_key};
    use crate::error::CalendarError;
    use crate::hebrew::HebrewCalendar;
    use crate::range::generate;

    /// Labels each day with its own key and records the call order.
    #[derive(Default)]
    struct EchoCalendar {
        calls: RefCell<Vec<NaiveDate>>,
    }

    impl SecondaryCalendar for EchoCalendar {
        fn convert(&self, date: NaiveDate) -> Result<String, CalendarError> {
            self.calls.borrow_mut().push(date);
            Ok(format!("echo {}", format_key(date)))
        }
    }

    struct FailingOn(NaiveDate);

    impl SecondaryCalendar for FailingOn {
        fn convert(&self, date: NaiveDate) -> Result<String, CalendarError> {
            if date == self.0 {
                return Err(CalendarError::ConversionFailure {
                    date,
                    reason: "offline".to_string(),
                });
            }
            Ok("ok".to_string())
        }
    }

    #[test]
    fn labels_every_day_with_hebrew_dates() {
        let range = generate("2026-02-01", "2026-02-28").expect("generate");
        let annotated = annotate(&range, &HebrewCalendar).expect("annotate");

        let first = parse_key("2026-02-01").expect("key");
        let last = parse_key("2026-02-28").expect("key");
        assert_eq!(annotated.days[&first].secondary_label.as_deref(), Some("14 Sh'vat 5786"));
        assert_eq!(annotated.days[&last].secondary_label.as_deref(), Some("11 Adar 5786"));
        assert!(annotated.days.values().all(|day| day.secondary_label.is_some()));
        assert_eq!(
            annotated.secondary_range_label.as_deref(),
            Some("14 Sh'vat 5786 \u{2013} 11 Adar 5786")
        );
    }

    #[test]
    fn padded_range_label_spans_padding() {
        let range = generate("2026-02-04", "2026-04-01").expect("generate");
        let annotated = annotate(&range, &HebrewCalendar).expect("annotate");
        assert_eq!(
            annotated.secondary_range_label.as_deref(),
            Some("14 Sh'vat 5786 \u{2013} 17 Nisan 5786")
        );
    }

    #[test]
    fn leaves_input_untouched_and_keeps_keys() {
        let range = generate("2026-02-01", "2026-02-07").expect("generate");
        let calendar = EchoCalendar::default();
        let annotated = annotate(&range, &calendar).expect("annotate");

        assert!(range.days.values().all(|day| day.secondary_label.is_none()));
        assert_eq!(range.secondary_range_label, None);
        assert_eq!(
            annotated.days.keys().collect::<Vec<_>>(),
            range.days.keys().collect::<Vec<_>>()
        );
        for (day, skeleton) in &annotated.days {
            assert_eq!(
                skeleton.secondary_label.as_deref(),
                Some(format!("echo {}", format_key(*day)).as_str())
            );
        }
        assert_eq!(calendar.calls.borrow().len(), 7);
        assert_eq!(annotated.start_date, range.start_date);
        assert_eq!(annotated.end_date, range.end_date);
    }

    #[test]
    fn single_failure_aborts_annotation() {
        let range = generate("2026-02-01", "2026-02-07").expect("generate");
        let bad_day = parse_key("2026-02-05").expect("key");

        let err = annotate(&range, &FailingOn(bad_day)).expect_err("must fail");
        assert_eq!(
            err,
            CalendarError::ConversionFailure {
                date: bad_day,
                reason: "offline".to_string(),
            }
        );
    }
}
