use std::collections::BTreeMap;

use tracing::debug;

use crate::calendar::{
    CalendarData, CalendarDay, CalendarRange, DEFAULT_TITLE, OverrideDoc, Status, StatusOverride,
};
use crate::datetime::{format_key, is_eve_of_rest_day, is_rest_day};

/// Combines a generated range with the user's override document.
///
/// The range decides which days exist, their order and the date fields. Override entries
/// only customize days the range already has; keys outside it are dropped, unknown statuses
/// and empty notes count as absent. The weekly rule runs last and cannot be overridden:
/// the rest day is always `unavailable`, and `available` on its eve becomes `partial`.
#[tracing::instrument(skip_all, fields(days = range.days.len(), overrides = overrides.days.len()))]
pub fn merge(range: &CalendarRange, overrides: &OverrideDoc) -> CalendarData {
    let mut matched = 0usize;
    let mut ruled = 0usize;

    let days: BTreeMap<_, _> = range
        .days
        .iter()
        .map(|(key, skeleton)| {
            let entry = overrides.days.get(&format_key(*key));
            if entry.is_some() {
                matched += 1;
            }

            let mut day = CalendarDay {
                secondary_label: skeleton.secondary_label.clone(),
                ..CalendarDay::default()
            };
            apply_override(&mut day, entry);

            let before = day.status;
            apply_weekly_rule(&mut day, *key);
            if day.status != before {
                ruled += 1;
            }

            (*key, day)
        })
        .collect();

    debug!(
        matched,
        ignored = overrides.days.len() - matched,
        weekly_rule_changes = ruled,
        "merged override document"
    );

    let title = overrides
        .title
        .as_deref()
        .filter(|title| !title.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string();

    CalendarData {
        title,
        start_date: range.start_date,
        end_date: range.end_date,
        secondary_range_label: range.secondary_range_label.clone(),
        days,
    }
}

fn apply_override(day: &mut CalendarDay, entry: Option<&StatusOverride>) {
    let Some(entry) = entry else {
        return;
    };

    day.status = entry.status.as_deref().and_then(Status::parse);
    day.notes = entry.notes.clone().filter(|notes| !notes.is_empty());
}

fn apply_weekly_rule(day: &mut CalendarDay, key: chrono::NaiveDate) {
    if is_rest_day(key) {
        day.status = Some(Status::Unavailable);
    } else if is_eve_of_rest_day(key) && day.status == Some(Status::Available) {
        day.status = Some(Status::Partial);
    }
}
