use anyhow::{Context, anyhow};
use chrono::Datelike;
use serde::Serialize;
use tracing::{debug, warn};

use crate::availability::{Availability, legend};
use crate::calendar::{CalendarData, CalendarRange, OverrideDoc};
use crate::datetime::{WEEK_END, WEEK_START, format_key, has_key_form};
use crate::literal::parse_assignment;

/// Binding the generated range is assigned to.
pub const DATES_BINDING: &str = "CALENDAR_DATES";
/// Binding of the hand-written override document.
pub const STATUSES_BINDING: &str = "CALENDAR_STATUSES";
/// Binding of the merged calendar the page renders.
pub const DATA_BINDING: &str = "CALENDAR_DATA";

/// Renders the range as the generated `CALENDAR_DATES` module.
///
/// One line per day in key order; strings are quoted with JSON escaping. The output only
/// depends on the range, so regenerating an unchanged range rewrites identical bytes.
pub fn serialize_range(range: &CalendarRange) -> String {
    let mut lines = vec![
        format!("const {DATES_BINDING} = {{"),
        format!("  startDate: {},", quote(&format_key(range.start_date))),
        format!("  endDate: {},", quote(&format_key(range.end_date))),
    ];
    if let Some(label) = &range.secondary_range_label {
        lines.push(format!("  secondaryRangeLabel: {},", quote(label)));
    }

    lines.push("  days: {".to_string());
    lines.extend(range.days.iter().map(|(day, skeleton)| {
        let key = quote(&format_key(*day));
        match &skeleton.secondary_label {
            Some(label) => format!("    {key}: {{ secondaryLabel: {} }},", quote(label)),
            None => format!("    {key}: {{}},"),
        }
    }));
    lines.push("  },".to_string());
    lines.push("};".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn quote(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

/// Reads a `CALENDAR_DATES` module back into a range.
#[tracing::instrument(skip(text))]
pub fn parse_range(text: &str) -> anyhow::Result<CalendarRange> {
    let assignment = parse_assignment(text)?;
    check_binding(assignment.name.as_deref(), DATES_BINDING);

    let range: CalendarRange =
        serde_json::from_value(assignment.value).context("generated range has unexpected shape")?;
    check_range_shape(&range).context("generated range is not a whole-week calendar")?;

    debug!(days = range.days.len(), "parsed generated range");
    Ok(range)
}

/// Reads an override document written as a `CALENDAR_STATUSES` module.
#[tracing::instrument(skip(text))]
pub fn parse_overrides_js(text: &str) -> anyhow::Result<OverrideDoc> {
    let assignment = parse_assignment(text)?;
    check_binding(assignment.name.as_deref(), STATUSES_BINDING);
    serde_json::from_value(assignment.value).context("override document has unexpected shape")
}

/// Reads an override document written as TOML.
#[tracing::instrument(skip(text))]
pub fn parse_overrides_toml(text: &str) -> anyhow::Result<OverrideDoc> {
    toml::from_str(text).context("override document is not valid TOML")
}

/// A range must cover whole Sunday-to-Saturday weeks with one entry per day, and its
/// dates must match its first and last keys.
fn check_range_shape(range: &CalendarRange) -> anyhow::Result<()> {
    let (Some(first), Some(last)) = (range.days.keys().next(), range.days.keys().next_back())
    else {
        return Err(anyhow!("range has no days"));
    };

    if *first != range.start_date || *last != range.end_date {
        return Err(anyhow!(
            "days run {} to {} but the range says {} to {}",
            format_key(*first),
            format_key(*last),
            format_key(range.start_date),
            format_key(range.end_date)
        ));
    }
    if !has_key_form(range.start_date) || !has_key_form(range.end_date) {
        return Err(anyhow!("range dates must have four-digit years"));
    }
    if range.start_date.weekday() != WEEK_START || range.end_date.weekday() != WEEK_END {
        return Err(anyhow!(
            "range {} to {} does not run {WEEK_START} to {WEEK_END}",
            format_key(range.start_date),
            format_key(range.end_date)
        ));
    }

    let span = (range.end_date - range.start_date).num_days() + 1;
    if usize::try_from(span).ok() != Some(range.days.len()) {
        return Err(anyhow!(
            "range spans {span} days but lists {}",
            range.days.len()
        ));
    }

    Ok(())
}

fn check_binding(found: Option<&str>, expected: &str) {
    if let Some(name) = found
        && name != expected
    {
        warn!(found = name, expected, "unexpected binding name; reading anyway");
    }
}

#[derive(Debug, Serialize)]
struct Published<'a> {
    #[serde(flatten)]
    calendar: &'a CalendarData,
    legend: Vec<Availability>,
}

/// Renders the merged calendar, plus its legend, as the `CALENDAR_DATA` module.
pub fn serialize_published(data: &CalendarData) -> anyhow::Result<String> {
    let published = Published {
        calendar: data,
        legend: legend(&data.days),
    };
    let json = serde_json::to_string_pretty(&published).context("failed to encode calendar")?;
    Ok(format!("const {DATA_BINDING} = {json};\n"))
}
