use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Calendar day used as the unique key of every day mapping. Serialized as `YYYY-MM-DD`.
pub type DayKey = NaiveDate;

/// Title used when the override document carries none.
pub const DEFAULT_TITLE: &str = "My Availability";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Available,
    Partial,
    Unavailable,
}

impl Status {
    /// Recognizes exactly the three lowercase status names; anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "available" => Some(Self::Available),
            "partial" => Some(Self::Partial),
            "unavailable" => Some(Self::Unavailable),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Partial => "partial",
            Self::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DaySkeleton {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRange {
    pub start_date: DayKey,
    pub end_date: DayKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_range_label: Option<String>,
    pub days: BTreeMap<DayKey, DaySkeleton>,
}

/// One hand-authored entry of the override document.
///
/// Status is kept raw so unknown names survive loading; the merge step decides what counts.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StatusOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl<'de> Deserialize<'de> for StatusOverride {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self {
            status: string_field(&raw, "status"),
            notes: string_field(&raw, "notes"),
        })
    }
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

/// User override document. Keys stay as authored so malformed dates simply never match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverrideDoc {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(default)]
    pub days: BTreeMap<String, StatusOverride>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_str().map(str::to_string))
}

impl From<&CalendarData> for OverrideDoc {
    fn from(data: &CalendarData) -> Self {
        let days = data
            .days
            .iter()
            .map(|(key, day)| {
                (
                    crate::datetime::format_key(*key),
                    StatusOverride {
                        status: day.status.map(|s| s.as_str().to_string()),
                        notes: day.notes.clone(),
                    },
                )
            })
            .collect();
        Self {
            title: Some(data.title.clone()),
            days,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Merged calendar ready for display. Built once by [`crate::merge::merge`] and only read after.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarData {
    pub title: String,
    pub start_date: DayKey,
    pub end_date: DayKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_range_label: Option<String>,
    pub days: BTreeMap<DayKey, CalendarDay>,
}

#[cfg(test)]
mod tests {
    use super::{OverrideDoc, Status};

    #[test]
    fn parses_only_known_statuses() {
        assert_eq!(Status::parse("available"), Some(Status::Available));
        assert_eq!(Status::parse("partial"), Some(Status::Partial));
        assert_eq!(Status::parse("unavailable"), Some(Status::Unavailable));
        assert_eq!(Status::parse("Available"), None);
        assert_eq!(Status::parse("banana"), None);
    }

    #[test]
    fn override_doc_tolerates_odd_values() {
        let doc: OverrideDoc = serde_json::from_str(
            r#"{
                "title": 42,
                "days": {
                    "2026-02-01": { "status": "banana", "notes": 7 },
                    "2026-02-02": "not an object",
                    "2026-02-03": { "status": "partial", "notes": "after 3pm" }
                }
            }"#,
        )
        .expect("lenient parse");

        assert_eq!(doc.title, None);
        assert_eq!(doc.days.len(), 3);
        assert_eq!(doc.days["2026-02-01"].status.as_deref(), Some("banana"));
        assert_eq!(doc.days["2026-02-01"].notes, None);
        assert_eq!(doc.days["2026-02-02"], Default::default());
        assert_eq!(doc.days["2026-02-03"].notes.as_deref(), Some("after 3pm"));
    }

    #[test]
    fn override_doc_defaults_when_empty() {
        let doc: OverrideDoc = serde_json::from_str("{}").expect("empty doc");
        assert_eq!(doc, OverrideDoc::default());
    }
}
