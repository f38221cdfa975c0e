use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calendar::{CalendarDay, DayKey, Status};

/// Display category of a day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    Available,
    Partial,
    Unavailable,
    NoData,
}

/// Legend order.
pub const DISPLAY_ORDER: [Availability; 4] = [
    Availability::Available,
    Availability::Partial,
    Availability::Unavailable,
    Availability::NoData,
];

impl Availability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Partial => "partial",
            Self::Unavailable => "unavailable",
            Self::NoData => "no-data",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Partial => "Partially available",
            Self::Unavailable => "Unavailable",
            Self::NoData => "No data",
        }
    }
}

impl From<Status> for Availability {
    fn from(status: Status) -> Self {
        match status {
            Status::Available => Self::Available,
            Status::Partial => Self::Partial,
            Status::Unavailable => Self::Unavailable,
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify(day: &CalendarDay) -> Availability {
    day.status.map_or(Availability::NoData, Availability::from)
}

pub fn collect_distinct(days: &BTreeMap<DayKey, CalendarDay>) -> BTreeSet<Availability> {
    days.values().map(classify).collect()
}

/// The categories present in `days`, in [`DISPLAY_ORDER`].
pub fn legend(days: &BTreeMap<DayKey, CalendarDay>) -> Vec<Availability> {
    let present = collect_distinct(days);
    DISPLAY_ORDER
        .into_iter()
        .filter(|category| present.contains(category))
        .collect()
}
