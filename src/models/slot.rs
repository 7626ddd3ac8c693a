use serde::{Deserialize, Serialize};

use super::{Mode, Priority};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub id: i64,
    pub clinic: String,
    pub time: String,
    pub priority: Priority,
    pub mode: Mode,
    pub is_booked: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Day,
    Evening,
    #[default]
    Any,
}

impl TimeOfDay {
    /// Half-open hour range `[start, end)` searched for this bucket.
    pub fn hour_range(&self) -> (u32, u32) {
        match self {
            TimeOfDay::Morning => (8, 11),
            TimeOfDay::Day => (11, 17),
            TimeOfDay::Evening => (17, 19),
            TimeOfDay::Any => (8, 19),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Day => "Day",
            TimeOfDay::Evening => "Evening",
            TimeOfDay::Any => "Any",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Morning" => TimeOfDay::Morning,
            "Day" => TimeOfDay::Day,
            "Evening" => TimeOfDay::Evening,
            _ => TimeOfDay::Any,
        }
    }
}

/// Renders minutes after midnight as zero-padded `HH:MM`.
pub fn format_minute(minute: u32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}
