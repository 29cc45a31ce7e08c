// src/model.rs

use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

/// Fallback location attached to imported rows that carry none of their own,
/// typically the uploading user's own site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultLocation {
    pub id: String,
    pub name: String,
}

/// A field worker that can be assigned to jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operative {
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operative_type: Option<String>,
    /// Normalized to `HH:MM`, 24-hour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_end_time: Option<String>,
    /// Seven characters of `0`/`1`, Monday first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_days_available: Option<String>,
}

/// A unit of work with an arrival/deadline window and an estimated duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub duration_min: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operative_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-text assignee name carried through from the upload, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operative: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Domain-level request handed to the assignment adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterRequest {
    pub operatives: Vec<Operative>,
    pub jobs: Vec<Job>,
}

/// Location as resolved by the assignment service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterLocation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub address: String,
}

/// One entry of the unified roster: either assigned (operative name and start
/// time present) or unassigned (both absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosteredJob {
    pub id: String,
    pub entry_time: String,
    pub exit_time: String,
    pub duration_min: i64,
    pub location: RosterLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operative_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterResponse {
    pub jobs: Vec<RosteredJob>,
    pub message: String,
}

pub const DAYS_AVAILABLE_LEN: usize = 7;

const WEEK: [Weekday; DAYS_AVAILABLE_LEN] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Decodes a Monday-first `0`/`1` availability mask into the set of available
/// weekdays. Returns `None` when the mask is malformed.
pub fn days_from_mask(mask: &str) -> Option<Vec<Weekday>> {
    if mask.len() != DAYS_AVAILABLE_LEN || !mask.chars().all(|c| c == '0' || c == '1') {
        return None;
    }
    Some(
        mask.chars()
            .zip(WEEK.iter())
            .filter(|(c, _)| *c == '1')
            .map(|(_, day)| *day)
            .collect(),
    )
}

/// Encodes a set of weekdays back into the Monday-first `0`/`1` mask.
pub fn mask_from_days(days: &[Weekday]) -> String {
    WEEK.iter()
        .map(|day| if days.contains(day) { '1' } else { '0' })
        .collect()
}
