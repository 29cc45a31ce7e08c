// src/row_parser.rs
//
// Row normalizers: convert one mapped raw record into a validated, typed
// domain record. One parser per import kind, sharing the tolerant value
// parsers for times, date-times, email and phone.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::column_match::ColumnMapping;
use crate::model::{Client, DefaultLocation, Job, Operative};
use crate::tabular::{RawRecord, RawTable};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

lazy_static! {
    // Classic loose email shape, deliberately not RFC-complete.
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^[0-9\s()+\-]+$").unwrap();
    static ref DAYS_AVAILABLE_RE: Regex = Regex::new(r"^[01]{7}$").unwrap();

    // Tolerated time-of-day shapes, tried in order.
    static ref TIME_SHAPES: Vec<Regex> = vec![
        Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap(),
        Regex::new(r"^(\d{1,2}):(\d{2}):\d{2}$").unwrap(),
        // Anything ending in H:MM or H:MM:SS after a date-ish prefix.
        Regex::new(r"^.*?(\d{1,2}):(\d{2})(?::\d{2})?$").unwrap(),
        // A bare hour number.
        Regex::new(r"^(\d{1,2})$").unwrap(),
    ];

    // Tolerated date(-time) shapes, tried in order after the native formats.
    static ref DATE_SHAPES: Vec<Regex> = vec![
        Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{4})\s+(\d{1,2}):(\d{2})$").unwrap(),
        Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})\s+(\d{1,2}):(\d{2})$").unwrap(),
        Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})$").unwrap(),
        Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{4})$").unwrap(),
    ];

    static ref BARE_TIME_RE: Regex = Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap();
}

/// Normalizes a raw time-of-day value to `HH:MM` 24-hour. Accepts `H:MM`,
/// `H:MM:SS` (seconds dropped), strings ending in a time, bare hour numbers,
/// and full date-times (time-of-day extracted). Returns `None` for anything
/// unparseable or out of range; callers treat that as "field absent".
pub fn parse_time_value(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for shape in TIME_SHAPES.iter() {
        if let Some(caps) = shape.captures(value) {
            let hours: u32 = caps.get(1)?.as_str().parse().ok()?;
            let minutes: u32 = caps
                .get(2)
                .map(|m| m.as_str().parse().ok())
                .unwrap_or(Some(0))?;
            if hours <= 23 && minutes <= 59 {
                return Some(format!("{:02}:{:02}", hours, minutes));
            }
        }
    }

    parse_date_time(value).map(|dt| dt.format("%H:%M").to_string())
}

/// Parses a raw date-time value, trying native ISO-ish forms first, then the
/// tolerated numeric shapes, and finally a bare `H:MM` on today's date.
/// Disambiguation when only numeric groups are available: a first group
/// above 1900 is read as a year (year-month-day order), anything else as a
/// day (day-month-year order). Invalid calendar dates fail outright.
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    const NATIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];
    for format in NATIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    for shape in DATE_SHAPES.iter() {
        if let Some(caps) = shape.captures(value) {
            let parts: Vec<i32> = caps
                .iter()
                .skip(1)
                .flatten()
                .filter_map(|m| m.as_str().parse().ok())
                .collect();

            let (year, month, day) = if parts[0] > 1900 {
                (parts[0], parts[1], parts[2])
            } else {
                (parts[2], parts[1], parts[0])
            };
            let date = NaiveDate::from_ymd_opt(year, month as u32, day as u32)?;
            let time = if parts.len() >= 5 {
                NaiveTime::from_hms_opt(parts[3] as u32, parts[4] as u32, 0)?
            } else {
                NaiveTime::from_hms_opt(0, 0, 0)?
            };
            return Some(NaiveDateTime::new(date, time));
        }
    }

    // Time-only input is read against today's date.
    if let Some(caps) = BARE_TIME_RE.captures(value) {
        let hours: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minutes: u32 = caps.get(2)?.as_str().parse().ok()?;
        let time = NaiveTime::from_hms_opt(hours, minutes, 0)?;
        return Some(NaiveDateTime::new(Local::now().date_naive(), time));
    }

    None
}

/// Looks a domain field up through the column mapping; absent when the field
/// is unmapped, the column is missing from the row, or the cell is blank.
fn text_field(row: &RawRecord, mapping: &ColumnMapping, key: &str) -> Option<String> {
    let header = mapping.get(key)?;
    let value = row.get(header)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn validated_email(email: String) -> Result<String, ValidationError> {
    if EMAIL_RE.is_match(&email) {
        Ok(email)
    } else {
        Err(ValidationError::new(format!("Invalid email format: {}", email)))
    }
}

fn validated_phone(phone: String) -> Result<String, ValidationError> {
    if PHONE_RE.is_match(&phone) {
        Ok(phone)
    } else {
        Err(ValidationError::new(format!("Invalid phone format: {}", phone)))
    }
}

pub struct OperativeRowParser {
    mapping: ColumnMapping,
    default_location: Option<DefaultLocation>,
}

impl OperativeRowParser {
    pub fn new(mapping: ColumnMapping, default_location: Option<DefaultLocation>) -> Self {
        Self { mapping, default_location }
    }

    pub fn parse_row(&self, row: &RawRecord) -> Result<Operative, ValidationError> {
        let first_name = text_field(row, &self.mapping, "first_name")
            .ok_or_else(|| ValidationError::new("First name is required"))?;

        let email = text_field(row, &self.mapping, "email")
            .map(validated_email)
            .transpose()?;
        let phone = text_field(row, &self.mapping, "phone")
            .map(validated_phone)
            .transpose()?;

        // Rows without a location inherit the uploading user's own site.
        let (location, location_id) = match text_field(row, &self.mapping, "location") {
            Some(location) => (Some(location), None),
            None => match &self.default_location {
                Some(default) => (Some(default.name.clone()), Some(default.id.clone())),
                None => (None, None),
            },
        };

        // Bad time values degrade to "absent"; a malformed days mask fails
        // the whole row. That asymmetry is deliberate.
        let default_start_time = text_field(row, &self.mapping, "default_start_time")
            .and_then(|v| parse_time_value(&v));
        let default_end_time = text_field(row, &self.mapping, "default_end_time")
            .and_then(|v| parse_time_value(&v));

        let default_days_available = text_field(row, &self.mapping, "default_days_available")
            .map(|days| {
                if DAYS_AVAILABLE_RE.is_match(&days) {
                    Ok(days)
                } else {
                    Err(ValidationError::new(format!(
                        "Invalid days available format: {}",
                        days
                    )))
                }
            })
            .transpose()?;

        Ok(Operative {
            first_name,
            last_name: text_field(row, &self.mapping, "last_name"),
            email,
            phone,
            location,
            location_id,
            operative_type: text_field(row, &self.mapping, "operative_type"),
            default_start_time,
            default_end_time,
            default_days_available,
        })
    }
}

pub struct JobRowParser {
    mapping: ColumnMapping,
}

impl JobRowParser {
    pub fn new(mapping: ColumnMapping) -> Self {
        Self { mapping }
    }

    pub fn parse_row(&self, row: &RawRecord) -> Result<Job, ValidationError> {
        let entry_raw = text_field(row, &self.mapping, "entry_time");
        let exit_raw = text_field(row, &self.mapping, "exit_time");
        let (entry_raw, exit_raw) = match (entry_raw, exit_raw) {
            (Some(entry), Some(exit)) => (entry, exit),
            _ => return Err(ValidationError::new("Entry time and exit time are required")),
        };

        let entry_time = parse_date_time(&entry_raw)
            .ok_or_else(|| ValidationError::new("Invalid date/time format"))?;
        let exit_time = parse_date_time(&exit_raw)
            .ok_or_else(|| ValidationError::new("Invalid date/time format"))?;

        if entry_time >= exit_time {
            return Err(ValidationError::new("Entry time must be before exit time"));
        }

        let duration_min = text_field(row, &self.mapping, "duration_min")
            .and_then(|raw| parse_minutes(&raw))
            .unwrap_or_else(|| {
                ((exit_time - entry_time).num_seconds() as f64 / 60.0).round() as i64
            });

        let start_time = match text_field(row, &self.mapping, "start_time") {
            Some(raw) => {
                let start = parse_date_time(&raw)
                    .ok_or_else(|| ValidationError::new("Invalid date/time format"))?;
                if start < entry_time || start > exit_time {
                    return Err(ValidationError::new(
                        "Start time must be between entry and exit time",
                    ));
                }
                Some(start)
            }
            None => None,
        };

        Ok(Job {
            entry_time,
            exit_time,
            duration_min,
            start_time,
            operative_type: text_field(row, &self.mapping, "operative_type"),
            client: text_field(row, &self.mapping, "client"),
            location: text_field(row, &self.mapping, "location"),
            operative: text_field(row, &self.mapping, "operative"),
        })
    }
}

/// Reads a raw duration cell as whole minutes when it is numeric or a
/// numeric string; anything else falls back to the job window.
fn parse_minutes(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(minutes) = raw.parse::<i64>() {
        return Some(minutes);
    }
    raw.parse::<f64>().ok().map(|minutes| minutes.round() as i64)
}

pub struct ClientRowParser {
    mapping: ColumnMapping,
    default_location: Option<String>,
}

impl ClientRowParser {
    pub fn new(mapping: ColumnMapping, default_location: Option<String>) -> Self {
        Self { mapping, default_location }
    }

    pub fn parse_row(&self, row: &RawRecord) -> Result<Client, ValidationError> {
        let name = text_field(row, &self.mapping, "name")
            .ok_or_else(|| ValidationError::new("Name is required"))?;

        let email = text_field(row, &self.mapping, "email")
            .map(validated_email)
            .transpose()?;
        let phone = text_field(row, &self.mapping, "phone")
            .map(validated_phone)
            .transpose()?;

        let location =
            text_field(row, &self.mapping, "location").or_else(|| self.default_location.clone());

        Ok(Client { name, email, phone, location })
    }
}

/// Row-scoped failure with the 1-based display row it belongs to (row 2 is
/// the first data row, right under the header).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

/// Outcome of folding a parser over a whole table: the accepted batch plus
/// every per-row failure, so one bad row never hides the rest.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedBatch<T> {
    pub records: Vec<T>,
    pub errors: Vec<RowError>,
}

/// Runs a row parser over every data row of the table, collecting records
/// and errors side by side.
pub fn parse_rows<T, F>(table: &RawTable, parse: F) -> ParsedBatch<T>
where
    F: Fn(&RawRecord) -> Result<T, ValidationError>,
{
    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (index, row) in table.rows.iter().enumerate() {
        match parse(row) {
            Ok(record) => records.push(record),
            Err(error) => errors.push(RowError {
                row: index + 2,
                message: error.0,
            }),
        }
    }

    ParsedBatch { records, errors }
}
