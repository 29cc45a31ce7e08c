// src/column_match.rs
//
// Header matcher: proposes a column mapping for an uploaded table by fuzzy
// matching its headers against static variation catalogs. The result is
// advisory only; the caller may edit any entry before committing.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Mapping from domain field key to the source header carrying that field.
/// At most one header per key, never two keys on the same header.
pub type ColumnMapping = BTreeMap<String, String>;

#[derive(Error, Debug, PartialEq)]
pub enum MappingError {
    #[error("Required fields not mapped: {0}")]
    MissingRequired(String),

    #[error("Mapped column '{0}' is not present in the uploaded file")]
    UnknownHeader(String),

    #[error("Multiple fields mapped to column '{0}'")]
    DuplicateHeader(String),
}

/// Accepted header spellings for one domain field.
pub struct FieldMatch {
    pub key: &'static str,
    pub variations: &'static [&'static str],
}

/// Static per-domain-type field descriptor shown in the mapping UI.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExpectedField {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Operative,
    Job,
    Client,
}

impl ImportKind {
    pub fn matches(self) -> &'static [FieldMatch] {
        match self {
            ImportKind::Operative => OPERATIVE_MATCHES,
            ImportKind::Job => JOB_MATCHES,
            ImportKind::Client => CLIENT_MATCHES,
        }
    }

    pub fn fields(self) -> &'static [ExpectedField] {
        match self {
            ImportKind::Operative => OPERATIVE_FIELDS,
            ImportKind::Job => JOB_FIELDS,
            ImportKind::Client => CLIENT_FIELDS,
        }
    }
}

pub const OPERATIVE_MATCHES: &[FieldMatch] = &[
    FieldMatch {
        key: "first_name",
        variations: &["first_name", "first name", "firstname", "given_name", "given name", "givenname"],
    },
    FieldMatch {
        key: "last_name",
        variations: &["last_name", "last name", "lastname", "surname", "family_name", "family name"],
    },
    FieldMatch {
        key: "email",
        variations: &["email", "email_address", "emailaddress", "e-mail", "e_mail"],
    },
    FieldMatch {
        key: "phone",
        variations: &["phone", "phone_number", "phonenumber", "telephone", "tel", "mobile", "contact"],
    },
    FieldMatch {
        key: "location",
        variations: &["location", "site", "workplace", "work_location", "branch", "office", "address"],
    },
    FieldMatch {
        key: "operative_type",
        variations: &["operative_type", "operative type", "type", "role", "job_type", "job type", "position"],
    },
    FieldMatch {
        key: "default_start_time",
        variations: &["default_start_time", "start time", "starttime", "start", "work_start"],
    },
    FieldMatch {
        key: "default_end_time",
        variations: &["default_end_time", "end time", "endtime", "end", "work_end"],
    },
    FieldMatch {
        key: "default_days_available",
        variations: &["default_days_available", "days available", "working_days", "availability", "work_days"],
    },
];

pub const JOB_MATCHES: &[FieldMatch] = &[
    FieldMatch {
        key: "entry_time",
        variations: &["entry_time", "entry time", "start_time", "start time", "starttime", "begin"],
    },
    FieldMatch {
        key: "exit_time",
        variations: &["exit_time", "exit time", "end_time", "end time", "endtime", "finish"],
    },
    FieldMatch {
        key: "duration_min",
        variations: &["duration_min", "duration", "minutes", "length", "time_required", "job_duration"],
    },
    FieldMatch {
        key: "location",
        variations: &["location", "site", "workplace", "work_location", "branch", "office", "job_location", "address"],
    },
    FieldMatch {
        key: "operative_type",
        variations: &["operative_type", "operative type", "type", "role", "job_type", "job type", "worker_type"],
    },
    FieldMatch {
        key: "client",
        variations: &["client", "customer", "account", "client_name", "customer_name"],
    },
    FieldMatch {
        key: "operative",
        variations: &["operative", "worker", "employee", "staff", "assigned_to", "assignee"],
    },
    FieldMatch {
        key: "start_time",
        variations: &["start_time", "scheduled_start", "actual_start", "worker_start"],
    },
];

pub const CLIENT_MATCHES: &[FieldMatch] = &[
    FieldMatch {
        key: "name",
        variations: &["name", "client", "client_name", "customer", "customer_name", "company"],
    },
    FieldMatch {
        key: "email",
        variations: &["email", "email_address", "emailaddress", "e-mail", "e_mail"],
    },
    FieldMatch {
        key: "phone",
        variations: &["phone", "phone_number", "phonenumber", "telephone", "tel", "mobile", "contact"],
    },
    FieldMatch {
        key: "location",
        variations: &["location", "site", "workplace", "work_location", "branch", "office", "address"],
    },
];

pub const OPERATIVE_FIELDS: &[ExpectedField] = &[
    ExpectedField { key: "first_name", label: "First Name", required: true },
    ExpectedField { key: "last_name", label: "Last Name", required: false },
    ExpectedField { key: "email", label: "Email", required: false },
    ExpectedField { key: "phone", label: "Phone", required: false },
    ExpectedField { key: "location", label: "Location", required: false },
    ExpectedField { key: "operative_type", label: "Operative Type", required: false },
    ExpectedField { key: "default_start_time", label: "Start Time", required: false },
    ExpectedField { key: "default_end_time", label: "End Time", required: false },
    ExpectedField { key: "default_days_available", label: "Working Days", required: false },
];

pub const JOB_FIELDS: &[ExpectedField] = &[
    ExpectedField { key: "entry_time", label: "Entry Time", required: true },
    ExpectedField { key: "exit_time", label: "Exit Time", required: true },
    ExpectedField { key: "duration_min", label: "Duration (minutes)", required: true },
    ExpectedField { key: "location", label: "Location", required: true },
    ExpectedField { key: "operative_type", label: "Operative Type", required: false },
    ExpectedField { key: "client", label: "Client", required: true },
    ExpectedField { key: "operative", label: "Operative", required: false },
    ExpectedField { key: "start_time", label: "Start Time", required: false },
];

pub const CLIENT_FIELDS: &[ExpectedField] = &[
    ExpectedField { key: "name", label: "Name", required: true },
    ExpectedField { key: "email", label: "Email", required: false },
    ExpectedField { key: "phone", label: "Phone", required: false },
    ExpectedField { key: "location", label: "Location", required: false },
];

/// Lowercases and strips everything that is not ASCII alphanumeric, so that
/// "First Name", "first-name" and "FIRST_NAME" all compare equal.
fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Finds the field key a single header should map to, if any. Exact matches
/// against the normalized variations win over substring matches.
pub fn find_best_match(header: &str, matches: &[FieldMatch]) -> Option<&'static str> {
    let normalized_header = normalize(header);
    if normalized_header.is_empty() {
        return None;
    }

    for field in matches {
        if field
            .variations
            .iter()
            .any(|v| normalize(v) == normalized_header)
        {
            return Some(field.key);
        }
    }

    for field in matches {
        for variation in field.variations {
            let normalized_variation = normalize(variation);
            if normalized_header.contains(&normalized_variation)
                || normalized_variation.contains(&normalized_header)
            {
                return Some(field.key);
            }
        }
    }

    None
}

/// Proposes an initial mapping for the given headers. Headers are visited in
/// file order and a field key is claimed by at most one header (first claim
/// wins); unmatched headers stay unmapped. Deterministic for a given header
/// list and catalog.
pub fn suggest_mapping(headers: &[String], matches: &[FieldMatch]) -> ColumnMapping {
    let mut mapping = ColumnMapping::new();
    let mut claimed: HashSet<&str> = HashSet::new();

    for header in headers {
        if let Some(key) = find_best_match(header, matches) {
            if claimed.insert(key) {
                mapping.insert(key.to_string(), header.clone());
            }
        }
    }

    mapping
}

/// Checks a (possibly user-edited) mapping before normalization starts: every
/// mapped header must exist in the uploaded table, no header may carry more
/// than one field, and every required field must have a header assigned. All
/// missing required fields are reported in one message, by display label.
pub fn check_mapping(
    mapping: &ColumnMapping,
    headers: &[String],
    fields: &[ExpectedField],
) -> Result<(), MappingError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for header in mapping.values() {
        if !headers.iter().any(|h| h == header) {
            return Err(MappingError::UnknownHeader(header.clone()));
        }
        if !seen.insert(header.as_str()) {
            return Err(MappingError::DuplicateHeader(header.clone()));
        }
    }

    let missing: Vec<&str> = fields
        .iter()
        .filter(|field| field.required && !mapping.contains_key(field.key))
        .map(|field| field.label)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(MappingError::MissingRequired(missing.join(", ")))
    }
}
