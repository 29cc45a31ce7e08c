// src/assignment.rs
//
// Bridge to the legacy assignment service. The service still speaks its
// original sales-round vocabulary (salesmen, clusters) and keys its response
// by salesman id, so this module translates both directions: domain request
// out, unified roster back. The translations are pure functions; only
// `AssignmentService::generate_roster` touches the network.

use chrono::NaiveDateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{RosterLocation, RosterRequest, RosterResponse, RosteredJob};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DEFAULT_SHIFT_START: &str = "09:00:00";
const DEFAULT_SHIFT_END: &str = "17:00:00";

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Cannot generate a roster from an empty job batch")]
    EmptyJobBatch,

    #[error("Request to assignment service failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Assignment service returned {status}: {body}")]
    Api { status: u16, body: String },
}

// Wire types, matching the legacy service field for field.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegacyAddress {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegacyJob {
    pub job_id: String,
    pub client_name: String,
    pub date: String,
    pub location: LegacyAddress,
    pub duration_mins: i64,
    pub entry_time: String,
    pub exit_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegacySalesman {
    pub salesman_id: String,
    pub salesman_name: String,
    pub location: LegacyAddress,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyRequest {
    pub jobs: Vec<LegacyJob>,
    pub salesmen: Vec<LegacySalesman>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyGeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyAssignedJob {
    pub job_id: String,
    pub client_name: String,
    pub date: String,
    pub location: LegacyGeoLocation,
    pub duration_mins: i64,
    pub entry_time: String,
    pub exit_time: String,
    pub salesman_id: String,
    pub salesman_name: String,
    pub start_time: String,
    pub cluster: Option<i64>,
}

/// Response keyed by salesman id. BTreeMap keeps flattening order stable
/// across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyResponse {
    pub jobs: BTreeMap<String, Vec<LegacyAssignedJob>>,
    pub unassigned_jobs: Vec<String>,
    pub message: String,
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Combines a shift date with a time-of-day string (`HH:MM` or `HH:MM:SS`)
/// into the legacy `YYYY-MM-DD HH:MM:SS` form.
fn shift_datetime(date: &NaiveDateTime, time: &str) -> String {
    let time = if time.len() == 5 {
        format!("{}:00", time)
    } else {
        time.to_string()
    };
    format!("{} {}", date.format("%Y-%m-%d"), time)
}

/// Translates a domain roster request into the legacy wire shape. Ids are
/// synthesized from position: jobs count from "1", salesmen from "101".
/// Every salesman is given a working window on the first job's calendar
/// date, from the operative's default times or the 09:00-17:00 fallback.
pub fn transform_request(request: &RosterRequest) -> Result<LegacyRequest, AdapterError> {
    let first_entry = match request.jobs.first() {
        Some(job) => job.entry_time,
        None => return Err(AdapterError::EmptyJobBatch),
    };

    let jobs = request
        .jobs
        .iter()
        .enumerate()
        .map(|(i, job)| LegacyJob {
            job_id: (i + 1).to_string(),
            client_name: job.client.clone().unwrap_or_default(),
            date: format_datetime(&job.entry_time),
            location: LegacyAddress {
                address: job.location.clone().unwrap_or_default(),
            },
            duration_mins: job.duration_min,
            entry_time: format_datetime(&job.entry_time),
            exit_time: format_datetime(&job.exit_time),
        })
        .collect();

    let salesmen = request
        .operatives
        .iter()
        .enumerate()
        .map(|(i, operative)| {
            let full_name = match &operative.last_name {
                Some(last) => format!("{} {}", operative.first_name, last),
                None => operative.first_name.clone(),
            };
            LegacySalesman {
                salesman_id: (101 + i).to_string(),
                salesman_name: full_name.trim().to_string(),
                location: LegacyAddress {
                    address: operative.location.clone().unwrap_or_default(),
                },
                start_time: shift_datetime(
                    &first_entry,
                    operative
                        .default_start_time
                        .as_deref()
                        .unwrap_or(DEFAULT_SHIFT_START),
                ),
                end_time: shift_datetime(
                    &first_entry,
                    operative
                        .default_end_time
                        .as_deref()
                        .unwrap_or(DEFAULT_SHIFT_END),
                ),
            }
        })
        .collect();

    Ok(LegacyRequest { jobs, salesmen })
}

/// Flattens the per-salesman response into one unified roster. Jobs listed
/// under `unassigned_jobs` come back with their assignment cleared rather
/// than dropped.
pub fn transform_response(response: LegacyResponse) -> RosterResponse {
    let mut jobs: Vec<RosteredJob> = Vec::new();

    for assigned in response.jobs.into_values() {
        for job in assigned {
            jobs.push(RosteredJob {
                id: job.job_id,
                entry_time: job.entry_time,
                exit_time: job.exit_time,
                duration_min: job.duration_mins,
                location: RosterLocation {
                    name: job.location.address.clone(),
                    latitude: Some(job.location.latitude),
                    longitude: Some(job.location.longitude),
                    address: job.location.address,
                },
                client: if job.client_name.is_empty() {
                    None
                } else {
                    Some(job.client_name)
                },
                operative_name: Some(job.salesman_name),
                start_time: Some(job.start_time),
            });
        }
    }

    for job_id in &response.unassigned_jobs {
        if let Some(job) = jobs.iter_mut().find(|j| &j.id == job_id) {
            job.operative_name = None;
            job.start_time = None;
        }
    }

    RosterResponse {
        jobs,
        message: response.message,
    }
}

pub struct AssignmentService {
    http_client: Client,
    endpoint: String,
}

impl AssignmentService {
    pub fn new(http_client: Client, endpoint: String) -> Self {
        Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Sends a roster request to the legacy service and translates the
    /// answer. A non-success status is surfaced as `AdapterError::Api` with
    /// whatever body the service produced; there is no fallback roster.
    pub async fn generate_roster(
        &self,
        request: &RosterRequest,
    ) -> Result<RosterResponse, AdapterError> {
        let legacy_request = transform_request(request)?;
        let url = format!("{}/generate_roster", self.endpoint);

        info!(
            "Requesting roster: {} jobs, {} salesmen",
            legacy_request.jobs.len(),
            legacy_request.salesmen.len()
        );

        let response = self
            .http_client
            .post(&url)
            .json(&legacy_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(AdapterError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let legacy_response = response.json::<LegacyResponse>().await?;
        debug!(
            "Roster received: {} salesmen with work, {} unassigned",
            legacy_response.jobs.len(),
            legacy_response.unassigned_jobs.len()
        );

        Ok(transform_response(legacy_response))
    }
}
