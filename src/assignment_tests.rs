// src/assignment_tests.rs

#[cfg(test)]
mod tests {
    use crate::assignment::*;
    use crate::model::{Job, Operative, RosterRequest};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn job(entry: (u32, u32), exit: (u32, u32), client: &str, location: &str) -> Job {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        Job {
            entry_time: date.and_hms_opt(entry.0, entry.1, 0).unwrap(),
            exit_time: date.and_hms_opt(exit.0, exit.1, 0).unwrap(),
            duration_min: 60,
            start_time: None,
            operative_type: None,
            client: if client.is_empty() {
                None
            } else {
                Some(client.to_string())
            },
            location: if location.is_empty() {
                None
            } else {
                Some(location.to_string())
            },
            operative: None,
        }
    }

    fn operative(first: &str, last: Option<&str>) -> Operative {
        Operative {
            first_name: first.to_string(),
            last_name: last.map(str::to_string),
            email: None,
            phone: None,
            location: Some("Depot".to_string()),
            location_id: None,
            operative_type: None,
            default_start_time: None,
            default_end_time: None,
            default_days_available: None,
        }
    }

    fn assigned(job_id: &str, salesman: &str, start: &str) -> LegacyAssignedJob {
        LegacyAssignedJob {
            job_id: job_id.to_string(),
            client_name: "Acme".to_string(),
            date: "2024-03-15 08:00:00".to_string(),
            location: LegacyGeoLocation {
                latitude: 51.5,
                longitude: -0.1,
                address: "Site A".to_string(),
            },
            duration_mins: 60,
            entry_time: "2024-03-15 08:00:00".to_string(),
            exit_time: "2024-03-15 16:00:00".to_string(),
            salesman_id: "101".to_string(),
            salesman_name: salesman.to_string(),
            start_time: start.to_string(),
            cluster: Some(0),
        }
    }

    // --- transform_request ---

    #[test]
    fn test_request_ids_count_from_position() {
        let request = RosterRequest {
            operatives: vec![operative("Ada", None), operative("Grace", None)],
            jobs: vec![
                job((8, 0), (16, 0), "Acme", "Site A"),
                job((9, 0), (17, 0), "Beta", "Site B"),
                job((10, 0), (18, 0), "Gamma", "Site C"),
            ],
        };

        let legacy = transform_request(&request).expect("request should transform");

        let job_ids: Vec<&str> = legacy.jobs.iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(job_ids, vec!["1", "2", "3"]);

        let salesman_ids: Vec<&str> = legacy
            .salesmen
            .iter()
            .map(|s| s.salesman_id.as_str())
            .collect();
        assert_eq!(salesman_ids, vec!["101", "102"]);
    }

    #[test]
    fn test_request_formats_datetimes() {
        let request = RosterRequest {
            operatives: vec![],
            jobs: vec![job((8, 30), (16, 0), "Acme", "Site A")],
        };

        let legacy = transform_request(&request).expect("request should transform");
        assert_eq!(legacy.jobs[0].entry_time, "2024-03-15 08:30:00");
        assert_eq!(legacy.jobs[0].exit_time, "2024-03-15 16:00:00");
        assert_eq!(legacy.jobs[0].date, "2024-03-15 08:30:00");
        assert_eq!(legacy.jobs[0].location.address, "Site A");
    }

    #[test]
    fn test_salesman_shift_defaults_to_nine_to_five() {
        let request = RosterRequest {
            operatives: vec![operative("Ada", Some("Lovelace"))],
            jobs: vec![job((8, 0), (16, 0), "Acme", "Site A")],
        };

        let legacy = transform_request(&request).expect("request should transform");
        let salesman = &legacy.salesmen[0];
        assert_eq!(salesman.salesman_name, "Ada Lovelace");
        // Shift window sits on the first job's calendar date.
        assert_eq!(salesman.start_time, "2024-03-15 09:00:00");
        assert_eq!(salesman.end_time, "2024-03-15 17:00:00");
    }

    #[test]
    fn test_salesman_shift_uses_operative_defaults() {
        let mut early = operative("Ada", None);
        early.default_start_time = Some("06:30".to_string());
        early.default_end_time = Some("14:30".to_string());

        let request = RosterRequest {
            operatives: vec![early],
            jobs: vec![job((8, 0), (16, 0), "Acme", "Site A")],
        };

        let legacy = transform_request(&request).expect("request should transform");
        assert_eq!(legacy.salesmen[0].start_time, "2024-03-15 06:30:00");
        assert_eq!(legacy.salesmen[0].end_time, "2024-03-15 14:30:00");
    }

    #[test]
    fn test_salesman_name_without_last_name_is_trimmed() {
        let request = RosterRequest {
            operatives: vec![operative("Ada", None)],
            jobs: vec![job((8, 0), (16, 0), "Acme", "Site A")],
        };

        let legacy = transform_request(&request).expect("request should transform");
        assert_eq!(legacy.salesmen[0].salesman_name, "Ada");
    }

    #[test]
    fn test_missing_client_and_location_become_empty_strings() {
        let request = RosterRequest {
            operatives: vec![],
            jobs: vec![job((8, 0), (16, 0), "", "")],
        };

        let legacy = transform_request(&request).expect("request should transform");
        assert_eq!(legacy.jobs[0].client_name, "");
        assert_eq!(legacy.jobs[0].location.address, "");
    }

    #[test]
    fn test_empty_job_batch_is_rejected() {
        let request = RosterRequest {
            operatives: vec![operative("Ada", None)],
            jobs: vec![],
        };

        assert!(matches!(
            transform_request(&request).unwrap_err(),
            AdapterError::EmptyJobBatch
        ));
    }

    fn assigned_from(job: &LegacyJob, salesman: &LegacySalesman) -> LegacyAssignedJob {
        LegacyAssignedJob {
            job_id: job.job_id.clone(),
            client_name: job.client_name.clone(),
            date: job.date.clone(),
            location: LegacyGeoLocation {
                latitude: 51.5,
                longitude: -0.1,
                address: job.location.address.clone(),
            },
            duration_mins: job.duration_mins,
            entry_time: job.entry_time.clone(),
            exit_time: job.exit_time.clone(),
            salesman_id: salesman.salesman_id.clone(),
            salesman_name: salesman.salesman_name.clone(),
            start_time: job.entry_time.clone(),
            cluster: None,
        }
    }

    #[test]
    fn test_job_ids_survive_full_round_trip() {
        let request = RosterRequest {
            operatives: vec![operative("Ada", None)],
            jobs: vec![
                job((8, 0), (16, 0), "Acme", "Site A"),
                job((9, 0), (17, 0), "Beta", "Site B"),
                job((10, 0), (18, 0), "Gamma", "Site C"),
            ],
        };

        let legacy = transform_request(&request).expect("request should transform");
        let salesman = &legacy.salesmen[0];

        // Echo the request back the way the service would: every job listed
        // under the salesman, with the last one also flagged unassigned.
        let mut grouped = BTreeMap::new();
        grouped.insert(
            salesman.salesman_id.clone(),
            legacy.jobs.iter().map(|j| assigned_from(j, salesman)).collect(),
        );
        let roster = transform_response(LegacyResponse {
            jobs: grouped,
            unassigned_jobs: vec![legacy.jobs[2].job_id.clone()],
            message: "ok".to_string(),
        });

        // Every request job id appears exactly once, assigned or not.
        let mut roster_ids: Vec<&str> = roster.jobs.iter().map(|j| j.id.as_str()).collect();
        roster_ids.sort_unstable();
        let mut request_ids: Vec<&str> = legacy.jobs.iter().map(|j| j.job_id.as_str()).collect();
        request_ids.sort_unstable();
        assert_eq!(roster_ids, request_ids);

        for rostered in &roster.jobs {
            if rostered.id == legacy.jobs[2].job_id {
                assert_eq!(rostered.operative_name, None);
                assert_eq!(rostered.start_time, None);
            } else {
                assert_eq!(rostered.operative_name.as_deref(), Some("Ada"));
                assert!(rostered.start_time.is_some());
            }
        }
    }

    // --- transform_response ---

    #[test]
    fn test_response_flattens_per_salesman_groups() {
        let mut jobs = BTreeMap::new();
        jobs.insert(
            "101".to_string(),
            vec![assigned("1", "Ada", "2024-03-15 08:00:00")],
        );
        jobs.insert(
            "102".to_string(),
            vec![
                assigned("2", "Grace", "2024-03-15 09:00:00"),
                assigned("3", "Grace", "2024-03-15 11:00:00"),
            ],
        );

        let roster = transform_response(LegacyResponse {
            jobs,
            unassigned_jobs: vec![],
            message: "ok".to_string(),
        });

        assert_eq!(roster.jobs.len(), 3);
        assert_eq!(roster.message, "ok");

        let first = &roster.jobs[0];
        assert_eq!(first.id, "1");
        assert_eq!(first.operative_name.as_deref(), Some("Ada"));
        assert_eq!(first.location.name, "Site A");
        assert_eq!(first.location.latitude, Some(51.5));
    }

    #[test]
    fn test_response_clears_unassigned_jobs() {
        let mut jobs = BTreeMap::new();
        jobs.insert(
            "101".to_string(),
            vec![
                assigned("1", "Ada", "2024-03-15 08:00:00"),
                assigned("2", "Ada", "2024-03-15 10:00:00"),
            ],
        );

        let roster = transform_response(LegacyResponse {
            jobs,
            unassigned_jobs: vec!["2".to_string()],
            message: "partial".to_string(),
        });

        let kept = roster.jobs.iter().find(|j| j.id == "1").unwrap();
        assert!(kept.operative_name.is_some());
        assert!(kept.start_time.is_some());

        // Unassigned jobs stay in the roster with the assignment cleared.
        let cleared = roster.jobs.iter().find(|j| j.id == "2").unwrap();
        assert_eq!(cleared.operative_name, None);
        assert_eq!(cleared.start_time, None);
        assert_eq!(cleared.duration_min, 60);
    }

    #[test]
    fn test_response_empty_client_name_becomes_none() {
        let mut blank_client = assigned("1", "Ada", "2024-03-15 08:00:00");
        blank_client.client_name = String::new();

        let mut jobs = BTreeMap::new();
        jobs.insert("101".to_string(), vec![blank_client]);

        let roster = transform_response(LegacyResponse {
            jobs,
            unassigned_jobs: vec![],
            message: "ok".to_string(),
        });

        assert_eq!(roster.jobs[0].client, None);
    }
}
