use chrono::{Duration, TimeZone, Utc};
use serde::Serialize;

use shopkit_core::attribution::{validate_weights, AttributionPolicy};
use shopkit_core::config::{AppConfig, LoadOptions};
use shopkit_core::domain::order::OrderId;
use shopkit_core::domain::schedule::ChannelId;
use shopkit_core::domain::touchpoint::{Touchpoint, TouchpointKey};
use shopkit_db::ScheduleCatalog;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

/// Exits non-zero when any check fails so the command can gate deployments.
pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { 1 } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_schedule_catalog(&config));
            checks.push(check_attribution_weights(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["schedule_catalog", "attribution_weights"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_schedule_catalog(config: &AppConfig) -> DoctorCheck {
    let Some(path) = &config.catalog.schedules_path else {
        return DoctorCheck {
            name: "schedule_catalog",
            status: CheckStatus::Skipped,
            details: "no catalog.schedules_path configured".to_string(),
        };
    };

    let default_channel = ChannelId(config.catalog.default_channel.clone());
    match ScheduleCatalog::load(path, &default_channel) {
        Ok(catalog) => {
            let ids: Vec<String> = catalog
                .schedules()
                .iter()
                .map(|schedule| format!("{}/{}", schedule.channel.0, schedule.id.0))
                .collect();
            DoctorCheck {
                name: "schedule_catalog",
                status: CheckStatus::Pass,
                details: format!(
                    "{} schedule(s) loaded from `{}`: {}",
                    catalog.len(),
                    path.display(),
                    ids.join(", ")
                ),
            }
        }
        Err(error) => {
            DoctorCheck { name: "schedule_catalog", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

/// Runs the configured model over a synthetic journey and checks that the
/// weights it hands out add up to one.
fn check_attribution_weights(config: &AppConfig) -> DoctorCheck {
    let policy = config.attribution.model;
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now);
    let journey: Vec<Touchpoint> = (0..7)
        .map(|index| Touchpoint {
            key: TouchpointKey(format!("touchpoint-{index}")),
            associated_at: start + Duration::hours(index),
        })
        .collect();

    let attributions = policy.attribute(&journey);
    match validate_weights(&OrderId("doctor-readiness".to_string()), &attributions) {
        Ok(()) => DoctorCheck {
            name: "attribution_weights",
            status: CheckStatus::Pass,
            details: format!("`{}` weights sum to 1", policy.name()),
        },
        Err(error) => DoctorCheck {
            name: "attribution_weights",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
