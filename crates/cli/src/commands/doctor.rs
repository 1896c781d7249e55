use secrecy::ExposeSecret;
use serde::Serialize;
use valbot_core::config::{AppConfig, LoadOptions, TwilioConfig};

use super::{escape_json, CommandResult};

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

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report(AppConfig::load(LoadOptions::default()));
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 4 };

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

fn build_report<E: std::fmt::Display>(loaded: Result<AppConfig, E>) -> DoctorReport {
    let mut checks = Vec::new();

    match loaded {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_twilio_credentials(&config.twilio));
            checks.push(check_announcement_target(&config.twilio));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["twilio_credentials", "announcement_target"] {
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

fn check_twilio_credentials(twilio: &TwilioConfig) -> DoctorCheck {
    // Twilio account SIDs are `AC` followed by 32 hex characters.
    let sid = twilio.account_sid.trim();
    let sid_shape_ok = sid.len() == 34
        && sid.starts_with("AC")
        && sid.get(2..).is_some_and(|rest| rest.chars().all(|c| c.is_ascii_hexdigit()));
    let token_len = twilio.auth_token.expose_secret().trim().len();

    if !sid_shape_ok {
        return DoctorCheck {
            name: "twilio_credentials",
            status: CheckStatus::Fail,
            details: format!(
                "account sid `{}` is not 34 characters of `AC` plus hex",
                super::config::redact_sid(sid)
            ),
        };
    }
    if token_len != 32 {
        return DoctorCheck {
            name: "twilio_credentials",
            status: CheckStatus::Fail,
            details: format!("auth token should be 32 characters, found {token_len}"),
        };
    }

    DoctorCheck {
        name: "twilio_credentials",
        status: CheckStatus::Pass,
        details: format!(
            "account {} sending from {}",
            super::config::redact_sid(sid),
            twilio.whatsapp_from
        ),
    }
}

fn check_announcement_target(twilio: &TwilioConfig) -> DoctorCheck {
    match &twilio.announce_to {
        Some(target) => DoctorCheck {
            name: "announcement_target",
            status: CheckStatus::Pass,
            details: format!("startup announcement goes to {target}"),
        },
        None => DoctorCheck {
            name: "announcement_target",
            status: CheckStatus::Skipped,
            details: "no announcement recipient configured".to_string(),
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

#[cfg(test)]
mod tests {
    use valbot_core::config::AppConfig;

    use super::{build_report, render_human, CheckStatus};

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.twilio.account_sid = format!("AC{}", "0123456789abcdef".repeat(2));
        config.twilio.auth_token = "f".repeat(32).into();
        config.twilio.whatsapp_from = "whatsapp:+14155238886".to_owned();
        config
    }

    #[test]
    fn valid_config_passes_with_skipped_announcement() {
        let report = build_report::<String>(Ok(valid_config()));

        assert_eq!(report.overall_status, CheckStatus::Pass);
        assert_eq!(report.checks[1].status, CheckStatus::Pass);
        assert_eq!(report.checks[2].status, CheckStatus::Skipped);
        assert!(!report.checks[1].details.contains("0123456789abcdef0123456789abcdef"));
    }

    #[test]
    fn short_token_fails_credentials_check() {
        let mut config = valid_config();
        config.twilio.auth_token = "short".to_owned().into();

        let report = build_report::<String>(Ok(config));

        assert_eq!(report.overall_status, CheckStatus::Fail);
        assert!(report.checks[1].details.contains("found 5"));
    }

    #[test]
    fn config_failure_skips_remaining_checks() {
        let report = build_report(Err("twilio.account_sid is required"));

        assert_eq!(report.overall_status, CheckStatus::Fail);
        assert_eq!(report.checks[0].status, CheckStatus::Fail);
        assert!(report.checks[1..].iter().all(|check| check.status == CheckStatus::Skipped));
        assert!(render_human(&report).contains("- [fail] config_validation"));
    }
}
