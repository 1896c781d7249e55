pub mod config;
pub mod doctor;
pub mod reply;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

/// JSON envelope printed by commands that report a single outcome.
#[derive(Debug, Serialize)]
struct CommandReport<'a> {
    command: &'a str,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'a str>,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    transcript: Vec<TranscriptEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub input: String,
    pub reply: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::with_transcript(command, message, Vec::new())
    }

    pub fn with_transcript(
        command: &str,
        message: impl Into<String>,
        transcript: Vec<TranscriptEntry>,
    ) -> Self {
        let report = CommandReport {
            command,
            status: "ok",
            error_class: None,
            message: message.into(),
            transcript,
        };
        Self { exit_code: 0, output: render(&report) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let report = CommandReport {
            command,
            status: "error",
            error_class: Some(error_class),
            message: message.into(),
            transcript: Vec::new(),
        };
        Self { exit_code, output: render(&report) }
    }
}

fn render(report: &CommandReport<'_>) -> String {
    serde_json::to_string(report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"{}\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            escape_json(report.command),
            escape_json(&error.to_string())
        )
    })
}

pub(crate) fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
