use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use toml::Value;
use valbot_core::config::{resolve_config_path, AppConfig, LoadOptions};

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let file = ConfigFile::detect();
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let port = config.server.port.to_string();
    let shutdown = config.server.graceful_shutdown_secs.to_string();
    let sid = redact_sid(&config.twilio.account_sid);
    let token = redact_secret(config.twilio.auth_token.expose_secret());
    let timeout = config.twilio.timeout_secs.to_string();
    let format = format!("{:?}", config.logging.format);

    let fields: [(&str, &str, &[&str]); 11] = [
        ("server.bind_address", &config.server.bind_address, &["VALBOT_SERVER_BIND_ADDRESS"]),
        ("server.port", &port, &["VALBOT_SERVER_PORT", "PORT"]),
        ("server.graceful_shutdown_secs", &shutdown, &["VALBOT_SERVER_GRACEFUL_SHUTDOWN_SECS"]),
        ("twilio.account_sid", &sid, &["VALBOT_TWILIO_ACCOUNT_SID", "TWILIO_ACCOUNT_SID"]),
        ("twilio.auth_token", &token, &["VALBOT_TWILIO_AUTH_TOKEN", "TWILIO_AUTH_TOKEN"]),
        (
            "twilio.whatsapp_from",
            &config.twilio.whatsapp_from,
            &["VALBOT_TWILIO_WHATSAPP_FROM", "TWILIO_WHATSAPP_FROM"],
        ),
        (
            "twilio.announce_to",
            config.twilio.announce_to.as_deref().unwrap_or("<unset>"),
            &["VALBOT_TWILIO_ANNOUNCE_TO", "TWILIO_WHATSAPP_TO"],
        ),
        ("twilio.api_base_url", &config.twilio.api_base_url, &["VALBOT_TWILIO_API_BASE_URL"]),
        ("twilio.timeout_secs", &timeout, &["VALBOT_TWILIO_TIMEOUT_SECS"]),
        ("logging.level", &config.logging.level, &["VALBOT_LOGGING_LEVEL", "VALBOT_LOG_LEVEL"]),
        ("logging.format", &format, &["VALBOT_LOGGING_FORMAT", "VALBOT_LOG_FORMAT"]),
    ];

    for (key_path, value, env_keys) in fields {
        lines.push(render_line(key_path, value, file.source(key_path, env_keys)));
    }

    lines.join("\n")
}

struct ConfigFile {
    path: Option<PathBuf>,
    doc: Option<Value>,
}

impl ConfigFile {
    fn detect() -> Self {
        let path = resolve_config_path(None);
        let doc = path.as_deref().and_then(load_doc);
        Self { path, doc }
    }

    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if self.doc.as_ref().is_some_and(|doc| contains_path(doc, key_path)) {
            let file_path = self
                .path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }

        "default".to_string()
    }
}

fn load_doc(path: &Path) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the `AC` prefix and the last four characters.
pub(crate) fn redact_sid(sid: &str) -> String {
    let trimmed = sid.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars = trimmed.chars().collect::<Vec<_>>();
    if chars.len() <= 6 {
        return "<redacted>".to_string();
    }

    let prefix = chars[..2].iter().collect::<String>();
    let suffix = chars[chars.len() - 4..].iter().collect::<String>();
    format!("{prefix}***{suffix}")
}

fn redact_secret(secret: &str) -> String {
    if secret.trim().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
