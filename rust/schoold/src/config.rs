use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::wizard::class::DEFAULT_DAYS;
use crate::wizard::DEFAULT_DEBOUNCE;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Daemon settings. Defaults, then `SCHOOLD_*` environment overrides; the
/// shell can still change the API URL and session directory at runtime.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub api_url: String,
    pub session_dir: Option<PathBuf>,
    #[serde(serialize_with = "as_millis")]
    pub autosave_debounce: Duration,
    #[serde(serialize_with = "as_millis")]
    pub request_timeout: Duration,
    pub schedule_days: Vec<String>,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            session_dir: None,
            autosave_debounce: DEFAULT_DEBOUNCE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            schedule_days: DEFAULT_DAYS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    /// Unparseable values are ignored and the default kept.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("SCHOOLD_API_URL").filter(|s| !s.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(dir) = var("SCHOOLD_SESSION_DIR").filter(|s| !s.trim().is_empty()) {
            self.session_dir = Some(PathBuf::from(dir));
        }
        if let Some(ms) = var("SCHOOLD_AUTOSAVE_MS").and_then(|s| s.trim().parse::<u64>().ok()) {
            self.autosave_debounce = Duration::from_millis(ms);
        }
        if let Some(secs) = var("SCHOOLD_REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
        {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(days) = var("SCHOOLD_SCHEDULE_DAYS") {
            let mut parsed: Vec<String> = Vec::new();
            // Day names become field names under `schedule`, so a dot would
            // split the path.
            for day in days.split(',').map(|d| d.trim().to_lowercase()) {
                if day.is_empty() || day.contains('.') || parsed.contains(&day) {
                    continue;
                }
                parsed.push(day);
            }
            if !parsed.is_empty() {
                self.schedule_days = parsed;
            }
        }
    }
}
