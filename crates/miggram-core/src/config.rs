use std::{env, fmt, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);
pub const DEFAULT_IDENTITY_RETRY: Duration = Duration::from_millis(5000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Typed client configuration.
#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    pub api_base: String,

    // Polling
    pub poll_interval: Duration,
    pub identity_retry: Duration,
    pub streaming: bool,
    pub ack_updates: bool,

    // Transport
    pub request_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("poll_interval", &self.poll_interval)
            .field("identity_retry", &self.identity_retry)
            .field("streaming", &self.streaming)
            .field("ack_updates", &self.ack_updates)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    /// Defaults for everything except the token.
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            identity_retry: DEFAULT_IDENTITY_RETRY,
            streaming: true,
            ack_updates: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Load from the process environment, reading `.env` first if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let mut cfg = Self::new(bot_token.trim());

        if let Some(base) = lookup("TELEGRAM_API_BASE").and_then(non_empty) {
            cfg.api_base = base.trim().trim_end_matches('/').to_string();
        }

        let millis = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
        if let Some(ms) = millis("POLL_INTERVAL_MS") {
            cfg.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = millis("IDENTITY_RETRY_MS") {
            cfg.identity_retry = Duration::from_millis(ms);
        }
        if let Some(ms) = millis("REQUEST_TIMEOUT_MS") {
            if ms == 0 {
                return Err(Error::Config(
                    "REQUEST_TIMEOUT_MS must be greater than zero".to_string(),
                ));
            }
            cfg.request_timeout = Duration::from_millis(ms);
        }

        if let Some(v) = lookup("POLL_STREAMING") {
            cfg.streaming = parse_bool(&v);
        }
        if let Some(v) = lookup("POLL_ACK_UPDATES") {
            cfg.ack_updates = parse_bool(&v);
        }

        Ok(cfg)
    }

    /// `<base>/bot<token>/<method>`
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    /// `<base>/file/bot<token>/<path>`
    pub fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.api_base,
            self.bot_token,
            file_path.trim_start_matches('/')
        )
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn token_is_required() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = Config::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(cfg.bot_token, "123:abc");
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.poll_interval, Duration::from_millis(5000));
        assert_eq!(cfg.identity_retry, Duration::from_millis(5000));
        assert!(cfg.streaming);
        assert!(cfg.ack_updates);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_API_BASE", "http://127.0.0.1:8081/"),
            ("POLL_INTERVAL_MS", "250"),
            ("POLL_STREAMING", "off"),
            ("POLL_ACK_UPDATES", "false"),
            ("REQUEST_TIMEOUT_MS", "1500"),
        ]))
        .unwrap();
        assert_eq!(cfg.api_base, "http://127.0.0.1:8081");
        assert_eq!(cfg.poll_interval, Duration::from_millis(250));
        assert_eq!(cfg.request_timeout, Duration::from_millis(1500));
        assert!(!cfg.streaming);
        assert!(!cfg.ack_updates);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("REQUEST_TIMEOUT_MS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn debug_output_hides_the_token() {
        let shown = format!("{:?}", Config::new("123456:SECRETTOKEN"));
        assert!(!shown.contains("SECRETTOKEN"));
        assert!(shown.contains("api_base"));
    }

    #[test]
    fn urls_embed_the_token() {
        let cfg = Config::new("42:XYZ");
        assert_eq!(
            cfg.method_url("getMe"),
            "https://api.telegram.org/bot42:XYZ/getMe"
        );
        assert_eq!(
            cfg.file_url("/photos/file_1.jpg"),
            "https://api.telegram.org/file/bot42:XYZ/photos/file_1.jpg"
        );
    }
}
