//! Runtime configuration, read from `DORMCHECK_*` environment variables.

use std::time::Duration;

use tracing::warn;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_LOCALE: &str = "zh";

/// Paths of the session endpoints on the REST service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    pub token: String,
    pub identity: String,
    pub logout: String,
    pub register: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            token: "/api/v1/token".into(),
            identity: "/api/v1/users/me/".into(),
            logout: "/api/v1/logout".into(),
            register: "/api/v1/register".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub http_timeout: Duration,
    /// Auto-dismiss delay for notifications.
    pub notify_timeout: Duration,
    pub search_debounce: Duration,
    pub locale: String,
    pub default_locale: String,
    /// Optional JSON message catalog for the active locale.
    pub messages_path: Option<String>,
    pub auth: AuthEndpoints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            http_timeout: Duration::from_secs(30),
            notify_timeout: Duration::from_millis(4000),
            search_debounce: Duration::from_millis(300),
            locale: DEFAULT_LOCALE.into(),
            default_locale: DEFAULT_LOCALE.into(),
            messages_path: None,
            auth: AuthEndpoints::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let non_empty = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            api_base: non_empty("DORMCHECK_API_BASE").unwrap_or(d.api_base),
            http_timeout: non_empty("DORMCHECK_HTTP_TIMEOUT_SECS")
                .and_then(|v| parse_num("DORMCHECK_HTTP_TIMEOUT_SECS", &v))
                .map(Duration::from_secs)
                .unwrap_or(d.http_timeout),
            notify_timeout: non_empty("DORMCHECK_NOTIFY_TIMEOUT_MS")
                .and_then(|v| parse_num("DORMCHECK_NOTIFY_TIMEOUT_MS", &v))
                .map(Duration::from_millis)
                .unwrap_or(d.notify_timeout),
            search_debounce: non_empty("DORMCHECK_SEARCH_DEBOUNCE_MS")
                .and_then(|v| parse_num("DORMCHECK_SEARCH_DEBOUNCE_MS", &v))
                .map(Duration::from_millis)
                .unwrap_or(d.search_debounce),
            locale: non_empty("DORMCHECK_LOCALE").unwrap_or(d.locale),
            default_locale: non_empty("DORMCHECK_DEFAULT_LOCALE").unwrap_or(d.default_locale),
            messages_path: non_empty("DORMCHECK_MESSAGES"),
            auth: d.auth,
        }
    }

    pub fn with_api_base<S: Into<String>>(mut self, base: S) -> Self {
        self.api_base = base.into();
        self
    }
}

fn parse_num(key: &str, raw: &str) -> Option<u64> {
    match raw.parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(target: "config", "ignoring {}='{}': not a non-negative integer", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_unset() {
        let cfg = ClientConfig::from_lookup(|_| None);
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.notify_timeout, Duration::from_millis(4000));
        assert_eq!(cfg.search_debounce, Duration::from_millis(300));
        assert_eq!(cfg.locale, "zh");
        assert_eq!(cfg.auth.identity, "/api/v1/users/me/");
    }

    #[test]
    fn env_overrides_and_bad_numbers() {
        let vars: HashMap<&str, &str> = [
            ("DORMCHECK_API_BASE", "https://dorm.example"),
            ("DORMCHECK_NOTIFY_TIMEOUT_MS", "1500"),
            ("DORMCHECK_HTTP_TIMEOUT_SECS", "soon"),
            ("DORMCHECK_LOCALE", "en"),
            ("DORMCHECK_MESSAGES", "  "),
        ]
        .into_iter()
        .collect();
        let cfg = ClientConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.api_base, "https://dorm.example");
        assert_eq!(cfg.notify_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert_eq!(cfg.locale, "en");
        assert_eq!(cfg.default_locale, "zh");
        assert!(cfg.messages_path.is_none());
    }
}
