//! Session cookie encoding: `Set-Cookie` values out, `Cookie` header in.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Lax,
    Strict,
    /// Cross-site / embedded delivery. Forces `Secure`.
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SameSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" => Ok(SameSite::None),
            other => Err(format!("unknown SameSite value: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub same_site: SameSite,
    pub secure: bool,
    pub domain: Option<String>,
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session_token".to_string(),
            same_site: SameSite::Lax,
            secure: true,
            domain: None,
            path: "/".to_string(),
        }
    }
}

impl CookieConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let same_site = match std::env::var("SESSION_COOKIE_SAME_SITE") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to {}", e, defaults.same_site);
                defaults.same_site
            }),
            Err(_) => defaults.same_site,
        };

        Self {
            name: std::env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.name),
            same_site,
            secure: std::env::var("SESSION_COOKIE_SECURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.secure),
            domain: std::env::var("SESSION_COOKIE_DOMAIN")
                .ok()
                .filter(|d| !d.is_empty()),
            path: defaults.path,
        }
    }

    /// `SameSite=None` is rejected by browsers without `Secure`.
    pub fn is_secure(&self) -> bool {
        self.secure || self.same_site == SameSite::None
    }

    /// `Set-Cookie` value carrying `token` until `expires_at`.
    pub fn session_cookie(&self, token: &str, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let max_age = (expires_at - now).num_seconds().max(0);
        format!(
            "{}={}; Expires={}; Max-Age={}{}",
            self.name,
            token,
            http_date(expires_at),
            max_age,
            self.attributes()
        )
    }

    /// `Set-Cookie` value that makes the client drop the session cookie.
    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; Expires={}; Max-Age=0{}",
            self.name,
            EPOCH_HTTP_DATE,
            self.attributes()
        )
    }

    fn attributes(&self) -> String {
        let mut attrs = format!("; Path={}", self.path);
        if let Some(domain) = &self.domain {
            attrs.push_str(&format!("; Domain={}", domain));
        }
        attrs.push_str("; HttpOnly");
        if self.is_secure() {
            attrs.push_str("; Secure");
        }
        attrs.push_str(&format!("; SameSite={}", self.same_site));
        attrs
    }
}

/// Find the first non-empty value of cookie `name` in a `Cookie` header.
pub fn extract_cookie<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// IMF-fixdate, as required by the `Expires` attribute.
fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_session_cookie_attributes() {
        let config = CookieConfig::default();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let cookie = config.session_cookie("abc123", now + Duration::days(7), now);

        assert_eq!(
            cookie,
            "session_token=abc123; Expires=Wed, 08 Jan 2025 12:00:00 GMT; Max-Age=604800; \
             Path=/; HttpOnly; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn test_same_site_none_forces_secure() {
        let config = CookieConfig {
            same_site: SameSite::None,
            secure: false,
            domain: Some("example.com".to_string()),
            ..CookieConfig::default()
        };
        let cookie = config.clear_cookie();

        assert!(cookie.starts_with("session_token=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0"));
        assert!(cookie.contains("; Domain=example.com"));
        assert!(cookie.contains("; Secure"));
        assert!(cookie.ends_with("; SameSite=None"));
    }

    #[test]
    fn test_insecure_lax_cookie_for_local_http() {
        let config = CookieConfig {
            secure: false,
            ..CookieConfig::default()
        };
        assert!(!config.clear_cookie().contains("Secure"));
    }

    #[test]
    fn test_max_age_never_negative() {
        let config = CookieConfig::default();
        let now = Utc::now();
        let cookie = config.session_cookie("t", now - Duration::hours(1), now);
        assert!(cookie.contains("Max-Age=0;"));
    }

    #[test]
    fn test_extract_cookie() {
        let header = "theme=dark; session_token=deadbeef; other=1";
        assert_eq!(extract_cookie(header, "session_token"), Some("deadbeef"));
        assert_eq!(extract_cookie("session_token=\"quoted\"", "session_token"), Some("quoted"));
        assert_eq!(extract_cookie("session_token=; a=b", "session_token"), None);
        assert_eq!(extract_cookie("xsession_token=abc", "session_token"), None);
        assert_eq!(extract_cookie("garbage;;=", "session_token"), None);
        assert_eq!(extract_cookie("", "session_token"), None);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let header = "session_token=first; session_token=second";
        assert_eq!(extract_cookie(header, "session_token"), Some("first"));
    }

    #[test]
    fn test_parse_same_site() {
        assert_eq!("LAX".parse::<SameSite>().unwrap(), SameSite::Lax);
        assert_eq!(" none ".parse::<SameSite>().unwrap(), SameSite::None);
        assert_eq!("strict".parse::<SameSite>().unwrap(), SameSite::Strict);
        assert!("sideways".parse::<SameSite>().is_err());
    }
}
