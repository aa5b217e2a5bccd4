//! HTTP cookies.
//!
//! [`Cookie`] is the outgoing `Set-Cookie` model; [`parse_cookie_header`]
//! splits an incoming `Cookie` header into name/value pairs.

use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// 9999-12-31T23:59:59Z, the last instant an HTTP date can express.
const LAST_HTTP_DATE_SECS: u64 = 253_402_300_799;

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }

    /// Parse an attribute value, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(SameSite::Strict),
            "lax" => Some(SameSite::Lax),
            "none" => Some(SameSite::None),
            _ => None,
        }
    }
}

/// An outgoing cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    /// `None` makes a browser-session cookie. `Some(0)` deletes the cookie.
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    /// A cookie that tells the client to drop `name` immediately.
    pub fn expired(name: impl Into<String>) -> Self {
        Self::new(name, "").with_max_age(0)
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn is_removal(&self) -> bool {
        self.max_age == Some(0)
    }

    /// Render the `Set-Cookie` header value.
    ///
    /// A positive `Max-Age` is mirrored by an `Expires` date for older
    /// clients; a zero `Max-Age` gets the epoch.
    pub fn to_header_value(&self) -> String {
        let mut cookie = format!("{}={}", self.name, self.value);

        if let Some(ref path) = self.path {
            cookie.push_str(&format!("; Path={}", path));
        }

        if let Some(ref domain) = self.domain {
            cookie.push_str(&format!("; Domain={}", domain));
        }

        if let Some(max_age) = self.max_age {
            cookie.push_str(&format!("; Max-Age={}", max_age.max(0)));
            let expires = match u64::try_from(max_age) {
                Ok(0) | Err(_) => Some(UNIX_EPOCH),
                Ok(secs) => SystemTime::now()
                    .checked_add(Duration::from_secs(secs))
                    .filter(|at| *at <= UNIX_EPOCH + Duration::from_secs(LAST_HTTP_DATE_SECS)),
            };
            // Past the last HTTP date, Max-Age alone is authoritative.
            if let Some(expires) = expires {
                cookie.push_str(&format!("; Expires={}", httpdate::fmt_http_date(expires)));
            }
        }

        if self.secure {
            cookie.push_str("; Secure");
        }

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }

        if let Some(same_site) = self.same_site {
            cookie.push_str(&format!("; SameSite={}", same_site.as_str()));
        }

        cookie
    }
}

impl std::fmt::Display for Cookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

/// Split a `Cookie` request header into `(name, value)` pairs.
///
/// Surrounding double quotes on a value are stripped. Pairs without `=` are
/// skipped.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cookie_header() {
        let cookie = Cookie::new("GIRDER_SESSION", "abc-def")
            .with_path("/")
            .with_domain("example.com")
            .with_secure(true)
            .with_http_only(true)
            .with_same_site(SameSite::Lax);

        assert_eq!(
            cookie.to_header_value(),
            "GIRDER_SESSION=abc-def; Path=/; Domain=example.com; Secure; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn test_expired_cookie() {
        let cookie = Cookie::expired("GIRDER_FLASH").with_path("/");
        assert!(cookie.is_removal());

        let header = cookie.to_header_value();
        assert!(header.starts_with("GIRDER_FLASH=; Path=/; Max-Age=0"));
        assert!(header.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }

    #[test]
    fn test_max_age_sets_expires() {
        let header = Cookie::new("a", "b").with_max_age(600).to_header_value();
        assert!(header.contains("Max-Age=600"));
        assert!(header.contains("Expires="));
        assert!(!header.contains("1970"));
    }

    #[test]
    fn test_huge_max_age_omits_expires() {
        let header = Cookie::new("a", "b").with_max_age(i64::MAX).to_header_value();
        assert!(header.contains(&format!("Max-Age={}", i64::MAX)));
        assert!(!header.contains("Expires="));
    }

    #[test]
    fn test_parse_cookie_header() {
        let pairs = parse_cookie_header("a=1; b=\"two\";c=; =skip; junk");
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "two".to_string()),
                ("c".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_same_site_parse() {
        assert_eq!(SameSite::parse("LAX"), Some(SameSite::Lax));
        assert_eq!(SameSite::parse("strict"), Some(SameSite::Strict));
        assert_eq!(SameSite::parse("sometimes"), None);
    }
}
