//! Session and flash cookie configuration.

use crate::error::{SessionError, SessionResult};
use girder_core::SameSite;
use serde::Deserialize;
use std::time::Duration;

/// Minimum secret length, in bytes, accepted for signing.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest session lifetime accepted, in seconds (400 days, the cap
/// browsers apply to cookie lifetimes).
pub const MAX_EXPIRE_SECS: u64 = 400 * 24 * 60 * 60;

/// Cookie session configuration.
///
/// Everything here is read once at startup and shared by every request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Prefix of the cookie names (`<prefix>_SESSION`, `<prefix>_FLASH`)
    pub cookie_prefix: String,
    /// Application secret used to sign and encrypt session cookies
    pub secret: String,
    /// Encrypt the session payload before signing it
    pub encrypt: bool,
    /// Sliding session lifetime in seconds; `None` keeps sessions until the
    /// browser closes
    pub expire_time_secs: Option<u64>,
    /// Only send the session cookie when the session changed. When false,
    /// a session with an expiry is re-sent on every response to slide it.
    pub send_only_if_changed: bool,
    pub secure: bool,
    pub http_only: bool,
    pub path: String,
    pub domain: Option<String>,
    pub same_site: Option<SameSite>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_prefix: "GIRDER".to_string(),
            secret: String::new(),
            encrypt: true,
            expire_time_secs: None,
            send_only_if_changed: true,
            secure: true,
            http_only: true,
            path: "/".to_string(),
            domain: None,
            same_site: Some(SameSite::Lax),
        }
    }
}

impl SessionConfig {
    /// Create a configuration with the given secret.
    ///
    /// # Examples
    ///
    /// ```
    /// use girder_session::SessionConfig;
    ///
    /// let config = SessionConfig::new("an application secret of 32+ bytes!").unwrap();
    /// assert_eq!(config.session_cookie_name(), "GIRDER_SESSION");
    ///
    /// assert!(SessionConfig::new("short").is_err());
    /// ```
    pub fn new(secret: impl Into<String>) -> SessionResult<Self> {
        let config = Self {
            secret: secret.into(),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Generate a random hex secret suitable for [`SessionConfig::new`].
    pub fn generate_secret() -> String {
        use rand::Rng;
        let bytes: [u8; 32] = rand::thread_rng().r#gen();
        hex::encode(bytes)
    }

    /// Read the configuration from `GIRDER_*` environment variables.
    pub fn from_env() -> SessionResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration from an arbitrary variable source.
    ///
    /// Recognised keys: `GIRDER_SECRET`, `GIRDER_COOKIE_PREFIX`,
    /// `GIRDER_COOKIE_ENCRYPTION`, `GIRDER_SESSION_EXPIRE_SECS`,
    /// `GIRDER_SESSION_SEND_ONLY_IF_CHANGED`, `GIRDER_SESSION_SECURE`,
    /// `GIRDER_SESSION_HTTP_ONLY`, `GIRDER_COOKIE_PATH`,
    /// `GIRDER_COOKIE_DOMAIN`, `GIRDER_COOKIE_SAME_SITE`.
    pub fn from_lookup<F>(lookup: F) -> SessionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str, default: bool| -> SessionResult<bool> {
            match lookup(key) {
                None => Ok(default),
                Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => Ok(true),
                    "0" | "false" | "no" | "off" => Ok(false),
                    _ => Err(SessionError::Config(format!("{} must be a boolean, got {:?}", key, v))),
                },
            }
        };

        let mut config = Self::default();
        config.secret = lookup("GIRDER_SECRET")
            .ok_or_else(|| SessionError::Config("GIRDER_SECRET is not set".to_string()))?;

        if let Some(prefix) = lookup("GIRDER_COOKIE_PREFIX") {
            config.cookie_prefix = prefix;
        }
        config.encrypt = flag("GIRDER_COOKIE_ENCRYPTION", config.encrypt)?;
        config.send_only_if_changed =
            flag("GIRDER_SESSION_SEND_ONLY_IF_CHANGED", config.send_only_if_changed)?;
        config.secure = flag("GIRDER_SESSION_SECURE", config.secure)?;
        config.http_only = flag("GIRDER_SESSION_HTTP_ONLY", config.http_only)?;

        if let Some(secs) = lookup("GIRDER_SESSION_EXPIRE_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                SessionError::Config(format!(
                    "GIRDER_SESSION_EXPIRE_SECS must be a number of seconds, got {:?}",
                    secs
                ))
            })?;
            config.expire_time_secs = Some(secs);
        }
        if let Some(path) = lookup("GIRDER_COOKIE_PATH") {
            config.path = path;
        }
        config.domain = lookup("GIRDER_COOKIE_DOMAIN").filter(|d| !d.is_empty());
        if let Some(same_site) = lookup("GIRDER_COOKIE_SAME_SITE") {
            config.same_site = Some(SameSite::parse(&same_site).ok_or_else(|| {
                SessionError::Config(format!("unknown SameSite policy {:?}", same_site))
            })?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the invariants that cannot be expressed in the types.
    pub fn validate(&self) -> SessionResult<()> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(SessionError::Config(format!(
                "Secret key must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if self.cookie_prefix.is_empty() {
            return Err(SessionError::Config("Cookie prefix must not be empty".to_string()));
        }
        if let Some(secs) = self.expire_time_secs {
            if secs > MAX_EXPIRE_SECS {
                return Err(SessionError::Config(format!(
                    "Session expiry must be at most {} seconds, got {}",
                    MAX_EXPIRE_SECS, secs
                )));
            }
        }
        Ok(())
    }

    pub fn session_cookie_name(&self) -> String {
        format!("{}_SESSION", self.cookie_prefix)
    }

    pub fn flash_cookie_name(&self) -> String {
        format!("{}_FLASH", self.cookie_prefix)
    }

    pub fn expire_time(&self) -> Option<Duration> {
        self.expire_time_secs.map(Duration::from_secs)
    }

    pub fn with_cookie_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cookie_prefix = prefix.into();
        self
    }

    pub fn with_encryption(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// Set the sliding session lifetime.
    pub fn with_expire_time(mut self, ttl: Duration) -> Self {
        self.expire_time_secs = Some(ttl.as_secs());
        self
    }

    pub fn with_send_only_if_changed(mut self, only_if_changed: bool) -> Self {
        self.send_only_if_changed = only_if_changed;
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

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_same_site(mut self, same_site: Option<SameSite>) -> Self {
        self.same_site = same_site;
        self
    }
}
