//! Signed cookie session.

use crate::codec;
use crate::config::MAX_EXPIRE_SECS;
use crate::error::{SessionError, SessionResult};
use crate::manager::Shared;
use girder_core::{Cookie, HttpRequest, HttpResponse};
use girder_log::{debug, trace};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Reserved key holding the session id.
pub const ID_KEY: &str = "__id";
/// Reserved key holding the authenticity token.
pub const AUTHENTICITY_KEY: &str = "__at";
/// Reserved key holding the last-access timestamp, in epoch millis.
pub const TIMESTAMP_KEY: &str = "__ts";
/// Reserved key holding a per-session expiry override, in millis.
pub const EXPIRY_KEY: &str = "__exp";

#[derive(Debug, Default)]
struct SessionState {
    data: HashMap<String, String>,
    dirty: bool,
}

/// A per-request, client-side session.
///
/// The handle is cheap to clone; clones share state. A session starts empty
/// and is populated by [`Session::init`] from the request cookie. Changes are
/// written back by [`Session::save`].
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    shared: Arc<Shared>,
}

impl Session {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            state: Arc::default(),
            shared,
        }
    }

    /// Load the session from the request cookie.
    ///
    /// A missing, forged, undecodable or expired cookie leaves the session
    /// empty. A live session with an expiry gets its timestamp moved to now.
    pub fn init(&self, request: &HttpRequest) {
        let mut state = self.state.lock();
        state.data.clear();
        state.dirty = false;

        let cookie_name = self.shared.config.session_cookie_name();
        let Some(value) = request.cookie(&cookie_name) else {
            return;
        };

        let Some(payload) = self.shared.crypto.open(&value) else {
            debug!(target: "girder::session", "session cookie failed verification, discarding");
            state.dirty = true;
            return;
        };

        let mut data = HashMap::new();
        if !codec::decode_into(&mut data, &payload) {
            state.dirty = true;
            return;
        }

        if let Some(ttl) = self.effective_expiry(&data) {
            let now = self.shared.clock.now_millis();
            let last_access = data.get(TIMESTAMP_KEY).and_then(|ts| ts.parse::<i64>().ok());

            match last_access {
                Some(ts) if ts.saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)) >= now => {
                    data.insert(TIMESTAMP_KEY.to_string(), now.to_string());
                }
                _ => {
                    debug!(target: "girder::session", { last_access = format!("{:?}", last_access) }, "session expired");
                    state.dirty = true;
                    return;
                }
            }
        }

        trace!(target: "girder::session", { entries = data.len() }, "session loaded");
        state.data = data;
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.state.lock().data.get(key).cloned()
    }

    /// Store a value. Keys containing `:` or NUL are rejected.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> SessionResult<()> {
        let key = key.into();
        if !codec::is_valid_key(&key) {
            return Err(SessionError::InvalidKey(key));
        }
        let mut state = self.state.lock();
        state.data.insert(key, value.into());
        state.dirty = true;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        let mut state = self.state.lock();
        state.dirty = true;
        state.data.remove(key)
    }

    /// Drop every entry, reserved ones included.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.data.clear();
        state.dirty = true;
    }

    /// True when nothing but the timestamp and expiry override is stored.
    pub fn is_empty(&self) -> bool {
        Self::is_data_empty(&self.state.lock().data)
    }

    fn is_data_empty(data: &HashMap<String, String>) -> bool {
        data.keys().all(|k| k == TIMESTAMP_KEY || k == EXPIRY_KEY)
    }

    /// Copy of the stored entries.
    pub fn data(&self) -> HashMap<String, String> {
        self.state.lock().data.clone()
    }

    /// The session id, generated on first use.
    pub fn id(&self) -> String {
        self.get_or_insert_with(ID_KEY, || uuid::Uuid::new_v4().to_string())
    }

    /// The authenticity token, generated on first use.
    pub fn authenticity_token(&self) -> String {
        self.get_or_insert_with(AUTHENTICITY_KEY, || {
            let bytes: [u8; 32] = rand::thread_rng().r#gen();
            hex::encode(bytes)
        })
    }

    fn get_or_insert_with(&self, key: &str, generate: impl FnOnce() -> String) -> String {
        let mut state = self.state.lock();
        if let Some(existing) = state.data.get(key) {
            return existing.clone();
        }
        let value = generate();
        state.data.insert(key.to_string(), value.clone());
        state.dirty = true;
        value
    }

    /// Override the configured lifetime for this session. `None` returns to
    /// the configured default. Lifetimes above [`MAX_EXPIRE_SECS`] are
    /// clamped to it.
    pub fn set_expiry_time(&self, expiry: Option<Duration>) {
        let mut state = self.state.lock();
        match expiry {
            Some(ttl) => {
                let millis = clamp_expiry(ttl).as_millis();
                state.data.insert(EXPIRY_KEY.to_string(), millis.to_string());
            }
            None => {
                state.data.remove(EXPIRY_KEY);
            }
        }
        state.dirty = true;
    }

    /// Lifetime in effect: the per-session override, else the configured one.
    pub fn expiry_time(&self) -> Option<Duration> {
        self.effective_expiry(&self.state.lock().data)
    }

    fn effective_expiry(&self, data: &HashMap<String, String>) -> Option<Duration> {
        data.get(EXPIRY_KEY)
            .and_then(|ms| ms.parse::<u64>().ok())
            .map(Duration::from_millis)
            .or_else(|| self.shared.config.expire_time())
            .map(clamp_expiry)
    }

    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    /// Write the session cookie onto `response` if required.
    ///
    /// Nothing is sent for an unchanged session, unless it has an expiry and
    /// the configuration asks for the cookie on every response. An empty
    /// session that arrived with a cookie gets a removal cookie.
    pub fn save(&self, request: &HttpRequest, response: &mut HttpResponse) -> SessionResult<()> {
        let mut state = self.state.lock();
        let config = &self.shared.config;
        let expiry = self.effective_expiry(&state.data);

        let refresh = expiry.is_some() && !config.send_only_if_changed;
        if !state.dirty && !refresh {
            return Ok(());
        }

        let cookie_name = config.session_cookie_name();

        if Self::is_data_empty(&state.data) {
            if request.cookie(&cookie_name).is_some() {
                trace!(target: "girder::session", "removing session cookie");
                response.add_cookie(self.cookie_attributes(Cookie::expired(cookie_name)));
            }
            return Ok(());
        }

        let now = self.shared.clock.now_millis();
        state
            .data
            .entry(TIMESTAMP_KEY.to_string())
            .or_insert_with(|| now.to_string());

        let value = self.shared.crypto.seal(&codec::encode(&state.data))?;
        let mut cookie = self.cookie_attributes(Cookie::new(cookie_name, value));
        if let Some(ttl) = expiry {
            cookie = cookie.with_max_age(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX));
        }

        response.add_cookie(cookie);
        Ok(())
    }

    fn cookie_attributes(&self, mut cookie: Cookie) -> Cookie {
        let config = &self.shared.config;
        cookie = cookie
            .with_path(config.path.clone())
            .with_secure(config.secure)
            .with_http_only(config.http_only);
        if let Some(ref domain) = config.domain {
            cookie = cookie.with_domain(domain.clone());
        }
        if let Some(same_site) = config.same_site {
            cookie = cookie.with_same_site(same_site);
        }
        cookie
    }
}

fn clamp_expiry(ttl: Duration) -> Duration {
    ttl.min(Duration::from_secs(MAX_EXPIRE_SECS))
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Session")
            .field("entries", &state.data.len())
            .field("dirty", &state.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::{SessionConfig, SessionManager};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const START: i64 = 1_700_000_000_000;

    fn manager(config: SessionConfig) -> (SessionManager, ManualClock) {
        let clock = ManualClock::new(START);
        let manager = SessionManager::new(config)
            .unwrap()
            .with_clock(Arc::new(clock.clone()));
        (manager, clock)
    }

    fn config() -> SessionConfig {
        SessionConfig::new(SECRET).unwrap()
    }

    fn round_trip(manager: &SessionManager, response: &HttpResponse) -> Session {
        let cookie = response.cookie("GIRDER_SESSION").unwrap();
        let request = HttpRequest::get("/").with_cookie(&cookie.name, &cookie.value);
        manager.load_session(&request)
    }

    #[test]
    fn test_new_session_is_empty_and_clean() {
        let (manager, _) = manager(config());
        let session = manager.load_session(&HttpRequest::get("/"));
        assert!(session.is_empty());
        assert!(!session.is_dirty());

        let mut response = HttpResponse::ok();
        session.save(&HttpRequest::get("/"), &mut response).unwrap();
        assert!(response.cookies.is_empty());
    }

    #[test]
    fn test_put_save_and_reload() {
        let (manager, _) = manager(config());
        let request = HttpRequest::get("/");
        let session = manager.load_session(&request);
        session.put("user", "42").unwrap();
        session.put("name", "Ada: Countess%\u{0}").unwrap();

        let mut response = HttpResponse::ok();
        session.save(&request, &mut response).unwrap();

        let cookie = response.cookie("GIRDER_SESSION").unwrap();
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert!(cookie.http_only);
        assert_eq!(cookie.max_age, None);

        let reloaded = round_trip(&manager, &response);
        assert_eq!(reloaded.get("user").as_deref(), Some("42"));
        assert_eq!(reloaded.get("name").as_deref(), Some("Ada: Countess%\u{0}"));
        assert!(reloaded.get(TIMESTAMP_KEY).is_some());
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let (manager, _) = manager(config());
        let session = manager.session();
        assert_eq!(
            session.put("a:b", "x"),
            Err(SessionError::InvalidKey("a:b".to_string()))
        );
        assert!(session.put("a\u{0}", "x").is_err());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_is_empty_ignores_reserved_time_keys() {
        let (manager, _) = manager(config());
        let session = manager.session();
        session.put(TIMESTAMP_KEY, "1").unwrap();
        session.set_expiry_time(Some(Duration::from_secs(5)));
        assert!(session.is_empty());

        session.put("k", "v").unwrap();
        assert!(!session.is_empty());
    }

    #[test]
    fn test_id_and_token_are_generated_once() {
        let (manager, _) = manager(config());
        let session = manager.session();
        let id = session.id();
        assert!(session.is_dirty());
        assert_eq!(session.id(), id);
        assert_eq!(uuid::Uuid::parse_str(&id).unwrap().get_version_num(), 4);

        let token = session.authenticity_token();
        assert_eq!(token.len(), 64);
        assert_eq!(session.authenticity_token(), token);
        assert_ne!(manager.session().authenticity_token(), token);
    }

    #[test]
    fn test_data_is_a_snapshot() {
        let (manager, _) = manager(config());
        let session = manager.session();
        session.put("a", "1").unwrap();
        let mut snapshot = session.data();
        snapshot.insert("b".to_string(), "2".to_string());
        assert_eq!(session.get("b"), None);
    }

    #[test]
    fn test_cleared_session_expires_cookie() {
        let (manager, _) = manager(config());
        let session = manager.session();
        session.put("user", "42").unwrap();
        let mut response = HttpResponse::ok();
        session.save(&HttpRequest::get("/"), &mut response).unwrap();

        let cookie = response.cookie("GIRDER_SESSION").unwrap().clone();
        let request = HttpRequest::get("/").with_cookie(&cookie.name, &cookie.value);
        let session = manager.load_session(&request);
        session.clear();

        let mut response = HttpResponse::ok();
        session.save(&request, &mut response).unwrap();
        let removal = response.cookie("GIRDER_SESSION").unwrap();
        assert!(removal.is_removal());
        assert_eq!(removal.value, "");
    }

    #[test]
    fn test_cleared_session_without_cookie_sends_nothing() {
        let (manager, _) = manager(config());
        let session = manager.session();
        session.clear();
        let mut response = HttpResponse::ok();
        session.save(&HttpRequest::get("/"), &mut response).unwrap();
        assert!(response.cookies.is_empty());
    }

    #[test]
    fn test_tampered_cookie_yields_empty_session() {
        let (manager, _) = manager(config().with_encryption(false));
        let session = manager.session();
        session.put("role", "user").unwrap();
        let mut response = HttpResponse::ok();
        session.save(&HttpRequest::get("/"), &mut response).unwrap();
        let value = response.cookie("GIRDER_SESSION").unwrap().value.clone();

        for index in 0..value.len() {
            let mut bytes = value.clone().into_bytes();
            bytes[index] = if bytes[index] == b'0' { b'1' } else { b'0' };
            let forged = String::from_utf8(bytes).unwrap();
            let request = HttpRequest::get("/").with_cookie("GIRDER_SESSION", &forged);
            let session = manager.load_session(&request);
            assert!(session.is_empty(), "byte {} flip was accepted", index);
        }
    }

    #[test]
    fn test_sliding_expiry() {
        let (manager, clock) = manager(config().with_expire_time(Duration::from_secs(600)));
        let session = manager.session();
        session.put("user", "42").unwrap();
        let mut response = HttpResponse::ok();
        session.save(&HttpRequest::get("/"), &mut response).unwrap();
        assert_eq!(response.cookie("GIRDER_SESSION").unwrap().max_age, Some(600));

        clock.advance(Duration::from_secs(9 * 60));
        let alive = round_trip(&manager, &response);
        assert_eq!(alive.get("user").as_deref(), Some("42"));
        assert_eq!(alive.get(TIMESTAMP_KEY), Some(clock.now_millis().to_string()));
        assert!(!alive.is_dirty());

        clock.advance(Duration::from_secs(2 * 60));
        let expired = round_trip(&manager, &response);
        assert_eq!(expired.get("user"), None);
        assert!(expired.is_empty());
    }

    #[test]
    fn test_send_every_time_when_configured() {
        let (manager, _) = manager(
            config()
                .with_expire_time(Duration::from_secs(60))
                .with_send_only_if_changed(false),
        );
        let session = manager.session();
        session.put("user", "1").unwrap();
        let mut first = HttpResponse::ok();
        session.save(&HttpRequest::get("/"), &mut first).unwrap();

        let reloaded = round_trip(&manager, &first);
        assert!(!reloaded.is_dirty());
        let mut second = HttpResponse::ok();
        reloaded.save(&HttpRequest::get("/"), &mut second).unwrap();
        assert!(second.cookie("GIRDER_SESSION").is_some());
    }

    #[test]
    fn test_huge_expiry_override_is_clamped() {
        let (manager, _) = manager(config());
        let session = manager.session();
        session.put("user", "1").unwrap();
        session.set_expiry_time(Some(Duration::from_secs(u64::MAX)));
        assert_eq!(session.expiry_time(), Some(Duration::from_secs(MAX_EXPIRE_SECS)));

        let mut response = HttpResponse::ok();
        session.save(&HttpRequest::get("/"), &mut response).unwrap();
        let cookie = response.cookie("GIRDER_SESSION").unwrap();
        assert_eq!(cookie.max_age, Some(MAX_EXPIRE_SECS as i64));
        assert!(cookie.to_header_value().contains("Expires="));

        let reloaded = round_trip(&manager, &response);
        assert_eq!(reloaded.get("user").as_deref(), Some("1"));
    }

    #[test]
    fn test_per_session_expiry_override() {
        let (manager, clock) = manager(config());
        let session = manager.session();
        session.put("user", "42").unwrap();
        session.set_expiry_time(Some(Duration::from_secs(30)));
        assert_eq!(session.expiry_time(), Some(Duration::from_secs(30)));

        let mut response = HttpResponse::ok();
        session.save(&HttpRequest::get("/"), &mut response).unwrap();
        assert_eq!(response.cookie("GIRDER_SESSION").unwrap().max_age, Some(30));

        clock.advance(Duration::from_secs(31));
        assert!(round_trip(&manager, &response).is_empty());
    }
}
