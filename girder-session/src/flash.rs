//! Flash scope: values that survive exactly one redirect.
//!
//! A flash scope holds two maps. `current` is what this request can see,
//! seeded from the previous request; `outgoing` is what will be sent to the
//! next one. Reads see `current`. [`FlashScope::put`] writes both maps,
//! [`FlashScope::now`] only `current`.
//! The flash cookie is not signed; it must never carry anything that needs
//! integrity.

use crate::codec;
use crate::error::{SessionError, SessionResult};
use crate::manager::Shared;
use girder_core::{Cookie, HttpRequest, HttpResponse};
use girder_log::trace;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Conventional key for success messages.
pub const SUCCESS_KEY: &str = "success";
/// Conventional key for error messages.
pub const ERROR_KEY: &str = "error";

#[derive(Debug, Default)]
struct FlashState {
    current: HashMap<String, String>,
    outgoing: HashMap<String, String>,
}

/// Per-request flash scope. Clones share state.
#[derive(Clone)]
pub struct FlashScope {
    state: Arc<Mutex<FlashState>>,
    shared: Arc<Shared>,
}

impl FlashScope {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            state: Arc::default(),
            shared,
        }
    }

    /// Load the values left by the previous request. A malformed cookie is
    /// ignored.
    pub fn init(&self, request: &HttpRequest) {
        let mut state = self.state.lock();
        state.current.clear();
        state.outgoing.clear();

        let cookie_name = self.shared.config.flash_cookie_name();
        if let Some(value) = request.cookie(&cookie_name) {
            codec::decode_into(&mut state.current, &value);
            trace!(target: "girder::flash", { entries = state.current.len() }, "flash loaded");
        }
    }

    fn checked_key(key: String) -> SessionResult<String> {
        if codec::is_valid_key(&key) {
            Ok(key)
        } else {
            Err(SessionError::InvalidKey(key))
        }
    }

    /// Store a value visible now and carried to the next request.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> SessionResult<()> {
        let key = Self::checked_key(key.into())?;
        let value = value.into();
        let mut state = self.state.lock();
        state.current.insert(key.clone(), value.clone());
        state.outgoing.insert(key, value);
        Ok(())
    }

    /// Store a value for this request only.
    pub fn now(&self, key: impl Into<String>, value: impl Into<String>) -> SessionResult<()> {
        let key = Self::checked_key(key.into())?;
        self.state.lock().current.insert(key, value.into());
        Ok(())
    }

    /// The current value of `key`. A key the codec rejects can never have
    /// been stored, so looking one up is simply a miss.
    pub fn get(&self, key: &str) -> Option<String> {
        self.state.lock().current.get(key).cloned()
    }

    /// Whether `key` has a current value. Invalid keys are never present.
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().current.contains_key(key)
    }

    /// Remove `key` from both maps.
    pub fn remove(&self, key: &str) -> SessionResult<Option<String>> {
        let key = Self::checked_key(key.to_string())?;
        let mut state = self.state.lock();
        let outgoing = state.outgoing.remove(&key);
        Ok(state.current.remove(&key).or(outgoing))
    }

    /// Stop `key` from reaching the next request.
    pub fn discard_key(&self, key: &str) -> SessionResult<()> {
        let key = Self::checked_key(key.to_string())?;
        self.state.lock().outgoing.remove(&key);
        Ok(())
    }

    /// Send nothing to the next request.
    pub fn discard(&self) {
        self.state.lock().outgoing.clear();
    }

    /// Carry the current value of `key` over to the next request.
    pub fn keep_key(&self, key: &str) -> SessionResult<()> {
        let key = Self::checked_key(key.to_string())?;
        let mut state = self.state.lock();
        if let Some(value) = state.current.get(&key).cloned() {
            state.outgoing.insert(key, value);
        }
        Ok(())
    }

    /// Carry every current value over to the next request.
    pub fn keep(&self) {
        let mut state = self.state.lock();
        let current = state.current.clone();
        state.outgoing.extend(current);
    }

    /// Forget the values received from the previous request.
    pub fn clear_current(&self) {
        self.state.lock().current.clear();
    }

    pub fn success(&self, message: impl Into<String>) -> SessionResult<()> {
        self.put(SUCCESS_KEY, message)
    }

    pub fn error(&self, message: impl Into<String>) -> SessionResult<()> {
        self.put(ERROR_KEY, message)
    }

    pub fn current_data(&self) -> HashMap<String, String> {
        self.state.lock().current.clone()
    }

    pub fn outgoing_data(&self) -> HashMap<String, String> {
        self.state.lock().outgoing.clone()
    }

    /// Write the flash cookie for the next request.
    ///
    /// An empty outgoing map removes a flash cookie the request carried, and
    /// sends nothing otherwise.
    pub fn save(&self, request: &HttpRequest, response: &mut HttpResponse) {
        let state = self.state.lock();
        let cookie_name = self.shared.config.flash_cookie_name();

        let cookie = if state.outgoing.is_empty() {
            if request.cookie(&cookie_name).is_none() {
                return;
            }
            Cookie::expired(cookie_name)
        } else {
            Cookie::new(cookie_name, codec::encode(&state.outgoing))
        };

        response.add_cookie(self.cookie_attributes(cookie));
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

impl fmt::Debug for FlashScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FlashScope")
            .field("current", &state.current.len())
            .field("outgoing", &state.outgoing.len())
            .finish()
    }
}
