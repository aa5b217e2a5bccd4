//! Entry point tying configuration, crypto and clock together.

use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::crypto::CookieCrypto;
use crate::error::SessionResult;
use crate::flash::FlashScope;
use crate::session::Session;
use girder_log::info;
use std::sync::Arc;

/// Process-wide state shared by every session and flash handle.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) config: Arc<SessionConfig>,
    pub(crate) crypto: Arc<CookieCrypto>,
    pub(crate) clock: Arc<dyn Clock>,
}

/// Creates per-request [`Session`] and [`FlashScope`] handles.
///
/// Build one at startup and share it; it is cheap to clone.
///
/// ```
/// use girder_core::{HttpRequest, HttpResponse};
/// use girder_session::{SessionConfig, SessionManager};
///
/// let manager = SessionManager::new(
///     SessionConfig::new("an application secret of 32+ bytes!").unwrap(),
/// )
/// .unwrap();
///
/// let request = HttpRequest::get("/");
/// let session = manager.load_session(&request);
/// session.put("user", "42").unwrap();
///
/// let mut response = HttpResponse::ok();
/// session.save(&request, &mut response).unwrap();
/// assert!(response.cookie("GIRDER_SESSION").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct SessionManager {
    shared: Arc<Shared>,
}

impl SessionManager {
    /// Validate the configuration and prepare the crypto.
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        config.validate()?;
        let crypto = CookieCrypto::new(&config)?;

        info!(
            target: "girder::session",
            { cookie = config.session_cookie_name(), encrypt = config.encrypt },
            "Cookie sessions configured"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                config: Arc::new(config),
                crypto: Arc::new(crypto),
                clock: Arc::new(SystemClock),
            }),
        })
    }

    /// Replace the time source.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config: self.shared.config.clone(),
                crypto: self.shared.crypto.clone(),
                clock,
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    pub fn crypto(&self) -> &CookieCrypto {
        &self.shared.crypto
    }

    /// A fresh, empty session. Call [`Session::init`] before use.
    pub fn session(&self) -> Session {
        Session::new(self.shared.clone())
    }

    /// A fresh, empty flash scope. Call [`FlashScope::init`] before use.
    pub fn flash(&self) -> FlashScope {
        FlashScope::new(self.shared.clone())
    }

    /// A session initialized from `request`.
    pub fn load_session(&self, request: &girder_core::HttpRequest) -> Session {
        let session = self.session();
        session.init(request);
        session
    }

    /// A flash scope initialized from `request`.
    pub fn load_flash(&self, request: &girder_core::HttpRequest) -> FlashScope {
        let flash = self.flash();
        flash.init(request);
        flash
    }
}
