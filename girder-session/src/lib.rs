//! Signed cookie sessions and flash scope for Girder.
//!
//! Session state lives entirely in the client. Each request loads it from a
//! cookie, handlers read and write it, and the response carries it back.
//!
//! - [`codec`] turns a string map into a cookie-safe value and back
//! - [`CookieCrypto`] signs with HMAC-SHA256 and optionally encrypts with
//!   AES-256-GCM
//! - [`Session`] is the signed per-user store, with sliding expiry
//! - [`FlashScope`] carries messages across exactly one redirect
//!
//! # Example
//!
//! ```
//! use girder_core::{HttpRequest, HttpResponse};
//! use girder_session::prelude::*;
//!
//! let config = SessionConfig::new(SessionConfig::generate_secret()).unwrap();
//! let manager = SessionManager::new(config).unwrap();
//!
//! // First request: log in and leave a message.
//! let request = HttpRequest::post("/login");
//! let session = manager.load_session(&request);
//! let flash = manager.load_flash(&request);
//! session.put("user", "ada").unwrap();
//! flash.success("Welcome back").unwrap();
//!
//! let mut response = HttpResponse::ok();
//! session.save(&request, &mut response).unwrap();
//! flash.save(&request, &mut response);
//!
//! // Second request: the browser sends both cookies back.
//! let mut next = HttpRequest::get("/");
//! for cookie in &response.cookies {
//!     next = next.with_cookie(&cookie.name, &cookie.value);
//! }
//! assert_eq!(manager.load_session(&next).get("user").as_deref(), Some("ada"));
//! assert_eq!(manager.load_flash(&next).get("success").as_deref(), Some("Welcome back"));
//! ```

pub mod clock;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod flash;
pub mod manager;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{MAX_EXPIRE_SECS, MIN_SECRET_LEN, SessionConfig};
pub use crypto::CookieCrypto;
pub use error::{SessionError, SessionResult};
pub use flash::FlashScope;
pub use manager::SessionManager;
pub use session::Session;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock};
    pub use crate::config::SessionConfig;
    pub use crate::error::{SessionError, SessionResult};
    pub use crate::flash::FlashScope;
    pub use crate::manager::SessionManager;
    pub use crate::session::Session;
}
