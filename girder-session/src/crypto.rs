//! Signing and encryption of cookie payloads.
//!
//! Session cookies carry `<hex signature>-<payload>`, where the payload is
//! the codec output, optionally AES-256-GCM encrypted and base64url encoded.
//! The signature is an HMAC-SHA256 over the payload exactly as sent, so
//! encryption happens first and the MAC covers the ciphertext.

use crate::config::{MIN_SECRET_LEN, SessionConfig};
use crate::error::{SessionError, SessionResult};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

const ENCRYPTION_KEY_CONTEXT: &[u8] = b"girder.cookie.encryption.v1";

/// Application-wide cookie crypto. Immutable once built.
pub struct CookieCrypto {
    mac: HmacSha256,
    cipher: Option<LessSafeKey>,
    rng: SystemRandom,
}

impl CookieCrypto {
    pub fn new(config: &SessionConfig) -> SessionResult<Self> {
        Self::from_secret(config.secret.as_bytes(), config.encrypt)
    }

    /// Build from a raw secret. The secret must be at least 32 bytes.
    pub fn from_secret(secret: &[u8], encrypt: bool) -> SessionResult<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(SessionError::Config(format!(
                "Secret key must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| SessionError::Config(e.to_string()))?;

        let cipher = if encrypt {
            let mut derive = mac.clone();
            derive.update(ENCRYPTION_KEY_CONTEXT);
            let key_bytes = derive.finalize().into_bytes();
            let key = UnboundKey::new(&AES_256_GCM, &key_bytes)
                .map_err(|_| SessionError::Config("cannot build encryption key".to_string()))?;
            Some(LessSafeKey::new(key))
        } else {
            None
        };

        Ok(Self {
            mac,
            cipher,
            rng: SystemRandom::new(),
        })
    }

    pub fn is_encrypting(&self) -> bool {
        self.cipher.is_some()
    }

    /// Hex HMAC-SHA256 of `payload`.
    pub fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Check `signature` against `payload` in constant time.
    pub fn verify(&self, payload: &str, signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    /// Encrypt `payload`. Returns it unchanged when encryption is off.
    pub fn encrypt(&self, payload: &str) -> SessionResult<String> {
        let Some(ref cipher) = self.cipher else {
            return Ok(payload.to_string());
        };

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| SessionError::Crypto("random source failed".to_string()))?;

        let mut sealed = payload.as_bytes().to_vec();
        cipher
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut sealed,
            )
            .map_err(|_| SessionError::Crypto("encryption failed".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(URL_SAFE_NO_PAD.encode(out))
    }

    /// Reverse [`CookieCrypto::encrypt`]. `None` for anything that does not
    /// authenticate.
    pub fn decrypt(&self, ciphertext: &str) -> Option<String> {
        let Some(ref cipher) = self.cipher else {
            return Some(ciphertext.to_string());
        };

        let raw = URL_SAFE_NO_PAD.decode(ciphertext).ok()?;
        if raw.len() < NONCE_LEN {
            return None;
        }
        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce).ok()?;

        let mut buffer = sealed.to_vec();
        let plain = cipher.open_in_place(nonce, Aad::empty(), &mut buffer).ok()?;
        String::from_utf8(plain.to_vec()).ok()
    }

    /// Encrypt then sign, producing a cookie value.
    pub fn seal(&self, payload: &str) -> SessionResult<String> {
        let payload = self.encrypt(payload)?;
        Ok(format!("{}-{}", self.sign(&payload), payload))
    }

    /// Verify then decrypt a cookie value produced by [`CookieCrypto::seal`].
    pub fn open(&self, cookie_value: &str) -> Option<String> {
        let (signature, payload) = cookie_value.split_once('-')?;
        if !self.verify(payload, signature) {
            return None;
        }
        self.decrypt(payload)
    }
}

impl fmt::Debug for CookieCrypto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieCrypto")
            .field("encrypting", &self.is_encrypting())
            .finish_non_exhaustive()
    }
}
