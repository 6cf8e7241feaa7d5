//! Server-side sessions keyed by a signed cookie.
//!
//! The cookie carries only `<id>.<signature>`, where the signature is the
//! base64 HMAC-SHA1 of the id under the server's session secret. Session data
//! itself never leaves the server. A cookie whose signature does not verify
//! is treated as absent. Sessions untouched for longer than the store's TTL
//! are dropped.

use crate::booking::BookingRecord;
use axum::http::{header, HeaderMap, HeaderValue};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "booking_session";

/// Idle time after which a session is forgotten.
pub const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// What one browser has done so far.
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    /// Extracted (and possibly operator-edited) record.
    pub booking_data: Option<BookingRecord>,
    /// Confirmation written by the last generate.
    pub html_output: Option<PathBuf>,
    /// Never set; PDFs are printed from the browser.
    pub pdf_output: Option<PathBuf>,
}

struct Entry {
    data: SessionData,
    touched: Instant,
}

impl Entry {
    fn is_live(&self, ttl: Duration) -> bool {
        self.touched.elapsed() < ttl
    }
}

pub struct SessionStore {
    secret: Vec<u8>,
    ttl: Duration,
    sessions: Mutex<HashMap<String, Entry>>,
}

impl SessionStore {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, SESSION_TTL)
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn mac(&self) -> Option<Hmac<Sha1>> {
        Hmac::<Sha1>::new_from_slice(&self.secret).ok()
    }

    /// Cookie value for a session id.
    pub fn cookie_value(&self, id: &str) -> Option<String> {
        let mut mac = self.mac()?;
        mac.update(id.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Some(format!("{id}.{signature}"))
    }

    /// The session id inside a cookie value, if the signature checks out.
    pub fn verify(&self, value: &str) -> Option<String> {
        let (id, signature) = value.rsplit_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        let mut mac = self.mac()?;
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(id.to_string())
    }

    /// The verified session id sent with a request.
    pub fn session_id(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, value)| self.verify(value))
    }

    /// `Set-Cookie` header value for a session id.
    pub fn set_cookie(&self, id: &str) -> Option<HeaderValue> {
        let value = self.cookie_value(id)?;
        HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax"
        ))
        .ok()
    }

    /// Snapshot of a live session's data. Reading counts as activity.
    pub fn get(&self, id: &str) -> Option<SessionData> {
        let mut sessions = self.lock();
        let entry = sessions.get_mut(id).filter(|e| e.is_live(self.ttl))?;
        entry.touched = Instant::now();
        Some(entry.data.clone())
    }

    /// Mutate a session, creating it if needed. Expired sessions are
    /// evicted first.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut SessionData) -> R) -> R {
        let mut sessions = self.lock();
        let ttl = self.ttl;
        sessions.retain(|_, e| e.is_live(ttl));
        let entry = sessions.entry(id.to_string()).or_insert_with(|| Entry {
            data: SessionData::default(),
            touched: Instant::now(),
        });
        entry.touched = Instant::now();
        f(&mut entry.data)
    }

    /// Number of sessions held, expired or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_cookie_round_trips() {
        let store = SessionStore::new("secret");
        let value = store.cookie_value("abc-123").unwrap();
        assert_eq!(store.verify(&value).as_deref(), Some("abc-123"));
    }

    #[test]
    fn tampered_or_foreign_cookies_rejected() {
        let store = SessionStore::new("secret");
        let value = store.cookie_value("abc-123").unwrap();
        let tampered = value.replacen("abc", "abd", 1);
        assert!(store.verify(&tampered).is_none());
        assert!(store.verify("abc-123").is_none());
        assert!(SessionStore::new("other").verify(&value).is_none());
    }

    #[test]
    fn session_id_from_cookie_header() {
        let store = SessionStore::new("secret");
        let mut headers = HeaderMap::new();
        let cookie = format!("theme=dark; {SESSION_COOKIE}={}", store.cookie_value("s1").unwrap());
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());
        assert_eq!(store.session_id(&headers).as_deref(), Some("s1"));
    }

    #[test]
    fn update_creates_and_get_snapshots() {
        let store = SessionStore::new("secret");
        assert!(store.get("s1").is_none());
        store.update("s1", |s| s.html_output = Some(PathBuf::from("R1_confirmation.html")));
        let snapshot = store.get("s1").unwrap();
        assert!(snapshot.booking_data.is_none());
        assert_eq!(snapshot.html_output, Some(PathBuf::from("R1_confirmation.html")));
    }

    #[test]
    fn stale_sessions_are_evicted() {
        let store = SessionStore::with_ttl("secret", Duration::ZERO);
        store.update("old", |s| s.html_output = Some(PathBuf::from("R1_confirmation.html")));
        assert!(store.get("old").is_none());

        store.update("new", |_| ());
        assert_eq!(store.len(), 1);
        assert!(store.get("old").is_none());
    }

    #[test]
    fn live_sessions_survive_other_updates() {
        let store = SessionStore::new("secret");
        store.update("a", |_| ());
        store.update("b", |_| ());
        assert_eq!(store.len(), 2);
        assert!(store.get("a").is_some());
    }
}
