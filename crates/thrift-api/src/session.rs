use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use crate::auth::AppState;
use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "thrift_session";

/// Identity of the authenticated caller, inserted by [`require_session`].
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub email: String,
}

struct Session {
    email: String,
    expires_at: DateTime<Utc>,
}

/// Server-side session store: opaque random token → identity, with TTL
/// expiry. Expired entries are pruned on lookup.
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn create(&self, email: &str) -> Result<String> {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        self.lock()?.insert(
            token.clone(),
            Session {
                email: email.to_string(),
                expires_at: Utc::now() + self.ttl,
            },
        );
        Ok(token)
    }

    /// Resolve a token to its email. An expired entry is removed and
    /// reported as absent.
    pub fn resolve(&self, token: &str) -> Result<Option<String>> {
        let mut sessions = self.lock()?;
        match sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => Ok(Some(session.email.clone())),
            Some(_) => {
                sessions.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn remove(&self, token: &str) -> Result<()> {
        self.lock()?.remove(token);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {}", e))
    }
}

/// Reject requests without a live session and hand the resolved identity
/// to the handlers downstream.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Err(ApiError::Unauthorized("User not logged in"));
    };

    let email = state
        .sessions
        .resolve(cookie.value())
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::Unauthorized("User not logged in"))?;

    req.extensions_mut().insert(SessionUser { email });
    Ok(next.run(req).await)
}
