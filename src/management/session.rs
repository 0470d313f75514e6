use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    config,
    spotify::SpotifyAuth,
    types::{PkceToken, Token},
    utils, warning,
};

/// Pending logins older than this are dropped.
const PENDING_LOGIN_TTL_SECS: u64 = 600;
/// Tokens are refreshed this long before they actually expire.
const REFRESH_MARGIN_SECS: u64 = 240;

#[derive(Debug)]
struct Session {
    token: Token,
    created_at: u64,
    /// Held while the token is being refreshed; one refresh per session.
    refresh_lock: Arc<Mutex<()>>,
}

#[derive(Debug, Default)]
struct Sessions {
    active: HashMap<String, Session>,
    pending: HashMap<String, PkceToken>,
}

/// In-memory session store keyed by an opaque session id.
///
/// The browser only ever sees the id (in the `sp_session` cookie); the Spotify
/// token stays on the server. Sessions older than `max_age` seconds are
/// evicted, matching the lifetime of the cookie.
#[derive(Debug, Clone)]
pub struct SessionManager {
    inner: Arc<Mutex<Sessions>>,
    max_age: u64,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::with_max_age(config::session_max_age())
    }
}

pub fn is_expired(token: &Token, now: u64) -> bool {
    now + REFRESH_MARGIN_SECS >= token.obtained_at + token.expires_in
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_age(max_age: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Sessions::default())),
            max_age,
        }
    }

    fn is_stale(&self, session: &Session, now: u64) -> bool {
        now >= session.created_at.saturating_add(self.max_age)
    }

    /// Starts a PKCE login and returns `(state, code_verifier)`.
    pub async fn begin_login(&self) -> (String, String) {
        let state = utils::generate_session_id();
        let code_verifier = utils::generate_code_verifier();
        let now = utils::now_timestamp();

        let mut sessions = self.inner.lock().await;
        sessions
            .pending
            .retain(|_, p| now < p.created_at + PENDING_LOGIN_TTL_SECS);
        sessions.pending.insert(
            state.clone(),
            PkceToken {
                code_verifier: code_verifier.clone(),
                created_at: now,
            },
        );

        (state, code_verifier)
    }

    /// Removes the pending login for `state` and returns its code verifier.
    pub async fn take_pending(&self, state: &str) -> Option<String> {
        let now = utils::now_timestamp();
        let mut sessions = self.inner.lock().await;
        sessions
            .pending
            .remove(state)
            .filter(|p| now < p.created_at + PENDING_LOGIN_TTL_SECS)
            .map(|p| p.code_verifier)
    }

    pub async fn create(&self, token: Token) -> String {
        let id = utils::generate_session_id();
        let now = utils::now_timestamp();

        let mut sessions = self.inner.lock().await;
        sessions.active.retain(|_, s| !self.is_stale(s, now));
        sessions.active.insert(
            id.clone(),
            Session {
                token,
                created_at: now,
                refresh_lock: Arc::new(Mutex::new(())),
            },
        );
        id
    }

    pub async fn remove(&self, session_id: &str) -> bool {
        self.inner.lock().await.active.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.active.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn token(&self, session_id: &str) -> Option<Token> {
        self.inner
            .lock()
            .await
            .active
            .get(session_id)
            .map(|s| s.token.clone())
    }

    // Current token and refresh lock of a live session; drops it when stale.
    async fn live(&self, session_id: &str) -> Option<(Token, Arc<Mutex<()>>)> {
        let now = utils::now_timestamp();
        let mut sessions = self.inner.lock().await;
        let session = sessions.active.get(session_id)?;
        if self.is_stale(session, now) {
            sessions.active.remove(session_id);
            return None;
        }
        Some((session.token.clone(), Arc::clone(&session.refresh_lock)))
    }

    /// Returns a usable access token for the session, refreshing it when it
    /// is about to expire.
    ///
    /// Concurrent callers share a single refresh. A session whose refresh
    /// fails is dropped, so the caller sees an unauthenticated request and
    /// the listener has to log in again.
    pub async fn access_token(&self, session_id: &str, auth: &SpotifyAuth) -> Option<String> {
        let (token, refresh_lock) = self.live(session_id).await?;
        if !is_expired(&token, utils::now_timestamp()) {
            return Some(token.access_token);
        }

        let _refreshing = refresh_lock.lock().await;

        // Another request may have refreshed it, or the listener logged out.
        let (token, _) = self.live(session_id).await?;
        if !is_expired(&token, utils::now_timestamp()) {
            return Some(token.access_token);
        }

        if token.refresh_token.is_empty() {
            self.remove(session_id).await;
            return None;
        }

        match auth.refresh(&token.refresh_token).await {
            Ok(fresh) => {
                let mut sessions = self.inner.lock().await;
                let session = sessions.active.get_mut(session_id)?;
                let access_token = fresh.access_token.clone();
                session.token = fresh;
                Some(access_token)
            }
            Err(e) => {
                warning!("Token refresh failed, dropping session: {}", e);
                let mut sessions = self.inner.lock().await;
                let unchanged = sessions
                    .active
                    .get(session_id)
                    .is_some_and(|s| s.token.refresh_token == token.refresh_token);
                if unchanged {
                    sessions.active.remove(session_id);
                }
                None
            }
        }
    }
}
