//! Session lifecycle manager.
//!
//! `SessionManager` is the single owner of the in-memory access token, the
//! auto-refresh timer, and the refresh single-flight gate. It attaches the
//! right credentials (bearer token + CSRF header) to every request made
//! through [`SessionManager::fetch`], renews the token silently before
//! expiry, and recovers exactly once from a 401 (token refresh) or a 403 on
//! a mutating call (CSRF rotation) before surfacing the failure.
//!
//! Clone is cheap - the manager wraps an `Arc`, so UI components and
//! background tasks share one set of session state.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::cookie::Jar;
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{Config, SessionConfig};
use crate::error::AuthError;

use super::csrf::{CookieCsrfProvider, CsrfProvider};
use super::idle::IdleTracker;
use super::store::UserStore;
use super::token::{AccessToken, MemoryTokenCache, TokenCache};
use super::{CachedUser, CredentialStore};

const LOGIN_PATH: &str = "/users/login";
const FIRST_PASSWORD_PATH: &str = "/users/first-password";
const REFRESH_PATH: &str = "/users/refresh";
const LOGOUT_PATH: &str = "/users/logout";
const LOGOUT_ALL_PATH: &str = "/users/logoutAll";
const CSRF_PATH: &str = "/users/csrf";

/// Login status marker the server sends instead of a session when the
/// account still has its initial password.
const PASSWORD_CHANGE_REQUIRED: &str = "password_change_required";

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    data: Option<AuthData>,
}

#[derive(Debug, Deserialize)]
struct AuthData {
    user: CachedUser,
}

/// Result of a login attempt that reached the server.
#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(CachedUser),
    /// The server issued a single-use setup token instead of a session;
    /// complete with [`SessionManager::complete_first_login`].
    PasswordChangeRequired,
}

/// Invoked (after the configured delay) when the session is lost and the
/// application should return to its login entry point.
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

enum RefreshRole {
    Leader(Arc<Notify>),
    Follower(Arc<Notify>),
}

struct Inner {
    config: SessionConfig,
    http: Client,
    token: RwLock<Option<AccessToken>>,
    user: RwLock<Option<CachedUser>>,
    /// Single-use first-login setup token. Taken on use, success or not.
    setup_token: Mutex<Option<String>>,
    token_cache: Arc<dyn TokenCache>,
    user_store: UserStore,
    csrf: Arc<dyn CsrfProvider>,
    /// Refresh single-flight gate. `Some` while a refresh is in flight;
    /// followers wait on the shared `Notify` instead of issuing their own.
    refresh_gate: Mutex<Option<Arc<Notify>>>,
    /// Bumped on every teardown. A refresh that started under an older
    /// generation must discard its result instead of resurrecting the
    /// session it outlived.
    generation: AtomicU64,
    /// At most one scheduled auto-refresh; scheduling aborts the prior one.
    refresh_timer: StdMutex<Option<JoinHandle<()>>>,
    idle_task: StdMutex<Option<JoinHandle<()>>>,
    idle: IdleTracker,
    expired_hook: StdMutex<Option<SessionExpiredHook>>,
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

pub struct SessionManagerBuilder {
    config: SessionConfig,
    token_cache: Option<Arc<dyn TokenCache>>,
    user_store: Option<UserStore>,
    csrf: Option<Arc<dyn CsrfProvider>>,
}

impl SessionManagerBuilder {
    /// Override the session-scoped token cache (default is in-memory).
    pub fn token_cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
        self.token_cache = Some(cache);
        self
    }

    /// Override the durable user snapshot store.
    pub fn user_store(mut self, store: UserStore) -> Self {
        self.user_store = Some(store);
        self
    }

    /// Override how the CSRF double-submit token is read.
    pub fn csrf_provider(mut self, provider: Arc<dyn CsrfProvider>) -> Self {
        self.csrf = Some(provider);
        self
    }

    pub fn build(self) -> Result<SessionManager, AuthError> {
        let base_url: Url = self
            .config
            .base_url
            .parse()
            .map_err(|err| AuthError::InvalidResponse(format!("Invalid base URL: {}", err)))?;

        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(self.config.request_timeout)
            .build()?;

        let csrf = self.csrf.unwrap_or_else(|| {
            Arc::new(CookieCsrfProvider::new(
                jar,
                base_url,
                self.config.csrf_cookie.clone(),
            ))
        });
        let user_store = self.user_store.unwrap_or_else(|| {
            UserStore::new(Config::cache_dir().unwrap_or_else(|_| PathBuf::from("./cache")))
        });
        let token_cache = self
            .token_cache
            .unwrap_or_else(|| Arc::new(MemoryTokenCache::new()));

        Ok(SessionManager {
            inner: Arc::new(Inner {
                config: self.config,
                http,
                token: RwLock::new(None),
                user: RwLock::new(None),
                setup_token: Mutex::new(None),
                token_cache,
                user_store,
                csrf,
                refresh_gate: Mutex::new(None),
                generation: AtomicU64::new(0),
                refresh_timer: StdMutex::new(None),
                idle_task: StdMutex::new(None),
                idle: IdleTracker::new(),
                expired_hook: StdMutex::new(None),
            }),
        })
    }
}

impl SessionManager {
    pub fn builder(config: SessionConfig) -> SessionManagerBuilder {
        SessionManagerBuilder {
            config,
            token_cache: None,
            user_store: None,
            csrf: None,
        }
    }

    pub fn new(config: SessionConfig) -> Result<Self, AuthError> {
        Self::builder(config).build()
    }

    // ===== State accessors =====

    pub async fn token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .await
            .as_ref()
            .map(|t| t.value.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    pub async fn current_user(&self) -> Option<CachedUser> {
        self.inner.user.read().await.clone()
    }

    /// Forward a user-activity event; pushes the idle-logout deadline out.
    pub fn record_activity(&self) {
        self.inner.idle.touch();
    }

    /// Register the hook fired after the session is lost (refresh failure,
    /// idle timeout). Fires once per loss, after `expiry_redirect_delay`.
    pub fn on_session_expired(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self
            .inner
            .expired_hook
            .lock()
            .expect("expired hook lock poisoned") = Some(Arc::new(hook));
    }

    // ===== Login =====

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let url = self.inner.config.endpoint(LOGIN_PATH);
        let response = self
            .inner
            .http
            .post(&url)
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(login_rejection(status, &body));
        }

        let auth: AuthResponse = response.json().await.map_err(|err| {
            AuthError::InvalidResponse(format!("Failed to parse login response: {}", err))
        })?;

        if auth.status.as_deref() == Some(PASSWORD_CHANGE_REQUIRED) {
            let setup = auth.token.ok_or_else(|| {
                AuthError::InvalidResponse(
                    "password change required without a setup token".to_string(),
                )
            })?;
            *self.inner.setup_token.lock().await = Some(setup);
            info!(username, "Password change required before first login");
            return Ok(LoginOutcome::PasswordChangeRequired);
        }

        let token = auth.token.ok_or_else(|| {
            AuthError::InvalidResponse("login response missing token".to_string())
        })?;
        let user = auth.data.map(|d| d.user).ok_or_else(|| {
            AuthError::InvalidResponse("login response missing user".to_string())
        })?;

        self.establish_session(token, Some(user.clone())).await;
        info!(username = %user.username, role = %user.role, "Login successful");
        Ok(LoginOutcome::Authenticated(user))
    }

    /// Login and, on success, persist the credentials for
    /// [`login_remembered`](Self::login_remembered).
    pub async fn login_and_remember(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let outcome = self.login(username, password).await?;
        if matches!(outcome, LoginOutcome::Authenticated(_)) {
            if let Err(err) = CredentialStore::remember(username, password) {
                warn!(error = %err, "Failed to remember credentials");
            }
        }
        Ok(outcome)
    }

    /// Login with credentials previously stored via
    /// [`login_and_remember`](Self::login_and_remember).
    pub async fn login_remembered(&self) -> Result<LoginOutcome, AuthError> {
        match CredentialStore::remembered() {
            Some((username, password)) => self.login(&username, &password).await,
            None => Err(AuthError::Rejected("No remembered credentials".to_string())),
        }
    }

    /// Exchange the setup token from a `PasswordChangeRequired` login for a
    /// full session. The setup token is single-use: it is consumed here
    /// whether or not the exchange succeeds.
    pub async fn complete_first_login(
        &self,
        new_password: &str,
    ) -> Result<CachedUser, AuthError> {
        let setup = self
            .inner
            .setup_token
            .lock()
            .await
            .take()
            .ok_or(AuthError::NoSetupToken)?;

        let url = self.inner.config.endpoint(FIRST_PASSWORD_PATH);
        let response = self
            .inner
            .http
            .post(&url)
            .bearer_auth(&setup)
            .json(&serde_json::json!({ "password": new_password }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(login_rejection(status, &body));
        }

        let auth: AuthResponse = response.json().await.map_err(|err| {
            AuthError::InvalidResponse(format!("Failed to parse first-login response: {}", err))
        })?;
        let token = auth.token.ok_or_else(|| {
            AuthError::InvalidResponse("first-login response missing token".to_string())
        })?;
        let user = auth.data.map(|d| d.user).ok_or_else(|| {
            AuthError::InvalidResponse("first-login response missing user".to_string())
        })?;

        self.establish_session(token, Some(user.clone())).await;
        info!(username = %user.username, "First-login password setup complete");
        Ok(user)
    }

    // ===== Authenticated fetch =====

    /// Authenticated request without a body.
    pub async fn fetch(&self, method: Method, path: &str) -> Result<Response, AuthError> {
        self.fetch_inner(method, path, None).await
    }

    /// Authenticated request with a JSON body.
    pub async fn fetch_json<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Response, AuthError> {
        let body = serde_json::to_value(body).map_err(|err| {
            AuthError::InvalidResponse(format!("Failed to serialize request body: {}", err))
        })?;
        self.fetch_inner(method, path, Some(body)).await
    }

    async fn fetch_inner(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response, AuthError> {
        let url = self.inner.config.endpoint(path);
        let mutating = matches!(
            method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        );

        // Double-submit header. A missing cookie is recovered by one refresh
        // cycle, whose response sets a fresh CSRF cookie alongside the token.
        let mut csrf = if mutating { self.inner.csrf.current() } else { None };
        if mutating && csrf.is_none() {
            debug!(path, "No CSRF cookie, refreshing before mutating request");
            self.refresh_or_wait().await;
            csrf = self.inner.csrf.current();
        }

        let mut response = self
            .send_once(&method, &url, body.as_ref(), csrf.as_deref())
            .await?;

        // Likely stale CSRF: rotate once and retry, never more.
        if mutating && response.status() == StatusCode::FORBIDDEN {
            warn!(path, "403 on mutating request, rotating CSRF token");
            if self.rotate_csrf().await {
                let csrf = self.inner.csrf.current();
                response = self
                    .send_once(&method, &url, body.as_ref(), csrf.as_deref())
                    .await?;
            }
        }

        // Expired token: at most one transparent refresh-and-retry.
        if response.status() == StatusCode::UNAUTHORIZED && !is_auth_path(path) {
            if !self.has_session_hint().await {
                // Nothing to refresh against; treat as logged out.
                self.clear_auth_data().await;
                return Ok(response);
            }
            if self.refresh_or_wait().await {
                let csrf = if mutating { self.inner.csrf.current() } else { None };
                let retried = self
                    .send_once(&method, &url, body.as_ref(), csrf.as_deref())
                    .await?;
                if retried.status() == StatusCode::UNAUTHORIZED {
                    warn!(path, "Request still unauthorized after refresh");
                    self.expire_session().await;
                }
                return Ok(retried);
            }
            self.expire_session().await;
        }

        Ok(response)
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&serde_json::Value>,
        csrf: Option<&str>,
    ) -> Result<Response, AuthError> {
        let mut request = self.inner.http.request(method.clone(), url);
        if let Some(token) = self.token().await {
            request = request.bearer_auth(token);
        }
        if let Some(csrf) = csrf {
            request = request.header(&self.inner.config.csrf_header, csrf);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(transport_error)
    }

    // ===== Refresh =====

    /// Refresh the access token using the ambient refresh cookie.
    ///
    /// Non-reentrant: returns `false` immediately if a refresh is already in
    /// flight. On failure the existing state is left untouched - the caller
    /// decides whether the session is over.
    pub async fn refresh(&self) -> bool {
        match self.claim_refresh_gate().await {
            RefreshRole::Leader(notify) => self.lead_refresh(notify).await,
            RefreshRole::Follower(_) => {
                debug!("Refresh already in flight");
                false
            }
        }
    }

    /// Single-flight entry point: lead a refresh, or wait (bounded) for the
    /// one already in flight and report whether a live token came out of it.
    async fn refresh_or_wait(&self) -> bool {
        match self.claim_refresh_gate().await {
            RefreshRole::Leader(notify) => self.lead_refresh(notify).await,
            RefreshRole::Follower(notify) => {
                let waited =
                    tokio::time::timeout(self.inner.config.refresh_wait_cap, notify.notified())
                        .await;
                if waited.is_err() {
                    warn!("Timed out waiting for in-flight refresh");
                }
                self.has_live_token().await
            }
        }
    }

    /// Leader/follower election happens entirely under the gate lock so two
    /// concurrent callers can never both believe a refresh is theirs to run.
    async fn claim_refresh_gate(&self) -> RefreshRole {
        let mut gate = self.inner.refresh_gate.lock().await;
        match gate.as_ref() {
            Some(notify) => RefreshRole::Follower(notify.clone()),
            None => {
                let notify = Arc::new(Notify::new());
                *gate = Some(notify.clone());
                RefreshRole::Leader(notify)
            }
        }
    }

    async fn lead_refresh(&self, notify: Arc<Notify>) -> bool {
        let ok = self.do_refresh().await;
        *self.inner.refresh_gate.lock().await = None;
        notify.notify_waiters();
        ok
    }

    async fn do_refresh(&self) -> bool {
        let generation = self.inner.generation.load(Ordering::SeqCst);
        let url = self.inner.config.endpoint(REFRESH_PATH);
        let response = match self
            .inner
            .http
            .post(&url)
            .timeout(self.inner.config.refresh_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                warn!("Token refresh timed out");
                return false;
            }
            Err(err) => {
                warn!(error = %err, "Token refresh network error");
                return false;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "Token refresh rejected");
            return false;
        }

        let auth: AuthResponse = match response.json().await {
            Ok(auth) => auth,
            Err(err) => {
                warn!(error = %err, "Failed to parse refresh response");
                return false;
            }
        };
        let Some(token) = auth.token else {
            warn!("Refresh response missing token");
            return false;
        };

        // The session may have been torn down (logout, idle) while this
        // request was in flight; a stale result must not resurrect it.
        if self.inner.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding refresh that outlived its session");
            return false;
        }

        self.establish_session(token, auth.data.map(|d| d.user)).await;
        debug!("Access token refreshed");
        true
    }

    async fn has_live_token(&self) -> bool {
        matches!(
            self.inner.token.read().await.as_ref(),
            Some(token) if !token.is_expired()
        )
    }

    async fn has_session_hint(&self) -> bool {
        self.inner.token.read().await.is_some() || self.inner.user.read().await.is_some()
    }

    async fn rotate_csrf(&self) -> bool {
        let url = self.inner.config.endpoint(CSRF_PATH);
        match self.inner.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(status = %response.status(), "CSRF rotation rejected");
                false
            }
            Err(err) => {
                warn!(error = %err, "CSRF rotation failed");
                false
            }
        }
    }

    // ===== Session state =====

    async fn establish_session(&self, token: String, user: Option<CachedUser>) {
        let access = AccessToken::new(token);
        self.inner.token_cache.store(&access.value);
        let expires_at = access.expires_at;
        *self.inner.token.write().await = Some(access);

        if let Some(user) = user {
            if let Err(err) = self.inner.user_store.save(&user) {
                warn!(error = %err, "Failed to persist user snapshot");
            }
            *self.inner.user.write().await = Some(user);
        }

        if let Some(expiry) = expires_at {
            self.schedule_refresh(expiry);
        }
        self.inner.idle.touch();
        self.start_idle_watch();
    }

    /// Re-hydrate a session after the embedding shell reloads: cached user
    /// from durable storage, token from the session-scoped cache. Returns
    /// whether a live session came back.
    pub async fn restore(&self) -> bool {
        match self.inner.user_store.load() {
            Ok(Some(user)) => *self.inner.user.write().await = Some(user),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "Failed to load cached user snapshot"),
        }

        let Some(raw) = self.inner.token_cache.load() else {
            return false;
        };
        let access = AccessToken::new(raw);
        if access.is_expired() {
            debug!("Cached token already expired, discarding");
            self.inner.token_cache.clear();
            return false;
        }

        let expires_at = access.expires_at;
        *self.inner.token.write().await = Some(access);
        if let Some(expiry) = expires_at {
            self.schedule_refresh(expiry);
        }
        self.inner.idle.touch();
        self.start_idle_watch();
        debug!("Session restored from cache");
        true
    }

    pub async fn logout(&self) {
        self.notify_logout(LOGOUT_PATH).await;
        self.clear_auth_data().await;
        info!("Logged out");
    }

    /// Logout and ask the server to invalidate every session for this user,
    /// not just this one.
    pub async fn logout_all(&self) {
        self.notify_logout(LOGOUT_ALL_PATH).await;
        self.clear_auth_data().await;
        info!("Logged out everywhere");
    }

    async fn notify_logout(&self, path: &str) {
        let url = self.inner.config.endpoint(path);
        let mut request = self.inner.http.post(&url);
        if let Some(token) = self.token().await {
            request = request.bearer_auth(token);
        }
        if let Some(csrf) = self.inner.csrf.current() {
            request = request.header(&self.inner.config.csrf_header, csrf);
        }
        // Best effort only: the local session goes away regardless.
        if let Err(err) = request.send().await {
            debug!(error = %err, "Logout notification failed");
        }
    }

    /// Wipe every piece of session state: timers, in-memory token,
    /// session-scoped cache, durable user snapshot. Idempotent.
    ///
    /// An in-flight refresh keeps its gate - the leader clears it on the way
    /// out, and the generation bump makes it drop its result. Taking the
    /// gate away mid-flight would let a second leader start a concurrent
    /// network refresh.
    pub async fn clear_auth_data(&self) {
        self.cancel_timers();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        *self.inner.token.write().await = None;
        *self.inner.user.write().await = None;
        *self.inner.setup_token.lock().await = None;
        self.inner.token_cache.clear();
        if let Err(err) = self.inner.user_store.clear() {
            warn!(error = %err, "Failed to clear user snapshot");
        }
        debug!("Session state cleared");
    }

    /// Session is over: clear everything and fire the expiry hook after the
    /// configured delay.
    async fn expire_session(&self) {
        self.clear_auth_data().await;
        let hook = self
            .inner
            .expired_hook
            .lock()
            .expect("expired hook lock poisoned")
            .clone();
        if let Some(hook) = hook {
            let delay = self.inner.config.expiry_redirect_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                hook();
            });
        }
    }

    fn cancel_timers(&self) {
        if let Some(handle) = self
            .inner
            .refresh_timer
            .lock()
            .expect("refresh timer lock poisoned")
            .take()
        {
            handle.abort();
        }
        if let Some(handle) = self
            .inner
            .idle_task
            .lock()
            .expect("idle task lock poisoned")
            .take()
        {
            handle.abort();
        }
    }

    // ===== Timers =====

    fn schedule_refresh(&self, expires_at: DateTime<Utc>) {
        let delay = refresh_delay(
            expires_at,
            Utc::now(),
            self.inner.config.refresh_margin,
            self.inner.config.refresh_floor,
        );
        debug!(delay_secs = delay.as_secs(), "Auto-refresh scheduled");

        let manager = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Drop our own handle before refreshing, so the reschedule that
            // follows a successful refresh doesn't abort this task mid-run.
            manager
                .inner
                .refresh_timer
                .lock()
                .expect("refresh timer lock poisoned")
                .take();
            debug!("Auto-refresh timer fired");
            // Follower path: a concurrent 401-triggered or manual refresh
            // counts, as long as a live token comes out of it. Skip the
            // teardown when the session is already gone.
            if !manager.refresh_or_wait().await && manager.has_session_hint().await {
                warn!("Scheduled refresh failed, ending session");
                manager.expire_session().await;
            }
        });

        let mut slot = self
            .inner
            .refresh_timer
            .lock()
            .expect("refresh timer lock poisoned");
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    fn start_idle_watch(&self) {
        let Some(window) = self.inner.config.idle_timeout else {
            return;
        };

        let manager = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                match manager.inner.idle.remaining(window) {
                    Some(remaining) => tokio::time::sleep(remaining).await,
                    None => break,
                }
            }
            manager
                .inner
                .idle_task
                .lock()
                .expect("idle task lock poisoned")
                .take();
            info!("Idle timeout reached, ending session");
            manager.expire_session().await;
        });

        let mut slot = self
            .inner
            .idle_task
            .lock()
            .expect("idle task lock poisoned");
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }
}

fn is_auth_path(path: &str) -> bool {
    path == LOGIN_PATH || path == REFRESH_PATH || path == FIRST_PASSWORD_PATH
}

/// Credential rejection keeps the server's message verbatim for the UI;
/// only 5xx responses are reported as server faults.
fn login_rejection(status: StatusCode, body: &str) -> AuthError {
    if status.is_server_error() {
        AuthError::from_status(status, body)
    } else {
        AuthError::Rejected(AuthError::server_message(body))
    }
}

fn transport_error(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        AuthError::Timeout
    } else {
        AuthError::Network(err)
    }
}

/// Delay until the auto-refresh should fire: `margin` before the expiry
/// claim, but never sooner than `floor` from now.
fn refresh_delay(
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
    margin: Duration,
    floor: Duration,
) -> Duration {
    let until_expiry = (expires_at - now).to_std().unwrap_or(Duration::ZERO);
    until_expiry.saturating_sub(margin).max(floor)
}
