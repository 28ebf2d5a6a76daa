//! Supabase auth client and session bridge.
//!
//! Authentication is fully delegated to Supabase's GoTrue service; this
//! module owns nothing but a read-only cached copy of the session. The
//! [`AuthClient`] wraps the REST endpoints (`signUp`, `signInWithPassword`,
//! `signOut`) and emits [`AuthEvent`]s on every state change; the
//! [`SessionBridge`] turns those events into a [`watch`] channel the rest
//! of the application can subscribe to.
//!
//! # Bridge contract
//!
//! - on connect, the current session is fetched once
//! - every provider event replaces the entire cached session atomically;
//!   last write wins, fields are never merged
//! - the `loading` flag flips to `false` exactly once, after the initial
//!   fetch or the first event, whichever resolves first
//! - dropping the bridge cancels the listener task, so no subscription
//!   outlives its owner
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hakken::auth::{AuthClient, Credentials, SessionBridge};
//!
//! # async fn example() -> hakken::Result<()> {
//! let client = Arc::new(AuthClient::new(
//!     "https://myproject.supabase.co",
//!     "anon-key",
//! )?);
//!
//! let events = client.on_auth_state_change();
//! let bridge = SessionBridge::connect(client.clone(), events);
//!
//! client
//!     .sign_in_with_password(Credentials::new("user@example.com", "hunter2")?)
//!     .await?;
//!
//! let mut rx = bridge.subscribe();
//! rx.changed().await.ok();
//! println!("signed in: {}", rx.borrow().session.is_some());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::{FutureExt, Stream, StreamExt, pin_mut};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{Error, Result};
use crate::net;

/// Minimum interval between requests to the auth backend.
const SUPABASE_INTERVAL: Duration = Duration::from_millis(250);

/// The authenticated user as the auth backend describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// An auth session: opaque tokens plus the user profile, owned entirely by
/// the auth provider. The application holds read-only copies that are
/// replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: UserProfile,
}

/// Validated sign-in/sign-up credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Validates that both fields are present.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let email = email.into();
        let password = password.into();
        if email.trim().is_empty() || password.is_empty() {
            return Err(Error::auth("Email and password are required."));
        }
        Ok(Self { email, password })
    }

    /// Validates a sign-up form, including the password confirmation field.
    ///
    /// Rejected locally, before any network call:
    ///
    /// ```rust
    /// use hakken::auth::Credentials;
    ///
    /// let err = Credentials::for_sign_up("a@b.c", "secret", "secret2").unwrap_err();
    /// assert!(err.to_string().contains("Passwords do not match"));
    /// ```
    pub fn for_sign_up(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm: &str,
    ) -> Result<Self> {
        let credentials = Self::new(email, password)?;
        if credentials.password != confirm {
            return Err(Error::auth("Passwords do not match"));
        }
        Ok(credentials)
    }
}

/// A change notification from the auth provider.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

impl AuthEvent {
    /// The session this event carries, if any.
    pub fn into_session(self) -> Option<Session> {
        match self {
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => Some(session),
            AuthEvent::SignedOut => None,
        }
    }
}

/// The seam between the session bridge and a concrete auth backend.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The session the provider currently holds, if any.
    async fn current_session(&self) -> Result<Option<Session>>;
}

/// Client for the Supabase GoTrue REST API.
///
/// Holds the project URL and anon key, caches the most recent session, and
/// notifies listeners registered through
/// [`on_auth_state_change`](AuthClient::on_auth_state_change) on every
/// state transition. Requests go through the shared process-wide rate
/// limiter under the `supabase` key.
pub struct AuthClient {
    base_url: Url,
    api_key: String,
    session: Mutex<Option<Session>>,
    listeners: Mutex<Vec<UnboundedSender<AuthEvent>>>,
}

impl AuthClient {
    /// Creates a client for the given Supabase project.
    pub fn new(project_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(project_url)
            .map_err(|e| Error::parse(format!("Invalid project URL: {}", e)))?;
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            session: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
        })
    }

    /// Registers a listener for auth state changes.
    ///
    /// The returned receiver implements `Stream<Item = AuthEvent>` and is
    /// what [`SessionBridge::connect`] expects. Dropping the receiver
    /// unregisters the listener.
    pub fn on_auth_state_change(&self) -> UnboundedReceiver<AuthEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.listeners.lock().push(tx);
        rx
    }

    /// Creates a new account.
    ///
    /// Returns `Ok(None)` when the project requires email confirmation and
    /// no session is issued yet.
    pub async fn sign_up(&self, credentials: Credentials) -> Result<Option<Session>> {
        let url = self.endpoint("/auth/v1/signup")?;
        let body = json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        let response = self.post(url, body, None).await?;

        if response.get("access_token").is_none() {
            return Ok(None);
        }

        let session: Session = serde_json::from_value(response)?;
        self.replace_session(Some(session.clone()));
        self.notify(AuthEvent::SignedIn(session.clone()));
        Ok(Some(session))
    }

    /// Signs in with email and password.
    pub async fn sign_in_with_password(&self, credentials: Credentials) -> Result<Session> {
        let url = self.endpoint("/auth/v1/token?grant_type=password")?;
        let body = json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        let response = self.post(url, body, None).await?;

        let session: Session = serde_json::from_value(response)?;
        self.replace_session(Some(session.clone()));
        self.notify(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Signs out, revoking the current session's token.
    ///
    /// The local session is cleared even when the revocation call fails;
    /// the token will lapse on its own.
    pub async fn sign_out(&self) -> Result<()> {
        let token = self.session.lock().as_ref().map(|s| s.access_token.clone());

        if let Some(token) = token {
            let url = self.endpoint("/auth/v1/logout")?;
            if let Err(e) = self.post(url, Value::Null, Some(&token)).await {
                tracing::warn!("sign-out revocation failed: {}", e);
            }
        }

        self.replace_session(None);
        self.notify(AuthEvent::SignedOut);
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::parse(format!("Invalid endpoint path: {}", e)))
    }

    fn replace_session(&self, session: Option<Session>) {
        *self.session.lock() = session;
    }

    fn notify(&self, event: AuthEvent) {
        self.listeners
            .lock()
            .retain(|listener| listener.unbounded_send(event.clone()).is_ok());
    }

    /// POSTs through the shared limiter, surfacing GoTrue error messages
    /// verbatim so they can be shown inline.
    async fn post(&self, url: Url, body: Value, bearer: Option<&str>) -> Result<Value> {
        net::limiter().wait_for("supabase", SUPABASE_INTERVAL).await;

        let mut request = net::client().post(url).header("apikey", &self.api_key);
        if !body.is_null() {
            request = request.json(&body);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let message = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(|body| {
                ["error_description", "msg", "message", "error"]
                    .iter()
                    .find_map(|key| {
                        body.get(key)
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
            })
            .unwrap_or_else(|| format!("HTTP {}", status));

        Err(Error::auth(message))
    }
}

#[async_trait]
impl AuthProvider for AuthClient {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().clone())
    }
}

/// The session snapshot the bridge publishes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub session: Option<Session>,
    /// `true` until the first resolution (initial fetch or first event)
    pub loading: bool,
}

impl SessionState {
    /// The current user, when signed in.
    pub fn user(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|s| &s.user)
    }
}

/// Bridges an auth provider's event stream into shared application state.
///
/// Spawns a listener task on connect and cancels it on drop; a dangling
/// listener held past its owner's lifetime is a resource leak.
pub struct SessionBridge {
    rx: watch::Receiver<SessionState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SessionBridge {
    /// Connects to a provider: one initial session fetch, then the event
    /// stream.
    ///
    /// If an event arrives before the initial fetch resolves, the event
    /// wins and the (staler) fetch result is discarded, so state only
    /// ever moves forward.
    ///
    /// Must be called within a tokio runtime.
    pub fn connect<P, S>(provider: Arc<P>, events: S) -> Self
    where
        P: AuthProvider + ?Sized + 'static,
        S: Stream<Item = AuthEvent> + Send + 'static,
    {
        let (tx, rx) = watch::channel(SessionState {
            session: None,
            loading: true,
        });
        let cancel = CancellationToken::new();
        let task = tokio::spawn(Self::run(provider, events, tx, cancel.clone()));

        Self { rx, cancel, task }
    }

    /// Subscribes to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.rx.clone()
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    async fn run<P, S>(
        provider: Arc<P>,
        events: S,
        tx: watch::Sender<SessionState>,
        cancel: CancellationToken,
    ) where
        P: AuthProvider + ?Sized + 'static,
        S: Stream<Item = AuthEvent> + Send + 'static,
    {
        let initial = {
            let provider = provider.clone();
            async move { provider.current_session().await }
        }
        .fuse();
        let events = events.fuse();
        pin_mut!(initial, events);

        let mut initial_pending = true;
        let mut events_open = true;

        while initial_pending || events_open {
            tokio::select! {
                _ = cancel.cancelled() => return,
                result = &mut initial, if initial_pending => {
                    initial_pending = false;
                    let session = result.unwrap_or_else(|e| {
                        tracing::warn!("initial session fetch failed: {}", e);
                        None
                    });
                    // Only applied if no event beat it here
                    tx.send_if_modified(|state| {
                        if state.loading {
                            *state = SessionState { session, loading: false };
                            true
                        } else {
                            false
                        }
                    });
                }
                event = events.next(), if events_open => match event {
                    Some(event) => {
                        tx.send_replace(SessionState {
                            session: event.into_session(),
                            loading: false,
                        });
                    }
                    None => events_open = false,
                },
            }
        }
    }
}

impl Drop for SessionBridge {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.task.abort();
    }
}
