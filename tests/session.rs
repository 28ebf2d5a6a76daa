//! Session bridge semantics, exercised with a fake auth provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use tokio::time::timeout;

use hakken::auth::{
    AuthEvent, AuthProvider, Session, SessionBridge, SessionState, UserProfile,
};
use hakken::error::Result;

fn session(token: &str) -> Session {
    Session {
        access_token: token.to_string(),
        refresh_token: None,
        token_type: Some("bearer".to_string()),
        expires_in: Some(3600),
        user: UserProfile {
            id: format!("user-{}", token),
            email: Some("user@example.com".to_string()),
            created_at: None,
        },
    }
}

/// Fake provider with a configurable initial session and fetch latency.
struct FakeProvider {
    initial: Option<Session>,
    latency: Duration,
}

#[async_trait]
impl AuthProvider for FakeProvider {
    async fn current_session(&self) -> Result<Option<Session>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.initial.clone())
    }
}

/// Waits until the bridge state satisfies `predicate`, or panics after the
/// timeout.
async fn wait_for<F>(bridge: &SessionBridge, predicate: F) -> SessionState
where
    F: Fn(&SessionState) -> bool,
{
    let mut rx = bridge.subscribe();
    timeout(Duration::from_secs(2), async {
        loop {
            {
                let state = rx.borrow_and_update();
                if predicate(&state) {
                    return state.clone();
                }
            }
            rx.changed().await.expect("bridge task ended unexpectedly");
        }
    })
    .await
    .expect("bridge never reached the expected state")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_fetch_flips_loading_once() {
        let provider = Arc::new(FakeProvider {
            initial: Some(session("initial")),
            latency: Duration::ZERO,
        });
        let (_tx, events) = mpsc::unbounded::<AuthEvent>();
        let bridge = SessionBridge::connect(provider, events);

        let state = wait_for(&bridge, |s| !s.loading).await;
        assert_eq!(
            state.session.as_ref().map(|s| s.access_token.as_str()),
            Some("initial")
        );
        assert_eq!(state.user().map(|u| u.id.as_str()), Some("user-initial"));
    }

    #[tokio::test]
    async fn test_signed_out_initial_state() {
        let provider = Arc::new(FakeProvider {
            initial: None,
            latency: Duration::ZERO,
        });
        let (_tx, events) = mpsc::unbounded::<AuthEvent>();
        let bridge = SessionBridge::connect(provider, events);

        let state = wait_for(&bridge, |s| !s.loading).await;
        assert!(state.session.is_none());
        assert!(state.user().is_none());
    }

    #[tokio::test]
    async fn test_rapid_events_end_in_last_state() {
        let provider = Arc::new(FakeProvider {
            initial: None,
            latency: Duration::ZERO,
        });
        let (tx, events) = mpsc::unbounded();
        let bridge = SessionBridge::connect(provider, events);

        // Session A then session B in quick succession: last write wins,
        // no interleaving of A and B fields.
        tx.unbounded_send(AuthEvent::SignedIn(session("aaa"))).unwrap();
        tx.unbounded_send(AuthEvent::SignedIn(session("bbb"))).unwrap();

        let state = wait_for(&bridge, |s| {
            s.session.as_ref().is_some_and(|s| s.access_token == "bbb")
        })
        .await;
        assert!(!state.loading);
        assert_eq!(state.user().map(|u| u.id.as_str()), Some("user-bbb"));
    }

    #[tokio::test]
    async fn test_sign_out_event_replaces_session_wholesale() {
        let provider = Arc::new(FakeProvider {
            initial: Some(session("old")),
            latency: Duration::ZERO,
        });
        let (tx, events) = mpsc::unbounded();
        let bridge = SessionBridge::connect(provider, events);

        wait_for(&bridge, |s| !s.loading).await;

        tx.unbounded_send(AuthEvent::SignedOut).unwrap();
        let state = wait_for(&bridge, |s| s.session.is_none()).await;
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_event_beats_slow_initial_fetch() {
        let provider = Arc::new(FakeProvider {
            initial: Some(session("stale")),
            latency: Duration::from_millis(200),
        });
        let (tx, events) = mpsc::unbounded();
        let bridge = SessionBridge::connect(provider, events);

        tx.unbounded_send(AuthEvent::SignedIn(session("fresh"))).unwrap();

        let state = wait_for(&bridge, |s| !s.loading).await;
        assert_eq!(
            state.session.as_ref().map(|s| s.access_token.as_str()),
            Some("fresh")
        );

        // The stale initial fetch resolves later and must not clobber the
        // newer event.
        tokio::time::sleep(Duration::from_millis(300)).await;
        let state = bridge.state();
        assert_eq!(
            state.session.as_ref().map(|s| s.access_token.as_str()),
            Some("fresh")
        );
    }

    #[tokio::test]
    async fn test_auth_client_as_provider() {
        use hakken::auth::AuthClient;

        assert!(AuthClient::new("not a url", "anon").is_err());

        let client = Arc::new(AuthClient::new("https://example.supabase.co", "anon").unwrap());
        assert!(client.current_session().await.unwrap().is_none());

        // Signing out with no session touches no network and still
        // notifies subscribers.
        let events = client.on_auth_state_change();
        let bridge = SessionBridge::connect(client.clone(), events);
        client.sign_out().await.unwrap();

        let state = wait_for(&bridge, |s| !s.loading).await;
        assert!(state.session.is_none());
    }

    #[tokio::test]
    async fn test_drop_releases_the_event_subscription() {
        let provider = Arc::new(FakeProvider {
            initial: None,
            latency: Duration::ZERO,
        });
        let (tx, events) = mpsc::unbounded();
        let bridge = SessionBridge::connect(provider, events);

        wait_for(&bridge, |s| !s.loading).await;
        drop(bridge);

        // The listener task is cancelled, so the provider-side sender
        // eventually observes a closed channel instead of leaking.
        timeout(Duration::from_secs(2), async {
            loop {
                if tx.unbounded_send(AuthEvent::SignedOut).is_err() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("subscription still alive after bridge drop");
    }
}
