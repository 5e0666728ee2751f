//! Session store: the single owner of authentication state.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pages call the store's operations (login, callback, logout, status check,
//! silent refresh); the route guard asks it whether navigation may proceed;
//! the identity client pushes lifecycle notifications into it through the
//! queue drained by [`SessionStore::listen`].
//!
//! DESIGN
//! ======
//! Every operation has the same shape: begin (loading on, error cleared),
//! call the identity client, write the outcome, end (loading off). The "end"
//! half lives in [`LoadingScope`]'s `Drop`, so it also runs when the future
//! unwinds or is dropped mid-flight.
//!
//! ERROR HANDLING
//! ==============
//! `login`, `logout` and `handle_callback` record the failure and hand it back.
//! `check_auth` and `refresh_token` record it and degrade to `false`: the guard
//! relies on `check_auth` never failing.
//!
//! CONCURRENCY
//! ===========
//! Single-threaded. A notification handled between an operation's await and
//! its continuation may be overwritten when the operation resumes; the last
//! write to the session wins.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedReceiver};
use leptos::prelude::*;

use crate::net::identity::{IdentityClient, IdentityError};
use crate::state::auth::{AuthState, LifecycleEvent, RefreshFailure, Session, UserInfo};

pub const LOGIN_FAILED: &str = "Login failed";
pub const CALLBACK_FAILED: &str = "Callback handling failed";
pub const LOGOUT_FAILED: &str = "Logout failed";
pub const AUTH_CHECK_FAILED: &str = "Auth check failed";

/// Clears `loading` when dropped, whichever way the operation exits.
struct LoadingScope {
    state: RwSignal<AuthState>,
}

impl LoadingScope {
    fn begin(state: RwSignal<AuthState>) -> Self {
        state.update(AuthState::begin);
        Self { state }
    }
}

impl Drop for LoadingScope {
    fn drop(&mut self) {
        let _ = self.state.try_update(|s| s.loading = false);
    }
}

/// Handle to the process-wide authentication state.
///
/// Cheap to clone; all clones share the same identity client and signal.
#[derive(Clone)]
pub struct SessionStore {
    client: Arc<dyn IdentityClient>,
    state: RwSignal<AuthState>,
}

impl SessionStore {
    #[must_use]
    pub fn new(client: Arc<dyn IdentityClient>) -> Self {
        Self { client, state: RwSignal::new(AuthState::default()) }
    }

    /// Reactive state for components. Only the store writes to it.
    #[must_use]
    pub fn state(&self) -> RwSignal<AuthState> {
        self.state
    }

    /// Current state, read without subscribing.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.get_untracked()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.with_untracked(AuthState::is_authenticated)
    }

    #[must_use]
    pub fn user_info(&self) -> Option<UserInfo> {
        self.state.with_untracked(AuthState::user_info)
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Start the redirect-based sign-in.
    ///
    /// Success only means the redirect was dispatched; the session arrives
    /// later through [`SessionStore::handle_callback`].
    ///
    /// # Errors
    ///
    /// Returns the identity client's error after recording it.
    pub async fn login(&self) -> Result<(), IdentityError> {
        self.login_to(None).await
    }

    /// Like [`SessionStore::login`], carrying `return_to` through the round
    /// trip so the callback page can resume there.
    ///
    /// # Errors
    ///
    /// Returns the identity client's error after recording it.
    pub async fn login_to(&self, return_to: Option<&str>) -> Result<(), IdentityError> {
        let _scope = LoadingScope::begin(self.state);
        match self.client.signin_redirect(return_to).await {
            Ok(()) => {
                log::debug!("auth: sign-in redirect dispatched");
                Ok(())
            }
            Err(e) => {
                log::warn!("auth: sign-in redirect failed: {e}");
                self.record_error(e.message_or(LOGIN_FAILED));
                Err(e)
            }
        }
    }

    /// Exchange the provider's redirect response for a session. Call once,
    /// from the callback page.
    ///
    /// # Errors
    ///
    /// Returns the identity client's error after recording it; the previous
    /// session is left as it was.
    pub async fn handle_callback(&self) -> Result<Session, IdentityError> {
        let _scope = LoadingScope::begin(self.state);
        match self.client.signin_redirect_callback().await {
            Ok(session) => {
                log::info!("auth: callback accepted for sub={}", session.profile.sub);
                let stored = session.clone();
                self.state.update(|s| s.session = Some(stored));
                Ok(session)
            }
            Err(e) => {
                log::warn!("auth: callback handling failed: {e}");
                self.record_error(e.message_or(CALLBACK_FAILED));
                Err(e)
            }
        }
    }

    /// Start the redirect-based sign-out and forget the session.
    ///
    /// # Errors
    ///
    /// Returns the identity client's error after recording it; the session is
    /// kept.
    pub async fn logout(&self) -> Result<(), IdentityError> {
        let _scope = LoadingScope::begin(self.state);
        match self.client.signout_redirect().await {
            Ok(()) => {
                log::info!("auth: signed out");
                self.state.update(|s| s.session = None);
                Ok(())
            }
            Err(e) => {
                log::warn!("auth: sign-out failed: {e}");
                self.record_error(e.message_or(LOGOUT_FAILED));
                Err(e)
            }
        }
    }

    /// Load whatever session the identity client has cached and report
    /// whether it is live. Never fails: a lookup error reads as signed out.
    pub async fn check_auth(&self) -> bool {
        let _scope = LoadingScope::begin(self.state);
        match self.client.get_user().await {
            Ok(current) => {
                let authenticated = current.as_ref().is_some_and(|s| !s.expired());
                log::debug!("auth: status check authenticated={authenticated}");
                self.state.update(|s| s.session = current);
                authenticated
            }
            Err(e) => {
                log::warn!("auth: status check failed: {e}");
                let message = e.message_or(AUTH_CHECK_FAILED);
                self.state.update(|s| {
                    s.session = None;
                    s.error = Some(message);
                });
                false
            }
        }
    }

    /// Renew the credential silently. Never fails: the failure class decides
    /// whether the session survives, and the error field says why.
    ///
    /// Returns `true` whenever renewal resolves, even without a user; the
    /// session is replaced with whatever came back.
    pub async fn refresh_token(&self) -> bool {
        let _scope = LoadingScope::begin(self.state);
        log::debug!("auth: silently refreshing token");
        match self.client.signin_silent().await {
            Ok(renewed) => {
                if renewed.is_some() {
                    log::info!("auth: token refreshed");
                } else {
                    log::warn!("auth: silent renewal resolved without a user");
                }
                self.state.update(|s| s.session = renewed);
                true
            }
            Err(e) => {
                let failure = RefreshFailure::classify(&e.to_string());
                log::warn!("auth: token refresh failed ({failure:?}): {e}");
                self.state.update(|s| s.apply_refresh_failure(&failure));
                false
            }
        }
    }

    // =========================================================================
    // LIFECYCLE NOTIFICATIONS
    // =========================================================================

    /// Apply one lifecycle notification. Runs to completion before the event
    /// loop takes the next one.
    pub async fn handle_event(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::UserSessionChanged => {
                log::info!("auth: user session change detected");
                match self.client.get_user().await {
                    Ok(current) => {
                        let cleared = self
                            .state
                            .try_update(|s| s.settle_session_probe(current.as_ref()))
                            .unwrap_or(false);
                        if cleared {
                            log::info!("auth: session expired or was closed by the provider");
                        } else {
                            log::debug!("auth: session still active");
                        }
                    }
                    Err(e) => log::warn!("auth: session re-check failed: {e}"),
                }
            }
            LifecycleEvent::SilentRenewError(message) => {
                log::warn!("auth: silent renewal error: {message}");
                self.state.update(|s| s.apply(LifecycleEvent::SilentRenewError(message)));
            }
            other => {
                log::info!("auth: identity event {}", other.name());
                self.state.update(|s| s.apply(other));
            }
        }
    }

    /// Subscribe to the identity client and return the event loop.
    ///
    /// The returned future drains notifications strictly one at a time and
    /// resolves once the client drops its sender. Spawn it once per page.
    pub fn listen(&self) -> impl Future<Output = ()> + 'static {
        let (tx, rx) = mpsc::unbounded();
        self.client.subscribe(tx);
        let store = self.clone();
        async move { store.drain(rx).await }
    }

    async fn drain(&self, mut rx: UnboundedReceiver<LifecycleEvent>) {
        while let Some(event) = rx.next().await {
            self.handle_event(event).await;
        }
        log::debug!("auth: identity event stream closed");
    }

    fn record_error(&self, message: String) {
        self.state.update(|s| s.error = Some(message));
    }
}
