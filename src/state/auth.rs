//! Auth-session state for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Owned by [`SessionStore`](super::store::SessionStore) and read by the route
//! guard and user-aware pages. Every transition here is a plain function of the
//! previous state and one input, so the store only decides *when* to apply them.
//!
//! DESIGN
//! ======
//! `is_authenticated` is a method, not a field: the session's expiry is
//! evaluated against the clock on every read.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use serde::{Deserialize, Serialize};

use crate::util::clock;

/// Error text recorded when the identity client reports a background
/// silent-renewal failure.
pub const SILENT_RENEW_ERROR: &str = "Token renewal failed";

/// Error text recorded when silent renewal says the user must sign in again.
pub const REAUTH_REQUIRED_ERROR: &str = "Session expired. Re-login required.";

/// Error text recorded when silent renewal finds no provider session at all.
pub const NO_SESSION_ERROR: &str = "No active authentication session.";

const REAUTH_REQUIRED_MARKER: &str = "requires End-User authentication";
const NO_STATE_MARKER: &str = "No state in response";

// =============================================================================
// SESSION
// =============================================================================

/// Identity claims of the signed-in principal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Stable subject identifier issued by the provider.
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Opaque credential payload. Only the identity client interprets it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub session_state: Option<String>,
}

/// One authenticated principal and its credential validity window.
///
/// Sessions are replaced wholesale on every load, refresh, or callback; the
/// store never edits one in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub profile: Profile,
    /// Expiry in seconds since the Unix epoch. `None` means no expiry was
    /// reported and the session never counts as expired.
    pub expires_at: Option<u64>,
    pub credential: Credential,
    /// Route to resume after the sign-in round trip, if the login started
    /// with one.
    #[serde(default)]
    pub return_to: Option<String>,
}

impl Session {
    /// Whether the credential had expired at `now` (seconds since the epoch).
    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Whether the credential has expired as of this call.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.is_expired_at(clock::now_secs())
    }

    /// Project the identity claims shown in the UI.
    #[must_use]
    pub fn user_info(&self) -> UserInfo {
        UserInfo {
            id: self.profile.sub.clone(),
            name: self.profile.name.clone(),
            email: self.profile.email.clone(),
        }
    }
}

/// Display-facing subset of the session's claims.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserInfo {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// LIFECYCLE NOTIFICATIONS
// =============================================================================

/// Asynchronous notification emitted by the identity client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A session was loaded or renewed.
    UserLoaded(Session),
    /// The cached session was removed.
    UserUnloaded,
    /// Background silent renewal failed with the given message.
    SilentRenewError(String),
    /// The provider reported the user signed out elsewhere.
    UserSignedOut,
    /// The access token passed its expiry.
    AccessTokenExpired,
    /// The provider's session state changed; needs a re-query to interpret.
    UserSessionChanged,
}

impl LifecycleEvent {
    /// Short tag used in log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserLoaded(_) => "user_loaded",
            Self::UserUnloaded => "user_unloaded",
            Self::SilentRenewError(_) => "silent_renew_error",
            Self::UserSignedOut => "user_signed_out",
            Self::AccessTokenExpired => "access_token_expired",
            Self::UserSessionChanged => "user_session_changed",
        }
    }
}

// =============================================================================
// REFRESH FAILURE CLASSIFICATION
// =============================================================================

/// Bucket a silent-renewal failure falls into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshFailure {
    /// The provider needs the user to sign in interactively.
    ReauthRequired,
    /// There is no provider session to renew.
    NoSession,
    /// Anything else; possibly temporary.
    Transient(String),
}

impl RefreshFailure {
    /// Classify by the failure's message text.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        if message.contains(REAUTH_REQUIRED_MARKER) {
            Self::ReauthRequired
        } else if message.contains(NO_STATE_MARKER) {
            Self::NoSession
        } else {
            Self::Transient(message.to_owned())
        }
    }

    /// Whether the prior session must be dropped.
    #[must_use]
    pub fn clears_session(&self) -> bool {
        !matches!(self, Self::Transient(_))
    }

    /// User-facing error text recorded in [`AuthState::error`].
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ReauthRequired => REAUTH_REQUIRED_ERROR.to_owned(),
            Self::NoSession => NO_SESSION_ERROR.to_owned(),
            Self::Transient(message) => format!("Token refresh failed: {message}"),
        }
    }
}

// =============================================================================
// AUTH STATE
// =============================================================================

/// Authentication state tracking the current session, loading and last error.
///
/// Provided to components through a `RwSignal` held by the session store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub session: Option<Session>,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    /// True iff a session is present and not expired.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.expired())
    }

    #[must_use]
    pub fn user_info(&self) -> Option<UserInfo> {
        self.session.as_ref().map(Session::user_info)
    }

    /// Enter an operation: mark loading and forget the previous error.
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Apply a lifecycle notification.
    ///
    /// `UserSessionChanged` is a no-op here: its outcome depends on a fresh
    /// query, settled through [`AuthState::settle_session_probe`].
    pub fn apply(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::UserLoaded(session) => self.session = Some(session),
            LifecycleEvent::UserUnloaded | LifecycleEvent::UserSignedOut | LifecycleEvent::AccessTokenExpired => {
                self.session = None;
            }
            LifecycleEvent::SilentRenewError(_) => self.error = Some(SILENT_RENEW_ERROR.to_owned()),
            LifecycleEvent::UserSessionChanged => {}
        }
    }

    /// Settle a session-changed re-query. Clears the session when the
    /// provider no longer holds a live one; otherwise leaves state alone.
    ///
    /// Returns whether the session was cleared.
    pub fn settle_session_probe(&mut self, current: Option<&Session>) -> bool {
        let still_active = current.is_some_and(|s| !s.expired());
        if !still_active {
            self.session = None;
        }
        !still_active
    }

    /// Record a silent-renewal failure according to its class.
    pub fn apply_refresh_failure(&mut self, failure: &RefreshFailure) {
        if failure.clears_session() {
            self.session = None;
        }
        self.error = Some(failure.user_message());
    }
}
