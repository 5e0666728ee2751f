//! Navigation guard gating every client-side route transition.
//!
//! SYSTEM CONTEXT
//! ==============
//! Installed once inside the router (see `util::auth::install_auth_guard`).
//! Public destinations pass straight through; everything else needs a live
//! session, loading one from the identity client's cache on cold start.
//!
//! ERROR HANDLING
//! ==============
//! A faulted status check is treated as "not authenticated": the user lands
//! on the login page with the original destination preserved, never on the
//! protected page.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use crate::net::identity::IdentityError;
use crate::state::store::SessionStore;

pub const LOGIN_PATH: &str = "/login";
pub const CALLBACK_PATH: &str = "/auth/callback";
/// Query parameter carrying the pending redirect target on the login URL.
pub const REDIRECT_PARAM: &str = "redirect";

/// Authentication source the guard consults.
#[async_trait::async_trait(?Send)]
pub trait AuthGate {
    /// Whether a live session is already in memory.
    fn is_authenticated(&self) -> bool;

    /// Load the cached session and report whether it is live.
    ///
    /// # Errors
    ///
    /// Returns an error if the check itself faulted.
    async fn check(&self) -> Result<bool, IdentityError>;
}

#[async_trait::async_trait(?Send)]
impl AuthGate for SessionStore {
    fn is_authenticated(&self) -> bool {
        SessionStore::is_authenticated(self)
    }

    async fn check(&self) -> Result<bool, IdentityError> {
        Ok(self.check_auth().await)
    }
}

/// Login route and the destinations reachable without a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardConfig {
    pub login_path: String,
    pub public_paths: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_path: LOGIN_PATH.to_owned(),
            public_paths: vec![LOGIN_PATH.to_owned(), CALLBACK_PATH.to_owned()],
        }
    }
}

/// A requested route: bare path for matching, full path for resuming.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    pub path: String,
    pub full_path: String,
}

impl Destination {
    /// Split `full_path` (path plus optional query and fragment).
    #[must_use]
    pub fn parse(full_path: &str) -> Self {
        let end = full_path.find(['?', '#']).unwrap_or(full_path.len());
        let path = match &full_path[..end] {
            "" => "/",
            p => p,
        };
        Self { path: path.to_owned(), full_path: full_path.to_owned() }
    }

    /// Build from router location parts. `search` and `hash` may come with or
    /// without their leading `?` / `#`.
    #[must_use]
    pub fn from_parts(pathname: &str, search: &str, hash: &str) -> Self {
        let mut full_path = pathname.to_owned();
        if !search.is_empty() {
            if !search.starts_with('?') {
                full_path.push('?');
            }
            full_path.push_str(search);
        }
        if !hash.is_empty() {
            if !hash.starts_with('#') {
                full_path.push('#');
            }
            full_path.push_str(hash);
        }
        Self::parse(&full_path)
    }
}

/// Outcome of a guarded transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    /// Navigate here instead (login URL with the redirect target).
    Redirect(String),
}

/// Which transition is current and which destination it cleared.
///
/// Protected views render only for the granted destination, so a transition
/// stays invisible until its check settles. Each new transition takes a fresh
/// ticket; outcomes carrying an older ticket are discarded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Checkpoint {
    generation: u64,
    granted: Option<String>,
}

impl Checkpoint {
    /// Start a new transition, revoking the previous grant.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.granted = None;
        self.generation
    }

    /// Apply the guard's decision for transition `ticket` to `to`.
    ///
    /// Returns the location to navigate to, if any. Stale tickets change
    /// nothing and never redirect.
    pub fn settle(&mut self, ticket: u64, to: &Destination, decision: NavigationDecision) -> Option<String> {
        if ticket != self.generation {
            log::debug!("guard: dropping stale decision for {}", to.full_path);
            return None;
        }
        match decision {
            NavigationDecision::Allow => {
                self.granted = Some(to.full_path.clone());
                None
            }
            NavigationDecision::Redirect(location) => Some(location),
        }
    }

    /// Whether the view at `full_path` may render.
    #[must_use]
    pub fn is_granted(&self, full_path: &str) -> bool {
        self.granted.as_deref() == Some(full_path)
    }
}

/// Login URL for an unauthenticated visit to `to`.
///
/// The redirect target is `to`'s full path, or `/` when `to` is the login
/// page itself so the login page never sends the user back to itself.
#[must_use]
pub fn login_location(config: &GuardConfig, to: &Destination) -> String {
    let target = if to.path == config.login_path { "/" } else { to.full_path.as_str() };
    format!("{}?{REDIRECT_PARAM}={}", config.login_path, urlencoding::encode(target))
}

#[derive(Clone)]
pub struct NavigationGuard<G> {
    gate: G,
    config: GuardConfig,
}

impl<G: AuthGate> NavigationGuard<G> {
    pub fn new(gate: G, config: GuardConfig) -> Self {
        Self { gate, config }
    }

    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    #[must_use]
    pub fn is_public(&self, to: &Destination) -> bool {
        self.config.public_paths.iter().any(|p| *p == to.path)
    }

    /// The decision when it needs no status check: `Allow` for public
    /// destinations or an in-memory live session, otherwise `None`.
    #[must_use]
    pub fn decide_now(&self, to: &Destination) -> Option<NavigationDecision> {
        (self.is_public(to) || self.gate.is_authenticated()).then_some(NavigationDecision::Allow)
    }

    /// Decide whether the transition `from -> to` may proceed.
    pub async fn resolve(&self, to: &Destination, from: Option<&Destination>) -> NavigationDecision {
        let from_path = from.map_or("<start>", |d| d.full_path.as_str());
        if self.is_public(to) {
            log::debug!("guard: {from_path} -> {} (public)", to.full_path);
            return NavigationDecision::Allow;
        }

        let authenticated = self.gate.is_authenticated()
            || match self.gate.check().await {
                Ok(authenticated) => authenticated,
                Err(e) => {
                    log::warn!("guard: auth check faulted: {e}");
                    false
                }
            };

        if authenticated {
            log::debug!("guard: {from_path} -> {} (allowed)", to.full_path);
            NavigationDecision::Allow
        } else {
            let location = login_location(&self.config, to);
            log::info!("guard: {from_path} -> {} redirected to {location}", to.full_path);
            NavigationDecision::Redirect(location)
        }
    }
}
