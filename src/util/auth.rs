//! Shared auth routing helpers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every route goes through the same guard, installed once under the router.
//! The guard and the protected views share a [`Checkpoint`] signal: the guard
//! writes the outcome of the latest transition, the views render only once
//! their destination is granted.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
#[cfg(feature = "csr")]
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};

use crate::guard::{AuthGate, Checkpoint, Destination, LOGIN_PATH, NavigationGuard};
use crate::state::store::SessionStore;

/// Run `guard` on every location change and record the outcome in
/// `checkpoint`, replacing the current history entry with the login URL when
/// it says so. Must be called inside a `<Router>`.
///
/// Protected views read `checkpoint` (see `components::guarded::Guarded`)
/// and stay hidden until the transition to them is granted.
pub fn install_auth_guard(guard: NavigationGuard<SessionStore>, checkpoint: RwSignal<Checkpoint>) {
    let location = use_location();
    let navigate = use_navigate();
    let mut previous: Option<Destination> = None;

    Effect::new(move || {
        let to = Destination::from_parts(&location.pathname.get(), &location.search.get(), &location.hash.get());
        let from = previous.replace(to.clone());
        let ticket = checkpoint.try_update(Checkpoint::begin).unwrap_or_default();

        if let Some(decision) = guard.decide_now(&to) {
            checkpoint.update(|c| {
                c.settle(ticket, &to, decision);
            });
            return;
        }

        #[cfg(feature = "csr")]
        {
            let guard = guard.clone();
            let navigate = navigate.clone();
            leptos::task::spawn_local(async move {
                if let Some(url) = guard_transition(&guard, checkpoint, ticket, &to, from.as_ref()).await {
                    navigate(&url, NavigateOptions { replace: true, ..NavigateOptions::default() });
                }
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (&navigate, from);
        }
    });
}

/// Resolve transition `ticket` and settle it on `checkpoint`.
///
/// Returns the location to navigate to. `None` when access was granted or
/// when a newer transition started while the check was in flight.
pub async fn guard_transition<G: AuthGate>(
    guard: &NavigationGuard<G>,
    checkpoint: RwSignal<Checkpoint>,
    ticket: u64,
    to: &Destination,
    from: Option<&Destination>,
) -> Option<String> {
    let decision = guard.resolve(to, from).await;
    checkpoint.try_update(|c| c.settle(ticket, to, decision)).flatten()
}

/// Where to send the user after authentication: `raw` if it is a same-origin
/// absolute path other than the login page, otherwise `/`.
#[must_use]
pub fn sanitize_redirect_target(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(target)
            if target.starts_with('/')
                && !target.starts_with("//")
                && !target.starts_with("/\\")
                && Destination::parse(target).path != LOGIN_PATH =>
        {
            target.to_owned()
        }
        _ => "/".to_owned(),
    }
}
