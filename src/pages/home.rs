//! Authenticated landing page with the signed-in user's identity and session
//! controls (silent refresh, sign-out).

use leptos::prelude::*;

use crate::state::auth::AuthState;
use crate::state::store::SessionStore;

#[component]
pub fn HomePage() -> impl IntoView {
    let store = expect_context::<SessionStore>();
    let auth = store.state();

    view! {
        <div class="home-page">
            <h1>"SmogWatch"</h1>
            <SessionPanel/>
            <p>
                <a href="/station/400">"Open a station"</a>
            </p>
            <Show when=move || auth.with(|s| s.error.is_some())>
                <p class="login-message">{move || auth.with(|s| s.error.clone().unwrap_or_default())}</p>
            </Show>
        </div>
    }
}

/// Signed-in user summary plus refresh and sign-out buttons.
#[component]
pub fn SessionPanel() -> impl IntoView {
    let store = expect_context::<SessionStore>();
    let auth = store.state();

    let display_name = move || {
        auth.with(AuthState::user_info)
            .map(|u| u.name.or(u.email).unwrap_or(u.id))
            .unwrap_or_default()
    };

    let refresh_store = store.clone();
    let on_refresh = move |_| {
        #[cfg(feature = "csr")]
        {
            let store = refresh_store.clone();
            leptos::task::spawn_local(async move {
                if !store.refresh_token().await {
                    log::warn!("home: session refresh failed: {}", store.snapshot().error.unwrap_or_default());
                }
            });
        }
        #[cfg(not(feature = "csr"))]
        let _ = &refresh_store;
    };

    let on_logout = move |_| {
        #[cfg(feature = "csr")]
        {
            let store = store.clone();
            leptos::task::spawn_local(async move {
                if let Err(e) = store.logout().await {
                    log::warn!("home: sign-out failed: {e}");
                }
            });
        }
        #[cfg(not(feature = "csr"))]
        let _ = &store;
    };

    view! {
        <div class="session-panel">
            <span class="session-panel__user">{display_name}</span>
            <button class="session-panel__button" on:click=on_refresh disabled=move || auth.get().loading>
                "Refresh session"
            </button>
            <button class="session-panel__button" on:click=on_logout disabled=move || auth.get().loading>
                "Sign out"
            </button>
        </div>
    }
}
