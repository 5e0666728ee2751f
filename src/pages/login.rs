//! Login page: starts the identity provider's redirect sign-in.
//!
//! SYSTEM CONTEXT
//! ==============
//! The guard sends unauthenticated visitors here with the page they wanted in
//! the `redirect` query parameter. That target rides along with the sign-in
//! request and is resumed by the callback page; if the store already reports
//! a live session (e.g. after a reload) we go there directly.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_navigate, use_query_map};

use crate::guard::REDIRECT_PARAM;
use crate::state::auth::AuthState;
use crate::state::store::SessionStore;
use crate::util::auth::sanitize_redirect_target;

#[component]
pub fn LoginPage() -> impl IntoView {
    let store = expect_context::<SessionStore>();
    let auth = store.state();
    let query = use_query_map();
    let navigate = use_navigate();

    let target = Memo::new(move |_| query.with(|q| sanitize_redirect_target(q.get(REDIRECT_PARAM).as_deref())));

    Effect::new(move || {
        if auth.with(AuthState::is_authenticated) {
            navigate(&target.get(), NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    let on_login = move |_| {
        if auth.get_untracked().loading {
            return;
        }
        #[cfg(feature = "csr")]
        {
            let store = store.clone();
            let target = target.get_untracked();
            leptos::task::spawn_local(async move {
                if let Err(e) = store.login_to(Some(&target)).await {
                    log::warn!("login: could not start sign-in: {e}");
                }
            });
        }
    };

    view! {
        <div class="login-page">
            <div class="login-card">
                <h1>"SmogWatch"</h1>
                <p class="login-card__subtitle">"Sign in to see air quality stations."</p>
                <button class="login-button" on:click=on_login disabled=move || auth.get().loading>
                    {move || if auth.get().loading { "Redirecting..." } else { "Sign in" }}
                </button>
                <Show when=move || auth.get().error.is_some()>
                    <p class="login-message">{move || auth.get().error.unwrap_or_default()}</p>
                </Show>
            </div>
        </div>
    }
}
