//! Callback page the identity provider redirects back to after sign-in.
//!
//! Exchanges the response in the URL for a session exactly once per mount,
//! then resumes the route the login started from.

#[cfg(test)]
#[path = "callback_test.rs"]
mod callback_test;

use leptos::prelude::*;
#[cfg(feature = "csr")]
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::guard::LOGIN_PATH;
use crate::state::auth::Session;
use crate::state::store::SessionStore;
use crate::util::auth::sanitize_redirect_target;

/// Route to land on once `session` is established.
#[must_use]
pub fn resume_target(session: &Session) -> String {
    sanitize_redirect_target(session.return_to.as_deref())
}

#[component]
pub fn CallbackPage() -> impl IntoView {
    let store = expect_context::<SessionStore>();
    let navigate = use_navigate();
    let failure = RwSignal::new(None::<String>);

    #[cfg(feature = "csr")]
    leptos::task::spawn_local(async move {
        match store.handle_callback().await {
            Ok(session) => {
                navigate(&resume_target(&session), NavigateOptions { replace: true, ..NavigateOptions::default() });
            }
            Err(e) => failure.set(Some(e.to_string())),
        }
    });
    #[cfg(not(feature = "csr"))]
    {
        let _ = (store, navigate);
    }

    view! {
        <div class="login-page">
            <div class="login-card">
                <Show
                    when=move || failure.get().is_some()
                    fallback=|| view! { <p class="login-message">"Completing sign-in..."</p> }
                >
                    <p class="login-message">"Sign-in failed: " {move || failure.get().unwrap_or_default()}</p>
                    <a class="login-button" href=LOGIN_PATH>"Back to login"</a>
                </Show>
            </div>
        </div>
    }
}
