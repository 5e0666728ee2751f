//! Root application component with routing and context providers.

use std::sync::Arc;

use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    ParamSegment, StaticSegment,
    components::{Route, Router, Routes},
};

use crate::components::guarded::Guarded;
use crate::config::OidcConfig;
use crate::guard::{Checkpoint, GuardConfig, NavigationGuard};
use crate::net::oidc::OidcClient;
use crate::pages::{callback::CallbackPage, home::HomePage, login::LoginPage, station::StationPage};
use crate::state::store::SessionStore;
use crate::util::auth::install_auth_guard;

/// Root application component.
///
/// Creates the page-lifetime session store, starts its identity event loop,
/// and sets up client-side routing behind the auth guard. Protected routes
/// render through [`Guarded`].
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let config = OidcConfig::for_current_origin();
    if let Err(e) = config.validate() {
        log::error!("auth: invalid identity provider configuration: {e}");
    }
    let store = SessionStore::new(Arc::new(OidcClient::new(config)));

    #[cfg(feature = "csr")]
    leptos::task::spawn_local(store.listen());

    provide_context(store);
    provide_context(RwSignal::new(Checkpoint::default()));

    view! {
        <Title text="SmogWatch"/>

        <Router>
            <AuthGuard/>
            <Routes fallback=|| "Page not found.".into_view()>
                <Route path=StaticSegment("login") view=LoginPage/>
                <Route path=(StaticSegment("auth"), StaticSegment("callback")) view=CallbackPage/>
                <Route path=StaticSegment("") view=|| view! { <Guarded><HomePage/></Guarded> }/>
                <Route
                    path=(StaticSegment("station"), ParamSegment("id"))
                    view=|| view! { <Guarded><StationPage/></Guarded> }
                />
            </Routes>
        </Router>
    }
}

/// Installs the navigation guard; renders nothing.
#[component]
fn AuthGuard() -> impl IntoView {
    let store = expect_context::<SessionStore>();
    let checkpoint = expect_context::<RwSignal<Checkpoint>>();
    install_auth_guard(NavigationGuard::new(store, GuardConfig::default()), checkpoint);
}
