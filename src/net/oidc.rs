//! Browser identity client backed by `oidc-client-ts`.
//!
//! Client-side (csr): calls into the `oidc.UserManager` global provided by the
//! library's browser bundle, awaiting its promises through
//! `wasm-bindgen-futures`.
//! Elsewhere: every call fails with [`IdentityError::Unavailable`] and no
//! notifications are ever emitted, so native builds and tests never touch JS.
//!
//! DESIGN
//! ======
//! The `UserManager` is a page-lifetime singleton created on first use and
//! kept in a thread-local; [`OidcClient`] itself only carries the settings, so
//! it can be shared freely as an `Arc<dyn IdentityClient>`. Lifecycle
//! callbacks are leaked closures that forward into the store's event queue;
//! there is no teardown short of unloading the page.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "oidc_test.rs"]
mod oidc_test;

use futures::channel::mpsc::UnboundedSender;
#[cfg(any(test, feature = "csr"))]
use serde::Deserialize;

use super::identity::{IdentityClient, IdentityError};
use crate::config::OidcConfig;
#[cfg(any(test, feature = "csr"))]
use crate::state::auth::{Credential, Profile};
use crate::state::auth::{LifecycleEvent, Session};

/// The user object as persisted by `User.toStorageString()`.
#[cfg(any(test, feature = "csr"))]
#[derive(Debug, Deserialize)]
struct StoredUser {
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    session_state: Option<String>,
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    scope: Option<String>,
    profile: Profile,
    #[serde(default)]
    expires_at: Option<u64>,
}

/// Build a session from a stored-user JSON string plus the user state that
/// was attached to the sign-in request.
#[cfg(any(test, feature = "csr"))]
fn session_from_storage(json: &str, return_to: Option<String>) -> Result<Session, IdentityError> {
    let stored: StoredUser =
        serde_json::from_str(json).map_err(|e| IdentityError::Unavailable(format!("unreadable user: {e}")))?;
    Ok(Session {
        profile: stored.profile,
        expires_at: stored.expires_at,
        credential: Credential {
            access_token: stored.access_token,
            id_token: stored.id_token,
            refresh_token: stored.refresh_token,
            token_type: stored.token_type,
            scope: stored.scope,
            session_state: stored.session_state,
        },
        return_to,
    })
}

/// `signinRedirect` arguments carrying the return target as user state.
#[cfg(any(test, feature = "csr"))]
fn signin_args_json(return_to: Option<&str>) -> String {
    match return_to {
        Some(target) => serde_json::json!({ "state": target }).to_string(),
        None => "{}".to_owned(),
    }
}

/// [`IdentityClient`] over the browser's `oidc-client-ts` `UserManager`.
#[derive(Debug, Clone)]
pub struct OidcClient {
    config: OidcConfig,
}

impl OidcClient {
    #[must_use]
    pub fn new(config: OidcConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &OidcConfig {
        &self.config
    }
}

#[cfg(feature = "csr")]
mod js {
    use std::cell::OnceCell;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use super::{IdentityError, OidcConfig, Session, session_from_storage};

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = oidc)]
        #[derive(Clone)]
        pub type UserManager;

        #[wasm_bindgen(constructor, js_namespace = oidc)]
        fn new(settings: &JsValue) -> UserManager;

        #[wasm_bindgen(method, catch, js_name = signinRedirect)]
        pub async fn signin_redirect(this: &UserManager, args: &JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(method, catch, js_name = signinRedirectCallback)]
        pub async fn signin_redirect_callback(this: &UserManager) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(method, catch, js_name = signoutRedirect)]
        pub async fn signout_redirect(this: &UserManager) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(method, catch, js_name = getUser)]
        pub async fn get_user(this: &UserManager) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(method, catch, js_name = signinSilent)]
        pub async fn signin_silent(this: &UserManager) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(method, getter)]
        pub fn events(this: &UserManager) -> UserManagerEvents;

        pub type UserManagerEvents;

        #[wasm_bindgen(method, js_name = addUserLoaded)]
        pub fn add_user_loaded(this: &UserManagerEvents, cb: &Closure<dyn FnMut(JsValue)>);

        #[wasm_bindgen(method, js_name = addUserUnloaded)]
        pub fn add_user_unloaded(this: &UserManagerEvents, cb: &Closure<dyn FnMut()>);

        #[wasm_bindgen(method, js_name = addSilentRenewError)]
        pub fn add_silent_renew_error(this: &UserManagerEvents, cb: &Closure<dyn FnMut(JsValue)>);

        #[wasm_bindgen(method, js_name = addUserSignedOut)]
        pub fn add_user_signed_out(this: &UserManagerEvents, cb: &Closure<dyn FnMut()>);

        #[wasm_bindgen(method, js_name = addAccessTokenExpired)]
        pub fn add_access_token_expired(this: &UserManagerEvents, cb: &Closure<dyn FnMut()>);

        #[wasm_bindgen(method, js_name = addUserSessionChanged)]
        pub fn add_user_session_changed(this: &UserManagerEvents, cb: &Closure<dyn FnMut()>);

        type OidcUser;

        #[wasm_bindgen(method, js_name = toStorageString)]
        fn to_storage_string(this: &OidcUser) -> String;
    }

    thread_local! {
        static MANAGER: OnceCell<UserManager> = const { OnceCell::new() };
    }

    /// The page's `UserManager`, created from `config` on first use.
    pub fn manager(config: &OidcConfig) -> Result<UserManager, IdentityError> {
        if let Some(existing) = MANAGER.with(|cell| cell.get().cloned()) {
            return Ok(existing);
        }
        let global = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("oidc")).unwrap_or(JsValue::UNDEFINED);
        if global.is_undefined() {
            return Err(IdentityError::Unavailable("oidc-client-ts is not loaded".to_owned()));
        }
        let json = config
            .settings_json()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        let settings =
            js_sys::JSON::parse(&json).map_err(|e| IdentityError::Unavailable(describe(&e)))?;
        let created = UserManager::new(&settings);
        log::debug!("auth: identity client created for {}", config.authority);
        Ok(MANAGER.with(|cell| cell.get_or_init(|| created).clone()))
    }

    /// Normalize a rejected promise value.
    pub fn identity_error(err: &JsValue) -> IdentityError {
        match err.dyn_ref::<js_sys::Error>() {
            Some(e) => IdentityError::Provider(String::from(e.message())),
            None => IdentityError::Opaque(describe(err)),
        }
    }

    fn describe(value: &JsValue) -> String {
        value
            .as_string()
            .or_else(|| js_sys::JSON::stringify(value).ok().and_then(|s| s.as_string()))
            .unwrap_or_else(|| format!("{value:?}"))
    }

    /// Convert a resolved `User | null`.
    pub fn session_from_js(value: &JsValue) -> Result<Option<Session>, IdentityError> {
        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        let return_to = js_sys::Reflect::get(value, &JsValue::from_str("state"))
            .ok()
            .and_then(|v| v.as_string());
        let user: &OidcUser = value.unchecked_ref();
        session_from_storage(&user.to_storage_string(), return_to).map(Some)
    }
}

#[async_trait::async_trait(?Send)]
impl IdentityClient for OidcClient {
    async fn signin_redirect(&self, return_to: Option<&str>) -> Result<(), IdentityError> {
        #[cfg(feature = "csr")]
        {
            let manager = js::manager(&self.config)?;
            let args = js_sys::JSON::parse(&signin_args_json(return_to)).map_err(|e| js::identity_error(&e))?;
            manager
                .signin_redirect(&args)
                .await
                .map(|_| ())
                .map_err(|e| js::identity_error(&e))
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = return_to;
            Err(unavailable())
        }
    }

    async fn signin_redirect_callback(&self) -> Result<Session, IdentityError> {
        #[cfg(feature = "csr")]
        {
            let manager = js::manager(&self.config)?;
            let user = manager
                .signin_redirect_callback()
                .await
                .map_err(|e| js::identity_error(&e))?;
            js::session_from_js(&user)?
                .ok_or_else(|| IdentityError::Provider("No user returned from sign-in callback".to_owned()))
        }
        #[cfg(not(feature = "csr"))]
        {
            Err(unavailable())
        }
    }

    async fn signout_redirect(&self) -> Result<(), IdentityError> {
        #[cfg(feature = "csr")]
        {
            let manager = js::manager(&self.config)?;
            manager
                .signout_redirect()
                .await
                .map(|_| ())
                .map_err(|e| js::identity_error(&e))
        }
        #[cfg(not(feature = "csr"))]
        {
            Err(unavailable())
        }
    }

    async fn get_user(&self) -> Result<Option<Session>, IdentityError> {
        #[cfg(feature = "csr")]
        {
            let manager = js::manager(&self.config)?;
            let user = manager.get_user().await.map_err(|e| js::identity_error(&e))?;
            js::session_from_js(&user)
        }
        #[cfg(not(feature = "csr"))]
        {
            Err(unavailable())
        }
    }

    async fn signin_silent(&self) -> Result<Option<Session>, IdentityError> {
        #[cfg(feature = "csr")]
        {
            let manager = js::manager(&self.config)?;
            let user = manager.signin_silent().await.map_err(|e| js::identity_error(&e))?;
            js::session_from_js(&user)
        }
        #[cfg(not(feature = "csr"))]
        {
            Err(unavailable())
        }
    }

    fn subscribe(&self, events: UnboundedSender<LifecycleEvent>) {
        #[cfg(feature = "csr")]
        {
            use wasm_bindgen::JsValue;
            use wasm_bindgen::closure::Closure;

            let manager = match js::manager(&self.config) {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("auth: cannot subscribe to identity events: {e}");
                    return;
                }
            };
            let hub = manager.events();

            let tx = events.clone();
            let on_loaded = Closure::<dyn FnMut(JsValue)>::new(move |user: JsValue| match js::session_from_js(&user) {
                Ok(Some(session)) => forward(&tx, LifecycleEvent::UserLoaded(session)),
                Ok(None) => forward(&tx, LifecycleEvent::UserUnloaded),
                Err(e) => log::warn!("auth: ignoring unreadable loaded user: {e}"),
            });
            hub.add_user_loaded(&on_loaded);
            on_loaded.forget();

            let tx = events.clone();
            let on_renew_error = Closure::<dyn FnMut(JsValue)>::new(move |err: JsValue| {
                forward(&tx, LifecycleEvent::SilentRenewError(js::identity_error(&err).to_string()));
            });
            hub.add_silent_renew_error(&on_renew_error);
            on_renew_error.forget();

            let bare: [(fn(&js::UserManagerEvents, &Closure<dyn FnMut()>), LifecycleEvent); 4] = [
                (js::UserManagerEvents::add_user_unloaded, LifecycleEvent::UserUnloaded),
                (js::UserManagerEvents::add_user_signed_out, LifecycleEvent::UserSignedOut),
                (js::UserManagerEvents::add_access_token_expired, LifecycleEvent::AccessTokenExpired),
                (js::UserManagerEvents::add_user_session_changed, LifecycleEvent::UserSessionChanged),
            ];
            for (register, event) in bare {
                let tx = events.clone();
                let cb = Closure::<dyn FnMut()>::new(move || forward(&tx, event.clone()));
                register(&hub, &cb);
                cb.forget();
            }
        }
        #[cfg(not(feature = "csr"))]
        {
            log::debug!("auth: identity events unavailable outside the browser");
            drop(events);
        }
    }
}

#[cfg(feature = "csr")]
fn forward(tx: &UnboundedSender<LifecycleEvent>, event: LifecycleEvent) {
    if tx.unbounded_send(event).is_err() {
        log::debug!("auth: identity event dropped, store no longer listening");
    }
}

#[cfg(not(feature = "csr"))]
fn unavailable() -> IdentityError {
    IdentityError::Unavailable("not running in a browser".to_owned())
}
