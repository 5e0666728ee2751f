//! # smogwatch
//!
//! Leptos + WASM frontend session core for SmogWatch.
//!
//! The crate tracks whether the browser user is signed in with the identity
//! provider (OIDC authorization-code flow with silent renewal), reacts to the
//! provider's lifecycle notifications, and gates client-side navigation on
//! the result. Token validation and the redirect exchanges themselves are
//! left to `oidc-client-ts`, reached through the [`net::identity`] seam.
//!
//! Browser-only code sits behind the `csr` feature; without it the state
//! machine, guard and configuration build and test natively.

pub mod app;
pub mod components;
pub mod config;
pub mod guard;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point: wire up logging and mount the app.
#[cfg(feature = "csr")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::mount_to_body(app::App);
}
