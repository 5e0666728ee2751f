//! Wall-clock access for credential expiry checks.
//!
//! `std::time::SystemTime::now` panics on `wasm32-unknown-unknown`, so the
//! browser build reads `Date.now()` instead.

/// Current time in whole seconds since the Unix epoch.
#[must_use]
pub fn now_secs() -> u64 {
    #[cfg(feature = "csr")]
    {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let secs = (js_sys::Date::now() / 1000.0) as u64;
        secs
    }
    #[cfg(not(feature = "csr"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs())
    }
}
