//! Identity-provider configuration handed to the browser identity client.
//!
//! DESIGN
//! ======
//! Authority and client id default to the SmogWatch deployment and can be
//! overridden when the crate is built (`SMOGWATCH_OIDC_AUTHORITY`,
//! `SMOGWATCH_OIDC_CLIENT_ID`). Everything origin-dependent is derived from
//! the page origin at startup. Renewal and session polling timing live here
//! and are enforced by the identity client, not by the session store.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::Serialize;

pub const DEFAULT_AUTHORITY: &str = "https://auth.bigoscloud.com/application/o/smogwatch/";
pub const DEFAULT_CLIENT_ID: &str = "ToADLuYgQkxnujamNvH0QqMBbLWkt50GIpoXeLJ5";
pub const DEFAULT_SCOPE: &str = "openid profile email offline_access";
pub const DEFAULT_RESPONSE_TYPE: &str = "code";
pub const DEFAULT_CHECK_SESSION_INTERVAL_SECS: u32 = 2;

const REQUIRED_SCOPES: [&str; 3] = ["profile", "email", "offline_access"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("scope must start with openid, got {0:?}")]
    OpenIdNotFirst(String),
    #[error("scope is missing {0}")]
    MissingScope(&'static str),
}

/// Settings for the identity client, serialized in the camelCase shape of
/// `oidc-client-ts`'s `UserManagerSettings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OidcConfig {
    pub authority: String,
    pub redirect_uri: String,
    pub post_logout_redirect_uri: String,
    pub client_id: String,
    pub scope: String,
    pub response_type: String,
    #[serde(rename = "loadUserInfo")]
    pub load_user_info: bool,
    #[serde(rename = "automaticSilentRenew")]
    pub automatic_silent_renew: bool,
    #[serde(rename = "monitorSession")]
    pub monitor_session: bool,
    #[serde(rename = "checkSessionIntervalInSeconds")]
    pub check_session_interval_secs: u32,
}

impl OidcConfig {
    /// Defaults for an app served from `origin` (e.g. `https://smog.example`).
    #[must_use]
    pub fn for_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            authority: option_env!("SMOGWATCH_OIDC_AUTHORITY").unwrap_or(DEFAULT_AUTHORITY).to_owned(),
            redirect_uri: format!("{origin}{}", crate::guard::CALLBACK_PATH),
            post_logout_redirect_uri: format!("{origin}/"),
            client_id: option_env!("SMOGWATCH_OIDC_CLIENT_ID").unwrap_or(DEFAULT_CLIENT_ID).to_owned(),
            scope: DEFAULT_SCOPE.to_owned(),
            response_type: DEFAULT_RESPONSE_TYPE.to_owned(),
            load_user_info: true,
            automatic_silent_renew: true,
            monitor_session: true,
            check_session_interval_secs: DEFAULT_CHECK_SESSION_INTERVAL_SECS,
        }
    }

    /// Defaults for the page the app is running in. Falls back to an empty
    /// origin (relative URIs) outside the browser.
    #[must_use]
    pub fn for_current_origin() -> Self {
        #[cfg(feature = "csr")]
        {
            let origin = web_sys::window()
                .and_then(|w| w.location().origin().ok())
                .unwrap_or_default();
            Self::for_origin(&origin)
        }
        #[cfg(not(feature = "csr"))]
        {
            Self::for_origin("")
        }
    }

    /// Check the settings the identity client cannot work without.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.authority.trim().is_empty() {
            return Err(ConfigError::Missing("authority"));
        }
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Missing("client_id"));
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(ConfigError::Missing("redirect_uri"));
        }
        let granted: Vec<&str> = self.scope.split_whitespace().collect();
        if granted.first() != Some(&"openid") {
            return Err(ConfigError::OpenIdNotFirst(self.scope.clone()));
        }
        for required in REQUIRED_SCOPES {
            if !granted.contains(&required) {
                return Err(ConfigError::MissingScope(required));
            }
        }
        Ok(())
    }

    /// Serialize as the JSON object `UserManager` is constructed with.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn settings_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
