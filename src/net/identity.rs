//! Seam between the session store and the identity-protocol client.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store never talks to the identity provider directly. Everything it
//! needs (redirect sign-in, callback exchange, sign-out, cached-session lookup,
//! silent renewal, lifecycle notifications) goes through [`IdentityClient`],
//! which the browser build implements on top of `oidc-client-ts` and tests
//! replace with scripted fakes.

use futures::channel::mpsc::UnboundedSender;

use crate::state::auth::{LifecycleEvent, Session};

/// Failure reported by the identity client.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The client raised an error object; carries its message verbatim.
    #[error("{0}")]
    Provider(String),
    /// The client raised something that was not an error object.
    #[error("{0}")]
    Opaque(String),
    /// The client itself could not be reached or set up.
    #[error("identity client unavailable: {0}")]
    Unavailable(String),
}

impl IdentityError {
    /// Message suitable for the store's error field, or `fallback` when the
    /// failure carried no meaningful message.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            Self::Provider(message) => message.clone(),
            Self::Unavailable(_) => self.to_string(),
            Self::Opaque(_) => fallback.to_owned(),
        }
    }
}

/// Identity-protocol client the session store depends on.
///
/// Futures are `!Send`: the browser implementation awaits JS promises on the
/// page's single thread.
#[async_trait::async_trait(?Send)]
pub trait IdentityClient: Send + Sync {
    /// Start the redirect-based sign-in. Resolves once the redirect has been
    /// dispatched; `return_to` travels with the request and comes back as
    /// [`Session::return_to`].
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect could not be initiated.
    async fn signin_redirect(&self, return_to: Option<&str>) -> Result<(), IdentityError>;

    /// Exchange the callback parameters in the current URL for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the response is missing, invalid, or rejected.
    async fn signin_redirect_callback(&self) -> Result<Session, IdentityError>;

    /// Start the redirect-based sign-out.
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect could not be initiated.
    async fn signout_redirect(&self) -> Result<(), IdentityError>;

    /// Return the cached session, if any, without any redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if the session storage could not be read.
    async fn get_user(&self) -> Result<Option<Session>, IdentityError>;

    /// Renew the credential without user interaction.
    ///
    /// # Errors
    ///
    /// Returns an error with the provider's message when renewal fails.
    async fn signin_silent(&self) -> Result<Option<Session>, IdentityError>;

    /// Register `events` as the sink for lifecycle notifications. Called once
    /// per store event loop; notifications keep flowing until the client
    /// drops the sender.
    fn subscribe(&self, events: UnboundedSender<LifecycleEvent>);
}
