//! Scripted identity client and session builders shared by unit tests.

use std::sync::{Arc, Mutex};

use futures::channel::mpsc::UnboundedSender;
use futures::channel::oneshot;

use crate::net::identity::{IdentityClient, IdentityError};
use crate::state::auth::{Credential, LifecycleEvent, Profile, Session};
use crate::state::store::SessionStore;
use crate::util::clock;

/// A live session for `sub`, valid for another hour.
#[must_use]
pub fn live_session(sub: &str) -> Session {
    session_expiring(sub, Some(clock::now_secs() + 3600))
}

/// A session for `sub` whose credential expired long ago.
#[must_use]
pub fn expired_session(sub: &str) -> Session {
    session_expiring(sub, Some(1))
}

#[must_use]
pub fn session_expiring(sub: &str, expires_at: Option<u64>) -> Session {
    Session {
        profile: Profile {
            sub: sub.to_owned(),
            name: Some(format!("{sub} name")),
            email: Some(format!("{sub}@example.com")),
        },
        expires_at,
        credential: Credential {
            access_token: format!("access-{sub}"),
            token_type: "Bearer".to_owned(),
            ..Credential::default()
        },
        return_to: None,
    }
}

/// Identity client whose every answer is set by the test.
pub struct FakeIdentity {
    pub signin: Mutex<Result<(), IdentityError>>,
    pub callback: Mutex<Result<Session, IdentityError>>,
    pub signout: Mutex<Result<(), IdentityError>>,
    pub user: Mutex<Result<Option<Session>, IdentityError>>,
    pub silent: Mutex<Result<Option<Session>, IdentityError>>,
    /// Names of the calls received, in order.
    pub calls: Mutex<Vec<String>>,
    /// Sender handed over by the most recent `subscribe`.
    pub sink: Mutex<Option<UnboundedSender<LifecycleEvent>>>,
    /// Call name that panics instead of answering.
    pub panic_on: Mutex<Option<&'static str>>,
    /// When set, the next call waits for this before answering.
    pub hold: Mutex<Option<oneshot::Receiver<()>>>,
}

impl FakeIdentity {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            signin: Mutex::new(Ok(())),
            callback: Mutex::new(Err(IdentityError::Provider("No matching state found in storage".to_owned()))),
            signout: Mutex::new(Ok(())),
            user: Mutex::new(Ok(None)),
            silent: Mutex::new(Err(IdentityError::Provider("No state in response".to_owned()))),
            calls: Mutex::new(Vec::new()),
            sink: Mutex::new(None),
            panic_on: Mutex::new(None),
            hold: Mutex::new(None),
        })
    }

    /// Build a store backed by this fake.
    #[must_use]
    pub fn store(self: &Arc<Self>) -> SessionStore {
        SessionStore::new(self.clone())
    }

    pub fn set_user(&self, answer: Result<Option<Session>, IdentityError>) {
        *self.user.lock().unwrap() = answer;
    }

    pub fn set_callback(&self, answer: Result<Session, IdentityError>) {
        *self.callback.lock().unwrap() = answer;
    }

    pub fn set_silent(&self, answer: Result<Option<Session>, IdentityError>) {
        *self.silent.lock().unwrap() = answer;
    }

    pub fn set_signin(&self, answer: Result<(), IdentityError>) {
        *self.signin.lock().unwrap() = answer;
    }

    pub fn set_signout(&self, answer: Result<(), IdentityError>) {
        *self.signout.lock().unwrap() = answer;
    }

    /// Make the next call wait until the returned sender fires.
    #[must_use]
    pub fn hold_next_call(&self) -> oneshot::Sender<()> {
        let (release, wait) = oneshot::channel();
        *self.hold.lock().unwrap() = Some(wait);
        release
    }

    #[must_use]
    pub fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split('(').next() == Some(name))
            .count()
    }

    /// Push a notification as the identity client would.
    pub fn emit(&self, event: LifecycleEvent) {
        let sink = self.sink.lock().unwrap();
        sink.as_ref().expect("no subscriber").unbounded_send(event).unwrap();
    }

    /// Drop the subscriber's sender, ending its event loop.
    pub fn close_events(&self) {
        self.sink.lock().unwrap().take();
    }

    async fn enter(&self, name: &'static str, detail: Option<&str>) {
        let entry = match detail {
            Some(detail) => format!("{name}({detail})"),
            None => name.to_owned(),
        };
        self.calls.lock().unwrap().push(entry);
        let held = self.hold.lock().unwrap().take();
        if let Some(wait) = held {
            let _ = wait.await;
        }
        let panics = *self.panic_on.lock().unwrap() == Some(name);
        if panics {
            panic!("{name} exploded");
        }
    }
}

#[async_trait::async_trait(?Send)]
impl IdentityClient for FakeIdentity {
    async fn signin_redirect(&self, return_to: Option<&str>) -> Result<(), IdentityError> {
        self.enter("signin_redirect", return_to).await;
        self.signin.lock().unwrap().clone()
    }

    async fn signin_redirect_callback(&self) -> Result<Session, IdentityError> {
        self.enter("signin_redirect_callback", None).await;
        self.callback.lock().unwrap().clone()
    }

    async fn signout_redirect(&self) -> Result<(), IdentityError> {
        self.enter("signout_redirect", None).await;
        self.signout.lock().unwrap().clone()
    }

    async fn get_user(&self) -> Result<Option<Session>, IdentityError> {
        self.enter("get_user", None).await;
        self.user.lock().unwrap().clone()
    }

    async fn signin_silent(&self) -> Result<Option<Session>, IdentityError> {
        self.enter("signin_silent", None).await;
        self.silent.lock().unwrap().clone()
    }

    fn subscribe(&self, events: UnboundedSender<LifecycleEvent>) {
        self.calls.lock().unwrap().push("subscribe".to_owned());
        *self.sink.lock().unwrap() = Some(events);
    }
}
