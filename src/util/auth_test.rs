use super::*;
use crate::guard::{GuardConfig, NavigationDecision};
use crate::state::test_helpers::{FakeIdentity, live_session};

#[test]
fn sanitize_keeps_same_origin_paths() {
    assert_eq!(sanitize_redirect_target(Some("/station/42")), "/station/42");
    assert_eq!(sanitize_redirect_target(Some("/station/42?tab=pm10")), "/station/42?tab=pm10");
}

#[test]
fn sanitize_defaults_to_root_when_missing() {
    assert_eq!(sanitize_redirect_target(None), "/");
    assert_eq!(sanitize_redirect_target(Some("")), "/");
    assert_eq!(sanitize_redirect_target(Some("   ")), "/");
}

#[test]
fn sanitize_rejects_external_targets() {
    assert_eq!(sanitize_redirect_target(Some("https://evil.example/")), "/");
    assert_eq!(sanitize_redirect_target(Some("//evil.example/path")), "/");
    assert_eq!(sanitize_redirect_target(Some("/\\evil.example")), "/");
    assert_eq!(sanitize_redirect_target(Some("station/42")), "/");
}

#[test]
fn sanitize_never_returns_to_login() {
    assert_eq!(sanitize_redirect_target(Some("/login")), "/");
    assert_eq!(sanitize_redirect_target(Some("/login?redirect=%2F")), "/");
}

// =============================================================
// Guarded transitions
// =============================================================

fn granted(checkpoint: RwSignal<Checkpoint>, full_path: &str) -> bool {
    checkpoint.with_untracked(|c| c.is_granted(full_path))
}

#[tokio::test]
async fn protected_view_stays_hidden_while_check_is_pending() {
    let fake = FakeIdentity::new();
    fake.set_user(Ok(Some(live_session("u1"))));
    let release = fake.hold_next_call();
    let guard = NavigationGuard::new(fake.store(), GuardConfig::default());
    let checkpoint = RwSignal::new(Checkpoint::default());
    let to = Destination::parse("/station/42");

    assert_eq!(guard.decide_now(&to), None);
    let ticket = checkpoint.try_update(Checkpoint::begin).unwrap();
    let mut pending = Box::pin(guard_transition(&guard, checkpoint, ticket, &to, None));
    assert!(futures::poll!(pending.as_mut()).is_pending());
    assert!(!granted(checkpoint, "/station/42"));

    release.send(()).unwrap();
    assert_eq!(pending.await, None);
    assert!(granted(checkpoint, "/station/42"));
}

#[tokio::test]
async fn cold_start_without_session_redirects_and_grants_nothing() {
    let fake = FakeIdentity::new();
    let guard = NavigationGuard::new(fake.store(), GuardConfig::default());
    let checkpoint = RwSignal::new(Checkpoint::default());
    let to = Destination::parse("/station/42");

    let ticket = checkpoint.try_update(Checkpoint::begin).unwrap();
    let redirect = guard_transition(&guard, checkpoint, ticket, &to, None).await;

    assert_eq!(redirect.as_deref(), Some("/login?redirect=%2Fstation%2F42"));
    assert!(!granted(checkpoint, "/station/42"));
}

#[tokio::test]
async fn slow_check_for_earlier_location_does_not_redirect() {
    let fake = FakeIdentity::new();
    let release = fake.hold_next_call();
    let guard = NavigationGuard::new(fake.store(), GuardConfig::default());
    let checkpoint = RwSignal::new(Checkpoint::default());
    let station = Destination::parse("/station/42");

    let first = checkpoint.try_update(Checkpoint::begin).unwrap();
    let mut pending = Box::pin(guard_transition(&guard, checkpoint, first, &station, None));
    assert!(futures::poll!(pending.as_mut()).is_pending());

    // The user moves on before the check settles.
    let login = Destination::parse(LOGIN_PATH);
    let second = checkpoint.try_update(Checkpoint::begin).unwrap();
    let decision = guard.decide_now(&login).unwrap();
    assert_eq!(checkpoint.try_update(|c| c.settle(second, &login, decision)).flatten(), None);

    release.send(()).unwrap();
    assert_eq!(pending.await, None);
    assert!(granted(checkpoint, LOGIN_PATH));
    assert!(!granted(checkpoint, "/station/42"));
}

#[test]
fn live_session_in_memory_grants_without_waiting() {
    let fake = FakeIdentity::new();
    let store = fake.store();
    store.state().update(|s| s.session = Some(live_session("u1")));
    let guard = NavigationGuard::new(store, GuardConfig::default());

    assert_eq!(guard.decide_now(&Destination::parse("/station/42")), Some(NavigationDecision::Allow));
    assert_eq!(fake.call_count("get_user"), 0);
}
