use super::*;

const STORED_USER: &str = r#"{
    "id_token": "eyJhbGciOi.id",
    "session_state": "abc123",
    "access_token": "eyJhbGciOi.access",
    "refresh_token": "rt-1",
    "token_type": "Bearer",
    "scope": "openid profile email offline_access",
    "profile": { "sub": "5f1c", "name": "Ola", "email": "ola@example.com", "preferred_username": "ola" },
    "expires_at": 1900000000
}"#;

#[test]
fn session_from_storage_maps_claims_and_credential() {
    let session = session_from_storage(STORED_USER, Some("/station/42".to_owned())).unwrap();
    assert_eq!(session.profile.sub, "5f1c");
    assert_eq!(session.profile.name.as_deref(), Some("Ola"));
    assert_eq!(session.expires_at, Some(1_900_000_000));
    assert_eq!(session.credential.access_token, "eyJhbGciOi.access");
    assert_eq!(session.credential.refresh_token.as_deref(), Some("rt-1"));
    assert_eq!(session.credential.session_state.as_deref(), Some("abc123"));
    assert_eq!(session.return_to.as_deref(), Some("/station/42"));
}

#[test]
fn session_from_storage_tolerates_minimal_user() {
    let json = r#"{ "access_token": "at", "profile": { "sub": "u1" } }"#;
    let session = session_from_storage(json, None).unwrap();
    assert_eq!(session.profile.sub, "u1");
    assert!(session.profile.email.is_none());
    assert!(session.expires_at.is_none());
    assert!(!session.expired());
}

#[test]
fn session_from_storage_rejects_garbage() {
    let err = session_from_storage("not json", None).unwrap_err();
    assert!(matches!(err, IdentityError::Unavailable(_)));
}

#[test]
fn signin_args_carry_return_target_as_state() {
    assert_eq!(signin_args_json(None), "{}");
    let value: serde_json::Value = serde_json::from_str(&signin_args_json(Some("/station/42?x=1"))).unwrap();
    assert_eq!(value["state"], "/station/42?x=1");
}

#[cfg(not(feature = "csr"))]
#[tokio::test]
async fn native_client_is_unavailable() {
    let client = OidcClient::new(OidcConfig::for_origin("https://smog.example"));
    assert!(matches!(client.get_user().await, Err(IdentityError::Unavailable(_))));
    assert!(matches!(client.signin_redirect(Some("/")).await, Err(IdentityError::Unavailable(_))));
    assert_eq!(client.config().client_id, crate::config::DEFAULT_CLIENT_ID);
}

#[cfg(not(feature = "csr"))]
#[tokio::test]
async fn store_over_native_client_degrades_to_signed_out() {
    let store = crate::state::store::SessionStore::new(std::sync::Arc::new(OidcClient::new(
        OidcConfig::for_origin("https://smog.example"),
    )));
    assert!(!store.check_auth().await);
    assert!(store.login().await.is_err());
    let state = store.snapshot();
    assert!(state.error.unwrap().contains("unavailable"));
    assert!(!state.loading);
}
