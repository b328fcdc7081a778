mod fixtures;

use fixtures::{id_token, JWKS, KEY_ID, PROJECT_ID};
use serde_json::json;
use solarvita_common::{IdentityVerifier, SolarvitaError};
use solarvita_firebase::{FirebaseIdentityVerifier, UnconfiguredIdentityVerifier};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn verifier_with_keys(expected_fetches: u64) -> (MockServer, FirebaseIdentityVerifier) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_string(JWKS))
        .expect(expected_fetches)
        .mount(&server)
        .await;

    let verifier =
        FirebaseIdentityVerifier::with_jwks_url(PROJECT_ID, format!("{}/jwks", server.uri()));
    (server, verifier)
}

#[tokio::test]
async fn test_valid_token_yields_uid() {
    let (_server, verifier) = verifier_with_keys(1).await;

    let caller = verifier.verify(&id_token(json!({}), KEY_ID)).await.unwrap();
    assert_eq!(caller.uid, "user-123");
    assert_eq!(caller.email.as_deref(), Some("runner@solarvita.app"));

    // keys are cached
    let again = verifier
        .verify(&id_token(json!({ "sub": "user-456" }), KEY_ID))
        .await
        .unwrap();
    assert_eq!(again.uid, "user-456");
}

#[tokio::test]
async fn test_wrong_audience_is_rejected() {
    let (_server, verifier) = verifier_with_keys(1).await;

    let token = id_token(json!({ "aud": "someone-elses-project" }), KEY_ID);
    let err = verifier.verify(&token).await.unwrap_err();
    assert!(matches!(err, SolarvitaError::Unauthenticated(_)));
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let (_server, verifier) = verifier_with_keys(1).await;

    let token = id_token(json!({ "exp": 1_000_000, "iat": 900_000 }), KEY_ID);
    let err = verifier.verify(&token).await.unwrap_err();
    assert_eq!(err, SolarvitaError::Unauthenticated("ID token has expired".into()));
}

#[tokio::test]
async fn test_unknown_key_id_is_rejected() {
    let (_server, verifier) = verifier_with_keys(1).await;

    let err = verifier
        .verify(&id_token(json!({}), "rotated-away"))
        .await
        .unwrap_err();
    assert!(matches!(err, SolarvitaError::Unauthenticated(_)));
}

#[tokio::test]
async fn test_garbage_token_is_rejected_without_fetching_keys() {
    let (_server, verifier) = verifier_with_keys(0).await;

    let err = verifier.verify("not-a-jwt").await.unwrap_err();
    assert!(matches!(err, SolarvitaError::Unauthenticated(_)));
}

#[tokio::test]
async fn test_unconfigured_verifier_rejects_everything() {
    let err = UnconfiguredIdentityVerifier
        .verify(&id_token(json!({}), KEY_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, SolarvitaError::Unauthenticated(_)));
}
