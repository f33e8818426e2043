mod common;

// self
use api_relay::auth::TokenStore;
use api_relay::error::{AuthError, Error};
use common::*;

#[derive(Debug, serde::Deserialize, PartialEq)]
struct Profile {
	id: u32,
}

#[tokio::test]
async fn expired_token_is_refreshed_once_and_the_attempt_replayed() {
	let transport = MockTransport::new();
	let (relay, coordinator, store) = build_relay(transport.clone());
	let endpoint = bearer_get("/me", 0);

	seed_tokens(&store, "a0", "r0").await;

	transport.push_response(401, "");
	transport.push_response(200, r#"{"access_token":"a1","refresh_token":"r1"}"#);
	transport.push_response(200, r#"{"id":1}"#);

	let profile = relay
		.call::<Profile>(&endpoint)
		.await
		.expect("Refresh-then-retry should recover the call.");

	assert_eq!(profile, Profile { id: 1 });
	assert_eq!(transport.calls(), 3);
	assert_eq!(coordinator.metrics().attempts(), 1);

	let requests = transport.requests();

	assert_eq!(requests[0].header("Authorization"), Some("Bearer a0"));
	assert_eq!(requests[1].url.path(), "/token");
	assert!(
		String::from_utf8_lossy(requests[1].body.as_deref().unwrap_or_default()).contains("r0")
	);
	assert_eq!(requests[2].header("Authorization"), Some("Bearer a1"));

	let rotated = store
		.access_token()
		.await
		.expect("Store read should succeed.")
		.expect("Access token should be present after the refresh.");

	assert_eq!(rotated.expose(), "a1");
}

#[tokio::test]
async fn failed_refresh_terminates_without_further_attempts() {
	let transport = MockTransport::new();
	let (relay, coordinator, store) = build_relay(transport.clone());
	let endpoint = bearer_get("/me", 3);

	seed_tokens(&store, "a0", "r0").await;

	transport.push_response(401, "");
	transport.push_response(400, r#"{"message":"invalid grant"}"#);

	let result = relay.call::<Profile>(&endpoint).await;

	assert!(matches!(result, Err(Error::Auth(AuthError::Unauthenticated))));
	assert_eq!(transport.calls(), 2);
	assert_eq!(coordinator.metrics().failures(), 1);

	// A rejected grant clears the stored pair.
	assert_eq!(store.access_token().await.expect("Store read should succeed."), None);
	assert_eq!(store.refresh_token().await.expect("Store read should succeed."), None);
}

#[tokio::test]
async fn post_refresh_rejection_never_triggers_a_second_refresh() {
	let transport = MockTransport::new();
	let (relay, coordinator, store) = build_relay(transport.clone());
	let endpoint = bearer_get("/me", 3);

	seed_tokens(&store, "a0", "r0").await;

	transport.push_response(401, "");
	transport.push_response(200, r#"{"access_token":"a1","refresh_token":"r1"}"#);
	transport.push_response(401, "");

	let result = relay.call::<Profile>(&endpoint).await;

	assert!(matches!(result, Err(Error::Auth(AuthError::SessionExpired))));
	assert_eq!(transport.calls(), 3);
	assert_eq!(coordinator.metrics().attempts(), 1);
}

#[tokio::test]
async fn missing_credential_skips_the_refresh_path() {
	let transport = MockTransport::new();
	let (relay, coordinator, _) = build_relay(transport.clone());
	let endpoint = plain_get("/me", 3);

	transport.push_response(401, "");

	let result = relay.call::<Profile>(&endpoint).await;

	assert!(matches!(result, Err(Error::Auth(AuthError::Unauthenticated))));
	assert_eq!(transport.calls(), 1);
	assert_eq!(coordinator.metrics().attempts(), 0);
}

#[tokio::test]
async fn bearer_endpoints_without_a_stored_token_skip_the_refresh_path() {
	let transport = MockTransport::new();
	let (relay, coordinator, _) = build_relay(transport.clone());
	let endpoint = bearer_get("/me", 3);

	transport.push_response(401, "");

	let result = relay.call::<Profile>(&endpoint).await;

	assert!(matches!(result, Err(Error::Auth(AuthError::Unauthenticated))));
	assert_eq!(transport.calls(), 1);
	assert_eq!(coordinator.metrics().attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn auth_expiry_after_the_first_attempt_is_terminal() {
	let transport = MockTransport::new();
	let (relay, coordinator, store) = build_relay(transport.clone());
	let endpoint = bearer_get("/me", 3);

	seed_tokens(&store, "a0", "r0").await;

	transport.push_response(500, "");
	transport.push_response(401, "");

	let result = relay.call::<Profile>(&endpoint).await;

	assert!(matches!(result, Err(Error::Auth(AuthError::SessionExpired))));
	assert_eq!(transport.calls(), 2);
	assert_eq!(coordinator.metrics().attempts(), 0);
}
