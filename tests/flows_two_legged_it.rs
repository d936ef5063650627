mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::Duration;
// self
use common::*;
use lyft_client::{
	auth::Scope,
	error::{DecodeError, Error},
	oauth2::http::StatusCode,
};

#[tokio::test]
async fn client_credentials_issues_application_token() {
	let server = MockServer::start_async().await;
	let client = build_oauth_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token")
				.header("authorization", basic_header())
				.header("content-type", "application/json")
				.json_body(json!({ "grant_type": "client_credentials", "scope": "public rides.read" }));
			then.status(200)
				.header("content-type", "application/json")
				.header("request-id", "req-token-1")
				.header("x-ratelimit-remaining", "99")
				.body(
					"{\"access_token\":\"app-token\",\"token_type\":\"Bearer\",\"expires_in\":3600,\"scope\":\"public rides.read\"}",
				);
		})
		.await;
	let issued = client
		.client_credentials(&[Scope::Public, Scope::RidesRead])
		.await
		.expect("Client credentials grant should succeed.");
	let token = &issued.data;

	assert_eq!(token.access_token.expose(), "app-token");
	assert_eq!(token.token_type, "Bearer");
	assert_eq!(token.expires_in, Duration::hours(1));
	assert_eq!(token.scopes, [Scope::Public, Scope::RidesRead]);
	assert!(!token.is_expired());
	assert_eq!(issued.metadata.request_id.as_deref(), Some("req-token-1"));
	assert_eq!(issued.metadata.rate_limit_remaining, Some(99));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn client_credentials_defaults_to_public_scope() {
	let server = MockServer::start_async().await;
	let client = build_oauth_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token")
				.json_body(json!({ "grant_type": "client_credentials", "scope": "public" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"app-token\",\"expires_in\":\"86400\",\"scope\":\"public\"}");
		})
		.await;
	let token = client
		.client_credentials(&[])
		.await
		.expect("Client credentials grant should succeed.")
		.data;

	assert_eq!(token.expires_in, Duration::days(1));
	assert_eq!(token.scopes, [Scope::Public]);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn client_credentials_rejection_is_a_status_error() {
	let server = MockServer::start_async().await;
	let client = build_oauth_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(401).header("content-type", "application/json").body(
				"{\"error\":\"invalid_client\",\"error_description\":\"Unknown client\"}",
			);
		})
		.await;
	let err = client
		.client_credentials(&[Scope::Public])
		.await
		.expect_err("Rejected credentials should fail.");
	let status = err.status().expect("Rejection should be a status error.");

	assert_eq!(status.status, StatusCode::UNAUTHORIZED);
	assert_eq!(status.reason.as_deref(), Some("invalid_client"));
	assert_eq!(status.description.as_deref(), Some("Unknown client"));
	assert!(!err.is_token_expired());

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn malformed_token_body_is_a_decode_error() {
	let server = MockServer::start_async().await;
	let client = build_oauth_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token_type\":\"Bearer\"}");
		})
		.await;
	let err = client.client_credentials(&[]).await.expect_err("Malformed body should fail.");

	assert!(matches!(err, Error::Decode(DecodeError::Json { .. })));

	mock.assert_calls_async(1).await;
}
