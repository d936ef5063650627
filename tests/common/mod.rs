//! Shared fixtures for the integration tests.

#![allow(dead_code)]

// crates.io
use httpmock::MockServer;
// self
use lyft_client::{
	client::Client,
	endpoint::Endpoints,
	flows::OAuthClient,
	http::ReqwestHttpClient,
	reqwest::Client as ReqwestClient,
};

pub const CLIENT_ID: &str = "lyft-client-id";
pub const CLIENT_SECRET: &str = "lyft-client-secret";

/// Builds a reqwest transport that accepts the mock server's self-signed certificate.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Points both API and OAuth bases at `server`, with the API under `/v1`.
pub fn mock_endpoints(server: &MockServer) -> Endpoints {
	Endpoints::builder()
		.api_base(server.url("/v1"))
		.oauth_base(server.base_url())
		.build()
		.expect("Mock endpoints should build successfully.")
}

/// Builds an API client holding `tokens` in order.
pub fn build_api_client(server: &MockServer, tokens: &[&str]) -> Client<ReqwestHttpClient> {
	let mut client =
		Client::with_http_client(test_reqwest_http_client()).with_endpoints(mock_endpoints(server));

	for token in tokens {
		client.add_token(*token);
	}

	client
}

/// Builds an OAuth client with the shared test credentials.
pub fn build_oauth_client(server: &MockServer) -> OAuthClient<ReqwestHttpClient> {
	OAuthClient::with_http_client(CLIENT_ID, CLIENT_SECRET, test_reqwest_http_client())
		.with_endpoints(mock_endpoints(server))
}

/// Expected HTTP Basic header for the shared test credentials.
pub fn basic_header() -> String {
	// base64("lyft-client-id:lyft-client-secret")
	"Basic bHlmdC1jbGllbnQtaWQ6bHlmdC1jbGllbnQtc2VjcmV0".into()
}
