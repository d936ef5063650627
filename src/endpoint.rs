//! Base URLs for the API and OAuth endpoints.
//!
//! Endpoints are owned by each client instance, so tests and sandboxes can point one client at
//! a mock server without affecting any other.

// std
use std::net::IpAddr;
// self
use crate::_prelude::*;

/// Default base URL for Lyft's v1 API.
pub const DEFAULT_API_BASE: &str = "https://api.lyft.com/v1";
/// Default base URL for Lyft's OAuth endpoints.
pub const DEFAULT_OAUTH_BASE: &str = "https://api.lyft.com";
/// Path of the token issuance endpoint under the OAuth base.
pub const TOKEN_PATH: &str = "oauth/token";
/// Path of the refresh-token revocation endpoint under the OAuth base.
pub const REVOKE_PATH: &str = "oauth/revoke_refresh_token";
/// Path of the end-user authorization endpoint under the OAuth base.
pub const AUTHORIZE_PATH: &str = "oauth/authorize";

/// Errors raised while validating or joining endpoint URLs.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum EndpointError {
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Endpoint URL could not be parsed.
	#[error("The {endpoint} endpoint is not a valid URL: {url}.")]
	InvalidUrl {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Offending URL string.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Validated API and OAuth base URLs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
	api: String,
	oauth: String,
}
impl Endpoints {
	/// Starts a builder seeded with Lyft's production endpoints.
	pub fn builder() -> EndpointsBuilder {
		EndpointsBuilder::default()
	}

	/// Base URL used for API calls, without a trailing slash.
	pub fn api_base(&self) -> &str {
		&self.api
	}

	/// Base URL used for OAuth calls, without a trailing slash.
	pub fn oauth_base(&self) -> &str {
		&self.oauth
	}

	/// Resolves `path` (e.g. `rides/123/cancel`) against the API base.
	pub fn api_url(&self, path: &str) -> Result<Url, EndpointError> {
		join("api", &self.api, path)
	}

	/// Token issuance endpoint.
	pub fn token_url(&self) -> Result<Url, EndpointError> {
		join("token", &self.oauth, TOKEN_PATH)
	}

	/// Refresh-token revocation endpoint.
	pub fn revoke_url(&self) -> Result<Url, EndpointError> {
		join("revocation", &self.oauth, REVOKE_PATH)
	}

	/// End-user authorization endpoint.
	pub fn authorize_url(&self) -> Result<Url, EndpointError> {
		join("authorization", &self.oauth, AUTHORIZE_PATH)
	}
}
impl Default for Endpoints {
	fn default() -> Self {
		Self { api: DEFAULT_API_BASE.into(), oauth: DEFAULT_OAUTH_BASE.into() }
	}
}

/// Builder for [`Endpoints`] values.
#[derive(Clone, Debug, Default)]
pub struct EndpointsBuilder {
	/// API base override.
	pub api: Option<String>,
	/// OAuth base override.
	pub oauth: Option<String>,
}
impl EndpointsBuilder {
	/// Overrides the API base URL.
	pub fn api_base(mut self, url: impl Into<String>) -> Self {
		self.api = Some(url.into());

		self
	}

	/// Overrides the OAuth base URL.
	pub fn oauth_base(mut self, url: impl Into<String>) -> Self {
		self.oauth = Some(url.into());

		self
	}

	/// Points both bases at the same host, the way mock servers expose them.
	pub fn base(self, url: impl Into<String>) -> Self {
		let url = url.into();

		self.api_base(url.clone()).oauth_base(url)
	}

	/// Consumes the builder and validates both bases.
	pub fn build(self) -> Result<Endpoints, EndpointError> {
		let api = self.api.unwrap_or_else(|| DEFAULT_API_BASE.into());
		let oauth = self.oauth.unwrap_or_else(|| DEFAULT_OAUTH_BASE.into());

		Ok(Endpoints { api: validate_base("api", api)?, oauth: validate_base("oauth", oauth)? })
	}
}

fn validate_base(endpoint: &'static str, raw: String) -> Result<String, EndpointError> {
	let trimmed = raw.trim_end_matches('/');
	let url = Url::parse(trimmed).map_err(|source| EndpointError::InvalidUrl {
		endpoint,
		url: raw.clone(),
		source,
	})?;

	if url.scheme() != "https" && !(url.scheme() == "http" && is_loopback(&url)) {
		return Err(EndpointError::InsecureEndpoint { endpoint, url: raw });
	}

	Ok(trimmed.to_owned())
}

fn is_loopback(url: &Url) -> bool {
	match url.host_str() {
		Some("localhost") => true,
		Some(host) => host
			.trim_start_matches('[')
			.trim_end_matches(']')
			.parse::<IpAddr>()
			.is_ok_and(|ip| ip.is_loopback()),
		None => false,
	}
}

fn join(endpoint: &'static str, base: &str, path: &str) -> Result<Url, EndpointError> {
	let raw = format!("{base}/{}", path.trim_start_matches('/'));

	Url::parse(&raw).map_err(|source| EndpointError::InvalidUrl { endpoint, url: raw, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_point_at_lyft() {
		let endpoints = Endpoints::default();

		assert_eq!(
			endpoints.api_url("rides").expect("API URL should join.").as_str(),
			"https://api.lyft.com/v1/rides"
		);
		assert_eq!(
			endpoints.token_url().expect("Token URL should join.").as_str(),
			"https://api.lyft.com/oauth/token"
		);
		assert_eq!(
			endpoints.revoke_url().expect("Revoke URL should join.").as_str(),
			"https://api.lyft.com/oauth/revoke_refresh_token"
		);
		assert_eq!(
			endpoints.authorize_url().expect("Authorize URL should join.").as_str(),
			"https://api.lyft.com/oauth/authorize"
		);
	}

	#[test]
	fn overrides_drop_trailing_slashes() {
		let endpoints = Endpoints::builder()
			.api_base("https://sandbox.example.com/v1/")
			.build()
			.expect("HTTPS override should validate.");

		assert_eq!(endpoints.api_base(), "https://sandbox.example.com/v1");
		assert_eq!(endpoints.oauth_base(), DEFAULT_OAUTH_BASE);
		assert_eq!(
			endpoints.api_url("/rides/r-1/cancel").expect("API URL should join.").as_str(),
			"https://sandbox.example.com/v1/rides/r-1/cancel"
		);
	}

	#[test]
	fn plain_http_only_allowed_for_loopback() {
		for base in ["http://127.0.0.1:8080", "http://localhost:9000", "http://[::1]:7000"] {
			Endpoints::builder().base(base).build().expect("Loopback HTTP should be accepted.");
		}

		let err = Endpoints::builder()
			.oauth_base("http://api.example.com")
			.build()
			.expect_err("Remote HTTP should be rejected.");

		assert!(matches!(err, EndpointError::InsecureEndpoint { endpoint: "oauth", .. }));

		let err = Endpoints::builder()
			.api_base("not a url")
			.build()
			.expect_err("Garbage should be rejected.");

		assert!(matches!(err, EndpointError::InvalidUrl { endpoint: "api", .. }));
	}
}
