//! Three-legged flow: end-user consent, redirect handling, and code exchange.
//!
//! [`OAuthClient::start_authorization`] issues a random `state` together with the URL the user
//! is sent to. Lyft redirects back with `code` and `state` (or `error`) as query or form
//! parameters; [`AuthorizationRedirect`] reads them from the inbound request and
//! [`AuthorizationSession::complete`] checks the state before the code is exchanged with
//! [`OAuthClient::exchange_code`].

// crates.io
use rand::{Rng, distr::Alphanumeric};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{self, AuthorizationToken, Scope},
	endpoint::Endpoints,
	error::{AuthorizationError, ConfigError},
	flows::OAuthClient,
	http::{ApiResponse, HttpTransport},
	obs::{self, FlowKind},
};

const STATE_LEN: usize = 32;

/// Builds the authorization URL the end user is sent to.
///
/// Lyft expects the requested scopes in a space-joined `scopes` parameter.
pub fn authorization_url(
	endpoints: &Endpoints,
	client_id: &str,
	scopes: &[Scope],
	state: &str,
) -> Result<Url> {
	let mut url = endpoints.authorize_url().map_err(ConfigError::from)?;

	url.query_pairs_mut()
		.append_pair("client_id", client_id)
		.append_pair("response_type", "code")
		.append_pair("scopes", &auth::join_scopes(scopes))
		.append_pair("state", state);

	Ok(url)
}

/// Reads the authorization `code` from an inbound redirect request.
pub fn extract_authorization_code(request: &HttpRequest) -> Option<String> {
	AuthorizationRedirect::from_request(request).code
}

/// Pending three-legged authorization returned by [`OAuthClient::start_authorization`].
#[derive(Clone, Debug)]
pub struct AuthorizationSession {
	/// Requested scopes.
	pub scopes: Vec<Scope>,
	/// Opaque state value that must round-trip via the redirect.
	pub state: String,
	/// URL the end user should be sent to.
	pub authorize_url: Url,
}
impl AuthorizationSession {
	/// Validates the `state` returned with the redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(AuthorizationError::StateMismatch.into())
		}
	}

	/// Checks `redirect` against this session and returns the authorization code.
	pub fn complete(&self, redirect: AuthorizationRedirect) -> Result<String> {
		if let Some(error) = redirect.error {
			return Err(
				AuthorizationError::Denied { error, description: redirect.error_description }.into()
			);
		}

		self.validate_state(redirect.state.as_deref().unwrap_or_default())?;

		Ok(redirect.code.ok_or(AuthorizationError::MissingCode)?)
	}
}

/// Parameters Lyft sends back to the redirect URI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizationRedirect {
	/// Authorization code to exchange for tokens.
	pub code: Option<String>,
	/// State issued with the authorization URL.
	pub state: Option<String>,
	/// Error slug when the user declined or the request was invalid.
	pub error: Option<String>,
	/// Human-readable error explanation.
	pub error_description: Option<String>,
}
impl AuthorizationRedirect {
	/// Reads redirect parameters from a form-encoded body first, then from the query string.
	pub fn from_request(request: &HttpRequest) -> Self {
		let mut redirect = Self::default();
		let is_form = request
			.headers()
			.get(oauth2::http::header::CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

		if is_form {
			redirect.fill(request.body());
		}
		if let Some(query) = request.uri().query() {
			redirect.fill(query.as_bytes());
		}

		redirect
	}

	/// Reads redirect parameters from a raw query string such as `code=abc&state=xyz`.
	pub fn from_query(query: &str) -> Self {
		let mut redirect = Self::default();

		redirect.fill(query.trim_start_matches('?').as_bytes());

		redirect
	}

	/// Sets each field not yet set from `encoded`, keeping the first non-empty value.
	fn fill(&mut self, encoded: &[u8]) {
		for (key, value) in form_urlencoded::parse(encoded) {
			if value.is_empty() {
				continue;
			}

			let slot = match &*key {
				"code" => &mut self.code,
				"state" => &mut self.state,
				"error" => &mut self.error,
				"error_description" => &mut self.error_description,
				_ => continue,
			};

			if slot.is_none() {
				*slot = Some(value.into_owned());
			}
		}
	}
}

#[derive(Serialize)]
struct AuthorizationCodeRequest<'a> {
	grant_type: &'static str,
	code: &'a str,
}

impl<C> OAuthClient<C>
where
	C: HttpTransport,
{
	/// Builds the authorization URL for this application.
	pub fn authorization_url(&self, scopes: &[Scope], state: &str) -> Result<Url> {
		authorization_url(&self.endpoints, &self.client_id, scopes, state)
	}

	/// Starts a three-legged authorization with a freshly generated `state`.
	pub fn start_authorization(&self, scopes: &[Scope]) -> Result<AuthorizationSession> {
		let state = random_string(STATE_LEN);
		let authorize_url = self.authorization_url(scopes, &state)?;

		Ok(AuthorizationSession { scopes: scopes.to_vec(), state, authorize_url })
	}

	/// Exchanges an authorization code for a user token.
	pub async fn exchange_code(&self, code: &str) -> Result<ApiResponse<AuthorizationToken>> {
		obs::observe(FlowKind::AuthorizationCode, "exchange_code", async move {
			let body = AuthorizationCodeRequest { grant_type: "authorization_code", code };

			Ok(self.request_token(&body).await?.into_authorization_token()?)
		})
		.await
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn request(uri: &str, content_type: Option<&str>, body: &str) -> HttpRequest {
		let mut builder = oauth2::http::Request::builder().method(Method::POST).uri(uri);

		if let Some(content_type) = content_type {
			builder = builder.header("content-type", content_type);
		}

		builder.body(body.as_bytes().to_vec()).expect("Request fixture should build.")
	}

	#[test]
	fn authorization_url_carries_all_parameters() {
		let url = authorization_url(
			&Endpoints::default(),
			"client-1",
			&[Scope::Public, Scope::RidesRead],
			"st",
		)
		.expect("Authorization URL should build.");

		assert_eq!(
			url.as_str(),
			"https://api.lyft.com/oauth/authorize?client_id=client-1&response_type=code&scopes=public+rides.read&state=st"
		);
	}

	#[test]
	fn redirect_prefers_form_body_over_query() {
		let redirect = AuthorizationRedirect::from_request(&request(
			"https://app.example.com/callback?code=from-query&state=s1",
			Some("application/x-www-form-urlencoded; charset=utf-8"),
			"code=from-body",
		));

		assert_eq!(redirect.code.as_deref(), Some("from-body"));
		assert_eq!(redirect.state.as_deref(), Some("s1"));
	}

	#[test]
	fn redirect_ignores_body_without_form_content_type() {
		let req = request("https://app.example.com/callback?code=q", None, "code=b");

		assert_eq!(extract_authorization_code(&req).as_deref(), Some("q"));
		assert_eq!(
			extract_authorization_code(&request("https://app.example.com/callback", None, "")),
			None
		);
	}

	#[test]
	fn session_completes_only_with_matching_state() {
		let session = AuthorizationSession {
			scopes: vec![Scope::Public],
			state: "expected".into(),
			authorize_url: Url::parse("https://api.lyft.com/oauth/authorize")
				.expect("Fixture URL should parse."),
		};
		let code = session
			.complete(AuthorizationRedirect::from_query("?code=c-1&state=expected"))
			.expect("Matching state should complete.");

		assert_eq!(code, "c-1");
		assert!(matches!(
			session.complete(AuthorizationRedirect::from_query("code=c-1&state=other")),
			Err(Error::Authorization(AuthorizationError::StateMismatch))
		));
		assert!(matches!(
			session.complete(AuthorizationRedirect::from_query("state=expected")),
			Err(Error::Authorization(AuthorizationError::MissingCode))
		));
		assert!(matches!(
			session.complete(AuthorizationRedirect::from_query(
				"error=access_denied&error_description=User+declined"
			)),
			Err(Error::Authorization(AuthorizationError::Denied { ref error, .. }))
				if error == "access_denied"
		));
	}

	#[test]
	fn random_state_is_alphanumeric() {
		let state = random_string(STATE_LEN);

		assert_eq!(state.len(), STATE_LEN);
		assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
	}
}
