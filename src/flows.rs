//! Two- and three-legged OAuth flows against Lyft's token endpoints.
//!
//! Every token call is a JSON `POST` authenticated with HTTP Basic client credentials. A `200`
//! response is decoded into a token; any other status is handed, unread, to
//! [`StatusError::from_response`](crate::status::StatusError::from_response).

pub mod authorization_code;

mod client_credentials;
mod refresh;

pub use authorization_code::*;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	auth::{self, AuthorizationToken, Token, TokenSecret},
	endpoint::Endpoints,
	error::{ConfigError, DecodeError, TransportError},
	http::{ApiResponse, HttpTransport, ResponseMetadata},
	status,
	wire::WireSeconds,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// OAuth client specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestOAuthClient = OAuthClient<ReqwestHttpClient>;

/// Application credentials plus the transport used for token calls.
pub struct OAuthClient<C>
where
	C: HttpTransport,
{
	http_client: Arc<C>,
	endpoints: Endpoints,
	client_id: String,
	client_secret: TokenSecret,
}
impl<C> OAuthClient<C>
where
	C: HttpTransport,
{
	/// Creates an OAuth client that reuses the caller-provided transport.
	pub fn with_http_client(
		client_id: impl Into<String>,
		client_secret: impl Into<TokenSecret>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			endpoints: Endpoints::default(),
			client_id: client_id.into(),
			client_secret: client_secret.into(),
		}
	}

	/// Replaces the endpoints used for token and authorization URLs.
	pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Application client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Endpoints used by this client.
	pub fn endpoints(&self) -> &Endpoints {
		&self.endpoints
	}

	/// Posts `body` as JSON to `url` with Basic client authentication.
	async fn post_json<T>(&self, url: Url, body: &T) -> Result<HttpResponse>
	where
		T: ?Sized + Serialize,
	{
		let payload = serde_json::to_vec(body).map_err(ConfigError::from)?;
		let request = oauth2::http::Request::builder()
			.method(Method::POST)
			.uri(url.as_str())
			.header(oauth2::http::header::CONTENT_TYPE, "application/json")
			.header(oauth2::http::header::ACCEPT, "application/json")
			.header(oauth2::http::header::AUTHORIZATION, self.basic_auth()?)
			.body(payload)
			.map_err(ConfigError::from)?;

		self.http_client.execute(request).await.map_err(TransportError::classify)
	}

	/// Posts a token request and decodes the `200` response, keeping its headers.
	async fn request_token<T>(&self, body: &T) -> Result<IssuedToken>
	where
		T: ?Sized + Serialize,
	{
		let url = self.endpoints.token_url().map_err(ConfigError::from)?;
		let response = self.post_json(url, body).await?;
		let issued_at = OffsetDateTime::now_utc();
		let metadata = ResponseMetadata::from_response(&response);
		let token = status::decode_success(response, StatusCode::OK)?;

		Ok(IssuedToken { token, issued_at, metadata })
	}

	fn basic_auth(&self) -> Result<HeaderValue, ConfigError> {
		let credentials =
			STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret.expose()));
		let mut value = HeaderValue::try_from(format!("Basic {credentials}"))
			.map_err(|source| ConfigError::InvalidHeaderValue { name: "authorization", source })?;

		value.set_sensitive(true);

		Ok(value)
	}
}
#[cfg(feature = "reqwest")]
impl OAuthClient<ReqwestHttpClient> {
	/// Creates an OAuth client on the default reqwest transport.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<TokenSecret>) -> Self {
		Self::with_http_client(client_id, client_secret, ReqwestHttpClient::default())
	}
}
impl<C> Clone for OAuthClient<C>
where
	C: HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			endpoints: self.endpoints.clone(),
			client_id: self.client_id.clone(),
			client_secret: self.client_secret.clone(),
		}
	}
}
impl<C> Debug for OAuthClient<C>
where
	C: HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthClient")
			.field("endpoints", &self.endpoints)
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.finish()
	}
}

/// Decoded token response together with when and how it was issued.
struct IssuedToken {
	token: TokenResponse,
	issued_at: OffsetDateTime,
	metadata: ResponseMetadata,
}
impl IssuedToken {
	fn into_token(self) -> Result<ApiResponse<Token>, DecodeError> {
		Ok(ApiResponse { data: self.token.into_token(self.issued_at)?, metadata: self.metadata })
	}

	fn into_authorization_token(self) -> Result<ApiResponse<AuthorizationToken>, DecodeError> {
		Ok(ApiResponse {
			data: self.token.into_authorization_token(self.issued_at)?,
			metadata: self.metadata,
		})
	}
}

/// Token endpoint response as sent on the wire.
#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default = "default_token_type")]
	token_type: String,
	expires_in: WireSeconds,
	#[serde(default)]
	scope: Option<String>,
}
impl TokenResponse {
	fn into_token(self, issued_at: OffsetDateTime) -> Result<Token, DecodeError> {
		Ok(Token {
			expires_in: self.expires_in.require("expires_in")?,
			scopes: auth::parse_scopes(self.scope.as_deref().unwrap_or_default()),
			access_token: self.access_token.into(),
			token_type: self.token_type,
			issued_at,
		})
	}

	fn into_authorization_token(
		self,
		issued_at: OffsetDateTime,
	) -> Result<AuthorizationToken, DecodeError> {
		Ok(AuthorizationToken {
			expires_in: self.expires_in.require("expires_in")?,
			scopes: auth::parse_scopes(self.scope.as_deref().unwrap_or_default()),
			access_token: self.access_token.into(),
			refresh_token: self.refresh_token.filter(|token| !token.is_empty()).map(Into::into),
			token_type: self.token_type,
			issued_at,
		})
	}
}

fn default_token_type() -> String {
	"Bearer".into()
}
