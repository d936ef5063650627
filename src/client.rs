//! Authenticated request dispatch against the Lyft API.
//!
//! [`Client`] owns the transport, the per-instance [`Endpoints`], a [`CredentialSet`] of access
//! tokens, and extra headers merged into every request. Endpoint wrappers build a request with
//! [`Client::json_request`] or [`Client::empty_request`], hand it to [`Client::send`], and decode
//! the raw response themselves; non-success responses are turned into classified errors by the
//! wrapper, not by the dispatcher.
//!
//! # Credential fallback
//!
//! With several tokens configured (e.g. one per account) and
//! [`CredentialFallback::Sequential`], a request is tried with each token in insertion order
//! until one produces a non-401 response. Trials never overlap. When every token is rejected the
//! last 401 response is returned. A transport failure stops the sequence immediately since it
//! says nothing about the credential. [`Client::dispatch`] reports every trial so callers can
//! see which credential answered.
//!
//! # Concurrency
//!
//! Sending takes `&self`, so a client can be shared between tasks. Mutating credentials or
//! headers takes `&mut self`, which rules out mutation while a send borrows the client.

pub mod credentials;

pub use credentials::*;

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	endpoint::Endpoints,
	error::{ConfigError, TransportError},
	http::HttpTransport,
	obs::{self, FlowKind},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Client specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestApiClient = Client<ReqwestHttpClient>;

/// One credential tried during a dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CredentialTrial {
	/// Position of the credential in the [`CredentialSet`].
	pub index: usize,
	/// Status code the API answered with.
	pub status: StatusCode,
}

/// Response returned by [`Client::dispatch`] together with the credentials that were tried.
#[derive(Debug)]
pub struct Dispatch {
	/// Raw response; the caller owns and decodes its body.
	pub response: HttpResponse,
	/// Credentials tried, in order. The last entry produced `response`.
	pub trials: Vec<CredentialTrial>,
}

/// Dispatcher that authorizes and sends requests to the Lyft API.
pub struct Client<C>
where
	C: HttpTransport,
{
	http_client: Arc<C>,
	endpoints: Endpoints,
	credentials: CredentialSet,
	headers: HeaderMap,
	fallback: CredentialFallback,
}
impl<C> Client<C>
where
	C: HttpTransport,
{
	/// Creates a client without credentials on top of the provided transport.
	pub fn with_http_client(http_client: impl Into<Arc<C>>) -> Self {
		Self {
			http_client: http_client.into(),
			endpoints: Endpoints::default(),
			credentials: CredentialSet::default(),
			headers: HeaderMap::new(),
			fallback: CredentialFallback::default(),
		}
	}

	/// Replaces the endpoints used to resolve request paths.
	pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Adds an access token to the credential set.
	pub fn with_token(mut self, token: impl Into<TokenSecret>) -> Self {
		self.credentials.insert(token);

		self
	}

	/// Adds an extra header sent with every request.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.append(name, value);

		self
	}

	/// Overrides the credential fallback policy.
	pub fn with_fallback(mut self, fallback: CredentialFallback) -> Self {
		self.fallback = fallback;

		self
	}

	/// Adds `token` unless already held; returns whether it was inserted.
	pub fn add_token(&mut self, token: impl Into<TokenSecret>) -> bool {
		self.credentials.insert(token)
	}

	/// Removes `token` when held; returns whether it was removed.
	pub fn remove_token(&mut self, token: &str) -> bool {
		self.credentials.remove(token)
	}

	/// Credentials in trial order.
	pub fn credentials(&self) -> &CredentialSet {
		&self.credentials
	}

	/// Extra headers merged into every request.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Mutable access to the extra headers.
	pub fn headers_mut(&mut self) -> &mut HeaderMap {
		&mut self.headers
	}

	/// Endpoints used by this client.
	pub fn endpoints(&self) -> &Endpoints {
		&self.endpoints
	}

	/// Active credential fallback policy.
	pub fn fallback(&self) -> CredentialFallback {
		self.fallback
	}

	/// Shared transport handle.
	pub fn http_client(&self) -> &Arc<C> {
		&self.http_client
	}

	/// Resolves `path` against the API base URL.
	pub fn endpoint_url(&self, path: &str) -> Result<Url> {
		Ok(self.endpoints.api_url(path).map_err(ConfigError::from)?)
	}

	/// Resolves `segments` against the API base URL, percent-encoding each one.
	///
	/// A segment containing `/`, `?`, or `#` stays a single path segment.
	pub fn segments_url(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.endpoint_url("")?;

		url.path_segments_mut()
			.map_err(|_| ConfigError::OpaqueBase { url: self.endpoints.api_base().into() })?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}

	/// Builds a request carrying `body` as JSON.
	pub fn json_request<T>(&self, method: Method, path: &str, body: &T) -> Result<HttpRequest>
	where
		T: ?Sized + Serialize,
	{
		self.json_request_to(method, self.endpoint_url(path)?, body)
	}

	/// Builds a request carrying `body` as JSON to an already resolved `url`.
	pub fn json_request_to<T>(&self, method: Method, url: Url, body: &T) -> Result<HttpRequest>
	where
		T: ?Sized + Serialize,
	{
		let payload = serde_json::to_vec(body).map_err(ConfigError::from)?;
		let request = oauth2::http::Request::builder()
			.method(method)
			.uri(url.as_str())
			.header(oauth2::http::header::CONTENT_TYPE, "application/json")
			.header(oauth2::http::header::ACCEPT, "application/json")
			.body(payload)
			.map_err(ConfigError::from)?;

		Ok(request)
	}

	/// Builds a request without a body.
	pub fn empty_request(&self, method: Method, path: &str) -> Result<HttpRequest> {
		self.empty_request_to(method, self.endpoint_url(path)?)
	}

	/// Builds a request without a body to an already resolved `url`.
	pub fn empty_request_to(&self, method: Method, url: Url) -> Result<HttpRequest> {
		let request = oauth2::http::Request::builder()
			.method(method)
			.uri(url.as_str())
			.header(oauth2::http::header::ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(ConfigError::from)?;

		Ok(request)
	}

	/// Attaches `Authorization: Bearer <token>` using the primary credential.
	pub fn authorize(&self, request: &mut HttpRequest) -> Result<()> {
		let token = self.credentials.primary().ok_or(ConfigError::MissingCredentials)?;

		self.authorize_with(request, token)
	}

	/// Attaches `Authorization: Bearer <token>` using `token`, replacing any existing value.
	pub fn authorize_with(&self, request: &mut HttpRequest, token: &TokenSecret) -> Result<()> {
		request.headers_mut().insert(oauth2::http::header::AUTHORIZATION, token.bearer_header()?);

		Ok(())
	}

	/// Merges extra headers, authorizes, and sends `request`.
	///
	/// Returns the raw response whatever its status; only transport failures and local
	/// misconfiguration are errors here.
	pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
		Ok(self.dispatch(request).await?.response)
	}

	/// Same as [`send`](Self::send) but also reports every credential tried.
	pub async fn dispatch(&self, mut request: HttpRequest) -> Result<Dispatch> {
		obs::observe(FlowKind::Dispatch, "dispatch", async move {
			self.merge_headers(&mut request);

			let candidates = self.credentials.candidates(self.fallback);
			let mut trials = Vec::with_capacity(candidates.len());
			let mut rejected = None;

			for (index, token) in candidates.iter().enumerate() {
				let mut attempt = clone_request(&request);

				self.authorize_with(&mut attempt, token)?;

				let response =
					self.http_client.execute(attempt).await.map_err(TransportError::classify)?;
				let status = response.status();

				trials.push(CredentialTrial { index, status });
				obs::record_credential_trial(index, candidates.len(), status);
				obs::record_credential_trial_metric(status != StatusCode::UNAUTHORIZED);

				if status != StatusCode::UNAUTHORIZED {
					return Ok(Dispatch { response, trials });
				}

				rejected = Some(response);
			}

			match rejected {
				Some(response) => Ok(Dispatch { response, trials }),
				None => Err(ConfigError::MissingCredentials.into()),
			}
		})
		.await
	}

	/// Adds extra headers whose names the request does not already carry.
	fn merge_headers(&self, request: &mut HttpRequest) {
		for name in self.headers.keys() {
			if request.headers().contains_key(name) {
				continue;
			}

			for value in self.headers.get_all(name) {
				request.headers_mut().append(name.clone(), value.clone());
			}
		}
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestHttpClient> {
	/// Creates a client authorized with `token` on the default reqwest transport.
	pub fn new(token: impl Into<TokenSecret>) -> Self {
		Self::with_http_client(ReqwestHttpClient::default()).with_token(token)
	}
}
impl<C> Clone for Client<C>
where
	C: HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			endpoints: self.endpoints.clone(),
			credentials: self.credentials.clone(),
			headers: self.headers.clone(),
			fallback: self.fallback,
		}
	}
}
impl<C> Debug for Client<C>
where
	C: HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("endpoints", &self.endpoints)
			.field("credentials", &self.credentials.len())
			.field("headers", &self.headers.keys().collect::<Vec<_>>())
			.field("fallback", &self.fallback)
			.finish()
	}
}

fn clone_request(request: &HttpRequest) -> HttpRequest {
	let mut copy = HttpRequest::new(request.body().clone());

	*copy.method_mut() = request.method().clone();
	*copy.uri_mut() = request.uri().clone();
	*copy.version_mut() = request.version();
	*copy.headers_mut() = request.headers().clone();

	copy
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	};
	// self
	use super::*;
	use crate::http::TransportFuture;

	#[derive(Debug, ThisError)]
	#[error("unreachable")]
	struct Unreachable;

	/// Answers 401 for every token listed in `rejected` and records what it saw.
	#[derive(Default)]
	struct ScriptedTransport {
		rejected: Vec<&'static str>,
		seen: Mutex<Vec<HeaderMap>>,
	}
	impl HttpTransport for ScriptedTransport {
		type TransportError = Unreachable;

		fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
			let authorization = request
				.headers()
				.get("authorization")
				.and_then(|value| value.to_str().ok())
				.unwrap_or_default()
				.to_owned();
			let status = if self.rejected.iter().any(|t| authorization == format!("Bearer {t}")) {
				StatusCode::UNAUTHORIZED
			} else {
				StatusCode::OK
			};

			self.seen.lock().expect("Seen lock should not be poisoned.").push(request.headers().clone());

			Box::pin(async move {
				let mut response = HttpResponse::new(Vec::new());

				*response.status_mut() = status;

				Ok(response)
			})
		}
	}

	fn client(rejected: Vec<&'static str>) -> Client<ScriptedTransport> {
		Client::with_http_client(ScriptedTransport { rejected, ..Default::default() })
			.with_endpoints(
				Endpoints::builder()
					.base("https://mock.lyft.test")
					.build()
					.expect("Endpoints should build."),
			)
	}

	fn seen_tokens(client: &Client<ScriptedTransport>) -> Vec<String> {
		client
			.http_client()
			.seen
			.lock()
			.expect("Seen lock should not be poisoned.")
			.iter()
			.filter_map(|headers| headers.get("authorization")?.to_str().ok().map(Into::into))
			.collect()
	}

	#[tokio::test]
	async fn fallback_tries_tokens_in_insertion_order() {
		let client = client(vec!["a"]).with_token("a").with_token("b");
		let request = client.empty_request(Method::GET, "profile").expect("Request should build.");
		let dispatch = client.dispatch(request).await.expect("Dispatch should succeed.");

		assert_eq!(dispatch.response.status(), StatusCode::OK);
		assert_eq!(
			dispatch.trials,
			[
				CredentialTrial { index: 0, status: StatusCode::UNAUTHORIZED },
				CredentialTrial { index: 1, status: StatusCode::OK },
			]
		);
		assert_eq!(seen_tokens(&client), ["Bearer a", "Bearer b"]);
	}

	#[tokio::test]
	async fn exhausted_credentials_return_last_rejection() {
		let client = client(vec!["a", "b"]).with_token("a").with_token("b");
		let request = client.empty_request(Method::GET, "profile").expect("Request should build.");
		let dispatch = client.dispatch(request).await.expect("Dispatch should succeed.");

		assert_eq!(dispatch.response.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(dispatch.trials.len(), 2);
	}

	#[tokio::test]
	async fn primary_only_stops_after_first_token() {
		let client = client(vec!["a"])
			.with_token("a")
			.with_token("b")
			.with_fallback(CredentialFallback::PrimaryOnly);
		let request = client.empty_request(Method::GET, "profile").expect("Request should build.");
		let response = client.send(request).await.expect("Send should succeed.");

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(seen_tokens(&client), ["Bearer a"]);
	}

	#[tokio::test]
	async fn empty_credential_set_is_a_config_error() {
		let client = client(Vec::new());
		let request = client.empty_request(Method::GET, "profile").expect("Request should build.");
		let err = client.send(request).await.expect_err("Send without tokens should fail.");

		assert!(matches!(err, Error::Config(ConfigError::MissingCredentials)));
	}

	#[tokio::test]
	async fn extra_headers_never_overwrite_request_headers() {
		let client = client(Vec::new())
			.with_token("a")
			.with_header(HeaderName::from_static("accept"), HeaderValue::from_static("text/plain"))
			.with_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("one"))
			.with_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("two"));
		let request = client.empty_request(Method::GET, "profile").expect("Request should build.");

		client.send(request).await.expect("Send should succeed.");

		let seen = client.http_client().seen.lock().expect("Seen lock should not be poisoned.");
		let headers = &seen[0];

		assert_eq!(headers.get("accept"), Some(&HeaderValue::from_static("application/json")));
		assert_eq!(headers.get_all("x-trace").iter().count(), 2);
	}

	/// Fails every request at the transport level and counts the attempts.
	#[derive(Default)]
	struct FailingTransport {
		calls: AtomicUsize,
	}
	impl HttpTransport for FailingTransport {
		type TransportError = Unreachable;

		fn execute(&self, _request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			Box::pin(async {
				Err(oauth2::HttpClientError::Io(std::io::Error::new(
					std::io::ErrorKind::ConnectionRefused,
					"connection refused",
				)))
			})
		}
	}

	#[tokio::test]
	async fn transport_failure_stops_fallback() {
		let client = Client::with_http_client(FailingTransport::default())
			.with_token("a")
			.with_token("b");
		let request = client.empty_request(Method::GET, "profile").expect("Request should build.");
		let err = client.send(request).await.expect_err("Transport failure should surface.");

		assert!(err.is_transport());
		assert!(err.status().is_none());
		assert!(matches!(err, Error::Transport(TransportError::Io(_))));
		assert_eq!(client.http_client().calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn add_and_remove_are_idempotent() {
		let mut client = client(Vec::new());

		assert!(client.add_token("a"));
		assert!(!client.add_token("a"));
		assert!(!client.remove_token("b"));
		assert_eq!(client.credentials().len(), 1);
		assert!(client.remove_token("a"));
		assert!(client.credentials().is_empty());
	}

	#[test]
	fn authorize_uses_primary_and_replaces_existing_header() {
		let client = client(Vec::new()).with_token("first").with_token("second");
		let mut request = client
			.json_request(Method::POST, "rides", &serde_json::json!({}))
			.expect("Request should build.");

		request.headers_mut().insert("authorization", HeaderValue::from_static("Bearer stale"));
		client.authorize(&mut request).expect("Authorize should succeed.");

		assert_eq!(
			request.headers().get("authorization").and_then(|v| v.to_str().ok()),
			Some("Bearer first")
		);
		assert_eq!(request.uri(), "https://mock.lyft.test/rides");
	}

	#[test]
	fn segments_are_encoded_as_single_path_segments() {
		let client = client(Vec::new());
		let url = client
			.segments_url(&["rides", "../profile?x=1#y", "cancel"])
			.expect("Segment URL should build.");

		assert_eq!(url.as_str(), "https://mock.lyft.test/rides/..%2Fprofile%3Fx=1%23y/cancel");

		let nested = Client::with_http_client(ScriptedTransport::default())
			.with_endpoints(
				Endpoints::builder()
					.base("https://mock.lyft.test/v1")
					.build()
					.expect("Endpoints should build."),
			)
			.segments_url(&["rides", "r-1", "cancel"])
			.expect("Segment URL should build.");

		assert_eq!(nested.as_str(), "https://mock.lyft.test/v1/rides/r-1/cancel");
	}
}
