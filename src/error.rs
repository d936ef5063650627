//! Crate-level error types shared by the dispatcher, OAuth flows, and webhook helpers.
//!
//! Failures fall into disjoint kinds so callers can branch on them without string matching:
//! [`TransportError`] for network-level problems, [`StatusError`] (and its ride-specific
//! refinements) for non-success HTTP responses, [`DecodeError`] for success bodies that do not
//! match the expected shape, and [`ConfigError`] for local misuse.

// crates.io
use oauth2::HttpClientError;
// self
use crate::{
	_prelude::*,
	status::{CancelRideError, RideRequestError, StatusError},
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, IO).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Success response whose body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// The authorization redirect did not complete the three-legged flow.
	#[error(transparent)]
	Authorization(#[from] AuthorizationError),
	/// Inbound webhook failed signature verification.
	#[error(transparent)]
	Webhook(#[from] crate::webhook::WebhookError),

	/// The roundtrip succeeded but the status code signalled an application error.
	#[error(transparent)]
	Status(#[from] StatusError),
	/// Ride request rejected; may carry a cost/primetime confirmation token.
	#[error(transparent)]
	RideRequest(#[from] RideRequestError),
	/// Ride cancellation rejected; may carry a cancellation price and token.
	#[error(transparent)]
	CancelRide(#[from] CancelRideError),
}
impl Error {
	/// Returns the base [`StatusError`] for every status-derived variant.
	///
	/// Ride-specific variants refine the base error, so callers that only care about the
	/// status code, reason, or description can stay agnostic of the endpoint.
	pub fn status(&self) -> Option<&StatusError> {
		match self {
			Self::Status(err) => Some(err),
			Self::RideRequest(err) => Some(&err.base),
			Self::CancelRide(err) => Some(&err.base),
			_ => None,
		}
	}

	/// Returns `true` for network-level failures.
	pub fn is_transport(&self) -> bool {
		matches!(self, Self::Transport(_))
	}

	/// Returns `true` when the provider signalled rate limiting (HTTP 429).
	pub fn is_rate_limit(&self) -> bool {
		self.status().is_some_and(StatusError::is_rate_limit)
	}

	/// Returns `true` when the provider signalled an expired access token.
	pub fn is_token_expired(&self) -> bool {
		self.status().is_some_and(StatusError::is_token_expired)
	}
}

/// Configuration and request-construction failures raised locally.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Endpoint configuration is invalid.
	#[error(transparent)]
	Endpoint(#[from] crate::endpoint::EndpointError),
	/// The API base cannot carry path segments (e.g. a `data:` URL).
	#[error("API base `{url}` cannot carry path segments.")]
	OpaqueBase {
		/// Offending base URL.
		url: String,
	},
	/// A header value contains characters that HTTP does not allow.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeaderValue {
		/// Header name being populated.
		name: &'static str,
		/// Underlying validation failure.
		#[source]
		source: oauth2::http::header::InvalidHeaderValue,
	},
	/// Request payload could not be serialized.
	#[error("Request body could not be serialized.")]
	Serialize(#[from] serde_json::Error),
	/// The dispatcher holds no access token to authorize requests with.
	#[error("No access token is configured for this client.")]
	MissingCredentials,
	/// A refresh was requested for a token issued without a refresh token.
	#[error("Token carries no refresh token.")]
	MissingRefreshToken,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures completing the end-user authorization redirect.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum AuthorizationError {
	/// The returned `state` does not match the one issued with the authorization URL.
	#[error("Authorization state does not match the issued session.")]
	StateMismatch,
	/// The user or the provider refused the authorization request.
	#[error("Authorization was denied: {error}.")]
	Denied {
		/// Error slug carried by the redirect, e.g. `access_denied`.
		error: String,
		/// Optional human-readable explanation.
		description: Option<String>,
	},
	/// The redirect carried neither a code nor an error.
	#[error("Authorization redirect does not carry a code.")]
	MissingCode,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the Lyft API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the Lyft API.")]
	Io(#[from] std::io::Error),
	/// Transport reported a failure without a structured cause.
	#[error("HTTP client error occurred while calling the Lyft API: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Classifies an [`HttpClientError`] emitted by an [`HttpTransport`](crate::http::HttpTransport).
	///
	/// Request-construction failures surface as [`ConfigError`]; everything else stays a
	/// transport error with its source preserved.
	pub fn classify<E>(err: HttpClientError<E>) -> Error
	where
		E: 'static + Send + Sync + StdError,
	{
		match err {
			HttpClientError::Reqwest(inner) => Self::network(*inner).into(),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => Self::Io(inner).into(),
			HttpClientError::Other(message) => Self::Other { message }.into(),
			_ => Self::Other { message: "unrecognized transport failure".into() }.into(),
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failures decoding an otherwise successful response body.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body is not valid JSON for the expected shape.
	#[error("Response body does not match the expected JSON shape.")]
	Json {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the decoded response, when known.
		status: Option<u16>,
	},
	/// A timestamp field does not follow the provider's fixed layout.
	#[error("Field `{field}` holds a timestamp that does not match the expected layout: {value}.")]
	Timestamp {
		/// Wire field name.
		field: &'static str,
		/// Raw wire value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: time::error::Parse,
	},
	/// A duration field is negative or not a number of seconds.
	#[error("Field `{field}` does not hold a valid number of seconds.")]
	Duration {
		/// Wire field name.
		field: &'static str,
	},
}
