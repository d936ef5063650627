//! Classified representation of non-success API responses.
//!
//! A [`StatusError`] is built by consuming an [`HttpResponse`] by value: the body is moved into
//! the error exactly once and the response is gone afterwards, so neither this module nor the
//! caller can read it a second time. Everything the error exposes (reason, description, details,
//! classification predicates) is derived from the captured status, headers, and body bytes.
//!
//! The `reason` slug is resolved from the `error` response header first and from the body's
//! `error` field second, because the API surfaces it in either place depending on the endpoint.

mod ride;
pub use ride::*;

// crates.io
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	http::{self, ResponseMetadata},
	wire,
};

/// Reason slug the API uses for expired access tokens.
pub const TOKEN_EXPIRED: &str = "token_expired";

/// Non-success response from the API with its body captured.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusError {
	/// HTTP status code of the response.
	pub status: StatusCode,
	/// Machine-readable error slug, e.g. `token_expired` or `invalid_request`.
	pub reason: Option<String>,
	/// Human-readable error description from `error_description`.
	pub description: Option<String>,
	/// Structured per-field details from `error_detail`.
	pub details: Vec<BTreeMap<String, Value>>,
	/// Advisory metadata read from the response headers.
	pub metadata: ResponseMetadata,
	body: Vec<u8>,
}
impl StatusError {
	/// Builds a classified error by consuming `response`.
	///
	/// Bodies that are empty or not JSON still produce a valid error; only the fields derived
	/// from the body stay empty.
	pub fn from_response(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();
		let metadata = ResponseMetadata::from_parts(parts.status, &parts.headers);
		let json = serde_json::from_slice::<Value>(&body).ok();
		let json = json.as_ref().and_then(Value::as_object);
		let reason = http::header_str(&parts.headers, http::ERROR_HEADER)
			.map(ToOwned::to_owned)
			.or_else(|| json.and_then(|map| non_empty_str(map, "error")));
		let description = json.and_then(|map| non_empty_str(map, "error_description"));
		let details = json.map(error_details).unwrap_or_default();

		Self { status: parts.status, reason, description, details, metadata, body }
	}

	/// Raw response body as captured at construction.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Returns `true` when the provider signalled rate limiting (HTTP 429).
	pub fn is_rate_limit(&self) -> bool {
		self.status == StatusCode::TOO_MANY_REQUESTS
	}

	/// Returns `true` when the access token used for the call has expired.
	///
	/// The API signals expiry either as a bare 401 with an empty body or through the
	/// `token_expired` reason slug, so both are checked.
	pub fn is_token_expired(&self) -> bool {
		(self.status == StatusCode::UNAUTHORIZED && self.body.is_empty())
			|| self.reason.as_deref() == Some(TOKEN_EXPIRED)
	}

	/// Writes the `reason: description` message, or `fallback` when neither is present.
	fn render(&self, f: &mut Formatter, fallback: &str) -> FmtResult {
		match (self.reason.as_deref(), self.description.as_deref()) {
			(Some(reason), Some(description)) => write!(f, "{reason}: {description}"),
			(Some(message), None) | (None, Some(message)) => f.write_str(message),
			(None, None) => write!(f, "{fallback} with status {}.", self.status),
		}
	}
}
impl Display for StatusError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		self.render(f, "Lyft API request failed")
	}
}
impl StdError for StatusError {}

/// Decodes `response` as `T` when it carries `expected`, otherwise classifies it.
pub(crate) fn decode_success<T>(response: HttpResponse, expected: StatusCode) -> Result<T>
where
	T: DeserializeOwned,
{
	let response = expect_status(response, expected)?;

	Ok(wire::decode_json(response.body(), Some(expected.as_u16()))?)
}

/// Passes `response` through when it carries `expected`, otherwise classifies it.
pub(crate) fn expect_status(response: HttpResponse, expected: StatusCode) -> Result<HttpResponse> {
	if response.status() == expected {
		Ok(response)
	} else {
		Err(StatusError::from_response(response).into())
	}
}

fn non_empty_str(map: &Map<String, Value>, key: &str) -> Option<String> {
	map.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).map(Into::into)
}

fn error_details(map: &Map<String, Value>) -> Vec<BTreeMap<String, Value>> {
	match map.get("error_detail") {
		Some(Value::Array(items)) => items
			.iter()
			.filter_map(Value::as_object)
			.map(|item| item.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
			.collect(),
		Some(Value::Object(item)) =>
			vec![item.iter().map(|(k, v)| (k.clone(), v.clone())).collect()],
		_ => Vec::new(),
	}
}
