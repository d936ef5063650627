//! Transport primitives for Lyft API calls.
//!
//! The module exposes [`HttpTransport`], the crate's only dependency on an HTTP stack, plus
//! [`ResponseMetadata`], a lenient view over the advisory response headers the API returns
//! (`Request-ID`, rate-limit counters, `Retry-After`). Requests and responses use the
//! `http` types re-exported by `oauth2` with fully buffered bodies, so a response body is
//! an owned value that moves into whichever decoder or error constructor consumes it.

// crates.io
use oauth2::HttpClientError;
use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;

/// Header carrying the provider's error slug on failed responses.
pub const ERROR_HEADER: &str = "error";
/// Header carrying the provider-assigned request identifier.
pub const REQUEST_ID_HEADER: &str = "request-id";
/// Header carrying the number of requests left in the current window.
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Header carrying the size of the current rate-limit window.
pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, HttpClientError<E>>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing fully buffered requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared
/// (behind `Arc<T>`) by the dispatcher and the OAuth flows, and the futures they return
/// must be `Send` so callers can drive them on any executor. Timeouts and cancellation are
/// the transport's concern; the crate never wraps a call in its own timer.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Executes `request` and buffers the full response body.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// Advisory metadata read from response headers.
///
/// Every field is parsed leniently: a missing header or a value that fails to parse
/// simply yields `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the API.
	pub status: Option<u16>,
	/// Value of the `Request-ID` header.
	pub request_id: Option<String>,
	/// Value of the `X-Ratelimit-Remaining` header.
	pub rate_limit_remaining: Option<u64>,
	/// Value of the `X-Ratelimit-Limit` header.
	pub rate_limit_limit: Option<u64>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}
impl ResponseMetadata {
	/// Reads the metadata carried by `response`.
	pub fn from_response(response: &HttpResponse) -> Self {
		Self::from_parts(response.status(), response.headers())
	}

	/// Reads the metadata from a status code and header map.
	pub fn from_parts(status: StatusCode, headers: &HeaderMap) -> Self {
		Self {
			status: Some(status.as_u16()),
			request_id: header_str(headers, REQUEST_ID_HEADER).map(ToOwned::to_owned),
			rate_limit_remaining: header_u64(headers, RATE_LIMIT_REMAINING_HEADER),
			rate_limit_limit: header_u64(headers, RATE_LIMIT_LIMIT_HEADER),
			retry_after: parse_retry_after(headers),
		}
	}
}

/// Decoded success payload plus the advisory headers that came with it.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse<T> {
	/// Decoded body.
	pub data: T,
	/// Request-ID and rate-limit headers.
	pub metadata: ResponseMetadata,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Returns a header value as trimmed UTF-8, or `None` when absent, empty, or not text.
pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	let value = headers.get(name)?.to_str().ok()?.trim();

	if value.is_empty() { None } else { Some(value) }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
	header_str(headers, name)?.parse().ok()
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = header_str(headers, "retry-after")?;

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).ok()?));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
		let mut map = HeaderMap::new();

		for (name, value) in pairs {
			map.insert(*name, HeaderValue::from_static(*value));
		}

		map
	}

	#[test]
	fn metadata_reads_advisory_headers() {
		let map = headers(&[
			("request-id", "req-42"),
			("x-ratelimit-remaining", "17"),
			("x-ratelimit-limit", "100"),
			("retry-after", "30"),
		]);
		let meta = ResponseMetadata::from_parts(StatusCode::TOO_MANY_REQUESTS, &map);

		assert_eq!(meta.status, Some(429));
		assert_eq!(meta.request_id.as_deref(), Some("req-42"));
		assert_eq!(meta.rate_limit_remaining, Some(17));
		assert_eq!(meta.rate_limit_limit, Some(100));
		assert_eq!(meta.retry_after, Some(Duration::seconds(30)));
	}

	#[test]
	fn metadata_ignores_missing_or_malformed_values() {
		let map = headers(&[("x-ratelimit-remaining", "plenty"), ("request-id", "  ")]);
		let meta = ResponseMetadata::from_parts(StatusCode::OK, &map);

		assert_eq!(meta.request_id, None);
		assert_eq!(meta.rate_limit_remaining, None);
		assert_eq!(meta.rate_limit_limit, None);
		assert_eq!(meta.retry_after, None);
	}

	#[test]
	fn retry_after_in_the_past_is_ignored() {
		let map = headers(&[("retry-after", "Wed, 21 Oct 2015 07:28:00 +0000")]);

		assert_eq!(parse_retry_after(&map), None);
	}
}
