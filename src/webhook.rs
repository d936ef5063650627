//! Verification and decoding of inbound Lyft webhooks.
//!
//! Lyft signs each webhook body with HMAC-SHA256 keyed by the application's verification token
//! and sends `X-Lyft-Signature: sha256=<base64 digest>`. Verification always runs on the raw
//! body bytes, before any JSON parsing, and compares digests in constant time.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use serde::{Deserializer, Serializer, de::DeserializeOwned};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;
// self
use crate::{_prelude::*, auth::TokenSecret, error::DecodeError, http, wire};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-lyft-signature";
/// Algorithm prefix in front of the base64 digest.
pub const SIGNATURE_PREFIX: &str = "sha256=";
/// Prefix of event identifiers sent by the sandbox.
pub const SANDBOX_EVENT_PREFIX: &str = "sandboxevent";

/// Failures verifying an inbound webhook.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum WebhookError {
	/// The signature header is absent or lacks the `sha256=` prefix.
	#[error("Webhook request carries no `sha256=` signature header.")]
	MissingSignature,
	/// The signature does not match the body.
	#[error("Webhook signature does not match the request body.")]
	SignatureMismatch,
}

/// Computes the base64 HMAC-SHA256 digest Lyft sends for `body`, without the prefix.
///
/// Returns `None` only when the key is rejected by the MAC.
pub fn compute_signature(body: &[u8], verification_token: &[u8]) -> Option<String> {
	let mut mac = HmacSha256::new_from_slice(verification_token).ok()?;

	mac.update(body);

	Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Returns `true` iff `signature` is exactly the base64 HMAC-SHA256 of `body` under
/// `verification_token`.
///
/// The comparison runs in constant time and is byte-exact: padded or malformed signatures
/// compare unequal.
pub fn verify_signature(body: &[u8], signature: &str, verification_token: &[u8]) -> bool {
	match compute_signature(body, verification_token) {
		Some(expected) => expected.as_bytes().ct_eq(signature.as_bytes()).into(),
		None => false,
	}
}

/// Reads the signature header and strips the `sha256=` prefix.
pub fn extract_signature_header(headers: &HeaderMap) -> Option<&str> {
	http::header_str(headers, SIGNATURE_HEADER)?.strip_prefix(SIGNATURE_PREFIX)
}

/// Decodes a webhook envelope; `T` is the shape of the inner `event` payload.
pub fn decode_event<T>(body: &[u8]) -> Result<WebhookEvent<T>, DecodeError>
where
	T: DeserializeOwned,
{
	wire::decode_json::<WireWebhookEvent<T>>(body, None)?.try_into()
}

/// Verifier bound to one application's verification token.
#[derive(Clone, Debug)]
pub struct WebhookVerifier {
	verification_token: TokenSecret,
}
impl WebhookVerifier {
	/// Creates a verifier for `verification_token`.
	pub fn new(verification_token: impl Into<TokenSecret>) -> Self {
		Self { verification_token: verification_token.into() }
	}

	/// Checks the signature header of an inbound request against `body`.
	pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookError> {
		let signature = extract_signature_header(headers).ok_or(WebhookError::MissingSignature)?;

		if verify_signature(body, signature, self.verification_token.expose().as_bytes()) {
			Ok(())
		} else {
			Err(WebhookError::SignatureMismatch)
		}
	}

	/// Verifies an inbound request and decodes its envelope.
	pub fn verify_event<T>(&self, headers: &HeaderMap, body: &[u8]) -> Result<WebhookEvent<T>>
	where
		T: DeserializeOwned,
	{
		self.verify(headers, body)?;

		Ok(decode_event(body)?)
	}
}

/// Kind of webhook event.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
	/// A ride changed status.
	RideStatusUpdated,
	/// A ride receipt is available.
	ReceiptReady,
	/// Event type the crate has no dedicated variant for.
	Other(String),
}
impl EventType {
	/// Wire representation of the event type.
	pub fn as_str(&self) -> &str {
		match self {
			Self::RideStatusUpdated => "ride.status.updated",
			Self::ReceiptReady => "ride.receipt.ready",
			Self::Other(raw) => raw,
		}
	}
}
impl From<&str> for EventType {
	fn from(raw: &str) -> Self {
		match raw {
			"ride.status.updated" => Self::RideStatusUpdated,
			"ride.receipt.ready" => Self::ReceiptReady,
			other => Self::Other(other.into()),
		}
	}
}
impl Display for EventType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl Serialize for EventType {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}
impl<'de> Deserialize<'de> for EventType {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(String::deserialize(deserializer)?.as_str().into())
	}
}

/// Webhook envelope.
#[derive(Clone, Debug, PartialEq)]
pub struct WebhookEvent<T = Value> {
	/// Unique event identifier.
	pub event_id: String,
	/// API URL of the resource the event refers to.
	pub href: String,
	/// When the event happened.
	pub occurred_at: OffsetDateTime,
	/// Kind of event.
	pub event_type: EventType,
	/// Domain payload, e.g. the ride the event refers to.
	pub event: T,
}
impl<T> WebhookEvent<T> {
	/// Returns `true` for events emitted by the sandbox.
	pub fn is_sandbox(&self) -> bool {
		self.event_id.starts_with(SANDBOX_EVENT_PREFIX)
	}
}

#[derive(Deserialize)]
struct WireWebhookEvent<T> {
	event_id: String,
	#[serde(default)]
	href: String,
	occurred_at: String,
	event_type: EventType,
	event: T,
}
impl<T> TryFrom<WireWebhookEvent<T>> for WebhookEvent<T> {
	type Error = DecodeError;

	fn try_from(raw: WireWebhookEvent<T>) -> Result<Self, Self::Error> {
		Ok(Self {
			occurred_at: wire::parse_timestamp("occurred_at", &raw.occurred_at)?,
			event_id: raw.event_id,
			href: raw.href,
			event_type: raw.event_type,
			event: raw.event,
		})
	}
}
