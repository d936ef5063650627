//! Wire-format helpers shared by response decoders.
//!
//! Public types never deserialize straight from the wire when field shapes differ; private
//! wire structs use the helpers below and convert explicitly.

// crates.io
use serde::de::DeserializeOwned;
use time::{format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{_prelude::*, error::DecodeError};

/// Fixed `occurred_at`/`requested_at` layout, e.g. `2016-10-13T20:08:56+00:00`.
///
/// Fractional seconds after the seconds field are accepted when present.
pub(crate) const TIMESTAMP_LAYOUT: &[BorrowedFormatItem<'static>] = format_description!(
	"[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory]:[offset_minute]"
);

/// Seconds as the API sends them: integers, floats, or numeric strings depending on the
/// endpoint.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireSeconds {
	Integer(i64),
	Float(f64),
	Text(String),
}
impl WireSeconds {
	/// Normalizes to a whole-second duration, rounding fractions down.
	///
	/// Negative, non-finite, and non-numeric values yield `None`.
	pub(crate) fn to_duration(&self) -> Option<Duration> {
		match self {
			Self::Integer(secs) => whole_seconds(*secs),
			Self::Float(secs) => float_seconds(*secs),
			Self::Text(raw) => {
				let raw = raw.trim();

				match raw.parse::<i64>() {
					Ok(secs) => whole_seconds(secs),
					Err(_) => float_seconds(raw.parse().ok()?),
				}
			},
		}
	}

	/// Same as [`to_duration`](Self::to_duration) but reports the offending field.
	pub(crate) fn require(&self, field: &'static str) -> Result<Duration, DecodeError> {
		self.to_duration().ok_or(DecodeError::Duration { field })
	}
}

/// Decodes a JSON body, keeping the failing path in the error.
pub(crate) fn decode_json<T>(body: &[u8], status: Option<u16>) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de).map_err(|source| DecodeError::Json { source, status })
}

/// Parses a timestamp in the provider's fixed layout.
pub(crate) fn parse_timestamp(
	field: &'static str,
	raw: &str,
) -> Result<OffsetDateTime, DecodeError> {
	OffsetDateTime::parse(raw, TIMESTAMP_LAYOUT).map_err(|source| DecodeError::Timestamp {
		field,
		value: raw.to_owned(),
		source,
	})
}

fn whole_seconds(secs: i64) -> Option<Duration> {
	if secs < 0 { None } else { Some(Duration::seconds(secs)) }
}

fn float_seconds(secs: f64) -> Option<Duration> {
	if !secs.is_finite() || secs < 0. || secs >= i64::MAX as f64 {
		return None;
	}

	Some(Duration::seconds(secs.floor() as i64))
}
