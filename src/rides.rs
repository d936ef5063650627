//! Ride endpoints that need more than a plain decode: requesting and cancelling rides can fail
//! with confirmation payloads that callers must act on.

// self
use crate::{
	_prelude::*,
	client::Client,
	http::{ApiResponse, HttpTransport, ResponseMetadata},
	status::{self, CancelRideError, RideRequestError, StatusError},
	wire,
};

/// Standard Lyft ride type.
pub const RIDE_TYPE_LYFT: &str = "lyft";
/// Shared ride type.
pub const RIDE_TYPE_LINE: &str = "lyft_line";
/// Larger vehicle ride type.
pub const RIDE_TYPE_PLUS: &str = "lyft_plus";
/// Premier ride type.
pub const RIDE_TYPE_PREMIER: &str = "lyft_premier";
/// Lux ride type.
pub const RIDE_TYPE_LUX: &str = "lyft_lux";
/// Lux SUV ride type.
pub const RIDE_TYPE_LUX_SUV: &str = "lyft_luxsuv";
/// Status of a freshly requested ride.
pub const STATUS_PENDING: &str = "pending";

/// Geographic point, optionally with a street address.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
	/// Latitude in degrees.
	#[serde(rename = "lat")]
	pub latitude: f64,
	/// Longitude in degrees.
	#[serde(rename = "lng")]
	pub longitude: f64,
	/// Street address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address: Option<String>,
}

/// Ride request body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RideRequest {
	/// Pickup location.
	pub origin: Location,
	/// Drop-off location.
	pub destination: Location,
	/// Ride type, e.g. [`RIDE_TYPE_LYFT`].
	pub ride_type: String,
	/// Cost or primetime confirmation token from a previous [`RideRequestError`].
	#[serde(skip_serializing_if = "Option::is_none")]
	pub cost_token: Option<String>,
}

/// Passenger or driver details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Person {
	/// User identifier.
	pub user_id: String,
	/// First name.
	pub first_name: String,
	/// Last name.
	pub last_name: String,
	/// Avatar URL.
	pub image_url: String,
	/// Rating as rendered by the API.
	pub rating: Option<String>,
	/// Phone number; only set for drivers.
	pub phone_number: Option<String>,
}

/// Ride created by [`Client::request_ride`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CreatedRide {
	/// Ride identifier.
	pub ride_id: String,
	/// Ride status, [`STATUS_PENDING`] for new rides.
	pub status: String,
	/// Ride type.
	#[serde(default)]
	pub ride_type: Option<String>,
	/// Pickup location.
	pub origin: Location,
	/// Drop-off location.
	pub destination: Location,
	/// Passenger the ride was requested for.
	#[serde(default)]
	pub passenger: Person,
}

/// Authenticated user's profile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
	/// User identifier.
	pub id: String,
	/// First name.
	#[serde(default)]
	pub first_name: String,
	/// Last name.
	#[serde(default)]
	pub last_name: String,
	/// Whether the user has taken at least one ride.
	#[serde(default, rename = "has_taken_a_ride")]
	pub has_taken_ride: bool,
}

#[derive(Serialize)]
struct CancelRideRequest<'a> {
	cancel_confirmation_token: &'a str,
}

impl<C> Client<C>
where
	C: HttpTransport,
{
	/// Requests a ride.
	///
	/// A `400` response becomes [`Error::RideRequest`]; when it carries a cost or primetime
	/// token, resend the request with [`RideRequest::cost_token`] set to confirm.
	pub async fn request_ride(&self, ride: &RideRequest) -> Result<ApiResponse<CreatedRide>> {
		let request = self.json_request(Method::POST, "rides", ride)?;
		let response = self.send(request).await?;

		match response.status() {
			StatusCode::CREATED => decode_with_metadata(response),
			StatusCode::BAD_REQUEST => Err(RideRequestError::from_response(response).into()),
			_ => Err(StatusError::from_response(response).into()),
		}
	}

	/// Cancels a ride, confirming a cancellation fee with `cancel_token` when given.
	///
	/// `ride_id` is percent-encoded as a single path segment.
	///
	/// A `400` response becomes [`Error::CancelRide`], carrying the fee and the token to confirm
	/// it with when the API asks for one.
	pub async fn cancel_ride(
		&self,
		ride_id: &str,
		cancel_token: Option<&str>,
	) -> Result<ResponseMetadata> {
		let url = self.segments_url(&["rides", ride_id, "cancel"])?;
		let request = match cancel_token {
			Some(token) => self.json_request_to(
				Method::POST,
				url,
				&CancelRideRequest { cancel_confirmation_token: token },
			)?,
			None => self.empty_request_to(Method::POST, url)?,
		};
		let response = self.send(request).await?;

		match response.status() {
			StatusCode::NO_CONTENT => Ok(ResponseMetadata::from_response(&response)),
			StatusCode::BAD_REQUEST => Err(CancelRideError::from_response(response).into()),
			_ => Err(StatusError::from_response(response).into()),
		}
	}

	/// Fetches the authenticated user's profile.
	pub async fn user_profile(&self) -> Result<ApiResponse<UserProfile>> {
		let request = self.empty_request(Method::GET, "profile")?;
		let response = status::expect_status(self.send(request).await?, StatusCode::OK)?;

		decode_with_metadata(response)
	}
}

fn decode_with_metadata<T>(response: HttpResponse) -> Result<ApiResponse<T>>
where
	T: serde::de::DeserializeOwned,
{
	let metadata = ResponseMetadata::from_response(&response);
	let data = wire::decode_json(response.body(), metadata.status)?;

	Ok(ApiResponse { data, metadata })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn ride_request_omits_empty_cost_token() {
		let ride = RideRequest {
			origin: Location { latitude: 37.77, longitude: -122.41, address: None },
			destination: Location {
				latitude: 37.80,
				longitude: -122.27,
				address: Some("Oakland".into()),
			},
			ride_type: RIDE_TYPE_LYFT.into(),
			cost_token: None,
		};
		let json = serde_json::to_value(&ride).expect("Ride request should serialize.");

		assert_eq!(
			json,
			serde_json::json!({
				"origin": { "lat": 37.77, "lng": -122.41 },
				"destination": { "lat": 37.80, "lng": -122.27, "address": "Oakland" },
				"ride_type": "lyft",
			})
		);
	}

	#[test]
	fn created_ride_tolerates_sparse_passenger() {
		let ride: CreatedRide = serde_json::from_str(
			r#"{"ride_id":"r-1","status":"pending","origin":{"lat":1.0,"lng":2.0},"destination":{"lat":3.0,"lng":4.0},"passenger":{"first_name":"Ada"}}"#,
		)
		.expect("Created ride should decode.");

		assert_eq!(ride.status, STATUS_PENDING);
		assert_eq!(ride.passenger.first_name, "Ada");
		assert_eq!(ride.ride_type, None);
	}
}
