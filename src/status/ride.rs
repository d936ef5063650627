//! Ride-specific refinements of [`StatusError`].
//!
//! Both variants decode the captured body a second time against a narrower schema. A body that
//! does not match leaves the payload `None`; the base error is unaffected either way.

// self
use crate::{_prelude::*, status::StatusError, wire::WireSeconds};

/// Rejected ride request, optionally carrying a cost or primetime confirmation token.
#[derive(Clone, Debug, PartialEq)]
pub struct RideRequestError {
	/// Base status error.
	pub base: StatusError,
	/// Confirmation payload required to retry the request, when the body carried one.
	pub cost: Option<CostToken>,
}
impl RideRequestError {
	/// Builds the error by consuming `response`.
	pub fn from_response(response: HttpResponse) -> Self {
		let base = StatusError::from_response(response);
		let cost = serde_json::from_slice::<WireCostToken>(base.body())
			.ok()
			.and_then(WireCostToken::into_cost_token);

		Self { base, cost }
	}
}
impl Display for RideRequestError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		self.base.render(f, "Ride request was rejected")
	}
}
impl StdError for RideRequestError {}
impl From<RideRequestError> for StatusError {
	fn from(err: RideRequestError) -> Self {
		err.base
	}
}

/// Cost or primetime confirmation returned when a ride request needs explicit acceptance.
#[derive(Clone, Debug, PartialEq)]
pub struct CostToken {
	/// Primetime surcharge as rendered by the API, e.g. `25%`.
	pub primetime_percentage: Option<String>,
	/// Primetime multiplier applied to the fare.
	pub primetime_multiplier: Option<f64>,
	/// Token confirming the primetime surcharge.
	pub primetime_confirmation_token: Option<String>,
	/// Token confirming the quoted cost.
	pub cost_token: Option<String>,
	/// How long the token stays valid.
	pub token_duration: Option<Duration>,
	/// Link to a page explaining the error.
	pub error_uri: Option<String>,
}

/// Rejected cancellation, optionally carrying the cancellation price and its confirmation token.
#[derive(Clone, Debug, PartialEq)]
pub struct CancelRideError {
	/// Base status error.
	pub base: StatusError,
	/// Cancellation fee that must be confirmed, when the body carried one.
	pub refund: Option<CancellationPrice>,
}
impl CancelRideError {
	/// Builds the error by consuming `response`.
	pub fn from_response(response: HttpResponse) -> Self {
		let base = StatusError::from_response(response);
		let refund = serde_json::from_slice::<WireCancellationPrice>(base.body())
			.ok()
			.and_then(WireCancellationPrice::into_price);

		Self { base, refund }
	}
}
impl Display for CancelRideError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		self.base.render(f, "Ride cancellation was rejected")
	}
}
impl StdError for CancelRideError {}
impl From<CancelRideError> for StatusError {
	fn from(err: CancelRideError) -> Self {
		err.base
	}
}

/// Fee charged for cancelling a ride.
#[derive(Clone, Debug, PartialEq)]
pub struct CancellationPrice {
	/// Fee amount in the currency's minor unit.
	pub amount: f64,
	/// ISO 4217 currency code.
	pub currency: String,
	/// Token to pass back as `cancel_confirmation_token`.
	pub token: String,
	/// How long the token stays valid.
	pub token_duration: Option<Duration>,
}

#[derive(Deserialize)]
struct WireCostToken {
	primetime_percentage: Option<String>,
	primetime_multiplier: Option<f64>,
	primetime_confirmation_token: Option<String>,
	cost_token: Option<String>,
	token_duration: Option<WireSeconds>,
	error_uri: Option<String>,
}
impl WireCostToken {
	fn into_cost_token(self) -> Option<CostToken> {
		if self.cost_token.is_none() && self.primetime_confirmation_token.is_none() {
			return None;
		}

		let token_duration = match self.token_duration {
			Some(raw) => Some(raw.to_duration()?),
			None => None,
		};

		Some(CostToken {
			primetime_percentage: self.primetime_percentage,
			primetime_multiplier: self.primetime_multiplier,
			primetime_confirmation_token: self.primetime_confirmation_token,
			cost_token: self.cost_token,
			token_duration,
			error_uri: self.error_uri,
		})
	}
}

#[derive(Deserialize)]
struct WireCancellationPrice {
	amount: Option<f64>,
	currency: Option<String>,
	token: Option<String>,
	token_duration: Option<WireSeconds>,
}
impl WireCancellationPrice {
	fn into_price(self) -> Option<CancellationPrice> {
		let token_duration = match self.token_duration {
			Some(raw) => Some(raw.to_duration()?),
			None => None,
		};

		Some(CancellationPrice {
			amount: self.amount?,
			currency: self.currency?,
			token: self.token?,
			token_duration,
		})
	}
}
