//! OAuth scopes understood by the Lyft API.

// crates.io
use serde::{Deserializer, Serializer};
// self
use crate::_prelude::*;

/// Errors emitted when parsing a single scope.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Permission granted to an access token.
///
/// Scopes the crate does not know about are kept verbatim in [`Scope::Other`] so that
/// converting a provider response never fails on a newly introduced scope.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
	/// Public data such as ETAs and ride types.
	Public,
	/// Read access to the user's ride history.
	RidesRead,
	/// Issue refresh tokens alongside access tokens.
	Offline,
	/// Request and manage rides on the user's behalf.
	RidesRequest,
	/// Read access to the user's profile.
	Profile,
	/// Scope string the crate has no dedicated variant for.
	Other(String),
}
impl Scope {
	/// Wire representation of the scope.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Public => "public",
			Self::RidesRead => "rides.read",
			Self::Offline => "offline",
			Self::RidesRequest => "rides.request",
			Self::Profile => "rides.profile",
			Self::Other(raw) => raw,
		}
	}
}
impl Display for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Scope {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Err(ScopeValidationError::Empty);
		}
		if s.chars().any(char::is_whitespace) {
			return Err(ScopeValidationError::ContainsWhitespace { scope: s.into() });
		}

		Ok(match s {
			"public" => Self::Public,
			"rides.read" => Self::RidesRead,
			"offline" => Self::Offline,
			"rides.request" => Self::RidesRequest,
			"rides.profile" => Self::Profile,
			other => Self::Other(other.into()),
		})
	}
}
impl Serialize for Scope {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}
impl<'de> Deserialize<'de> for Scope {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		raw.parse().map_err(serde::de::Error::custom)
	}
}

/// Splits a space-delimited scope string, keeping the provider's order and dropping
/// repeated entries.
pub fn parse_scopes(raw: &str) -> Vec<Scope> {
	let mut scopes = Vec::new();

	for token in raw.split_whitespace() {
		// `split_whitespace` never yields empty or whitespace-bearing tokens.
		let scope = match token.parse::<Scope>() {
			Ok(scope) => scope,
			Err(_) => continue,
		};

		if !scopes.contains(&scope) {
			scopes.push(scope);
		}
	}

	scopes
}

/// Joins scopes into the space-delimited form the API expects.
pub fn join_scopes<'a, I>(scopes: I) -> String
where
	I: IntoIterator<Item = &'a Scope>,
{
	scopes.into_iter().map(Scope::as_str).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parse_preserves_order_and_drops_duplicates() {
		assert_eq!(parse_scopes("public rides.read"), vec![Scope::Public, Scope::RidesRead]);
		assert_eq!(
			parse_scopes("  offline\tpublic offline  rides.request "),
			vec![Scope::Offline, Scope::Public, Scope::RidesRequest]
		);
		assert!(parse_scopes("").is_empty());
	}

	#[test]
	fn unknown_scopes_round_trip_verbatim() {
		let scopes = parse_scopes("public drivers.read");

		assert_eq!(scopes[1], Scope::Other("drivers.read".into()));
		assert_eq!(join_scopes(&scopes), "public drivers.read");
	}

	#[test]
	fn from_str_rejects_empty_and_whitespace() {
		assert_eq!("".parse::<Scope>(), Err(ScopeValidationError::Empty));
		assert!(matches!(
			"rides read".parse::<Scope>(),
			Err(ScopeValidationError::ContainsWhitespace { .. })
		));
	}

	#[test]
	fn serde_uses_wire_strings() {
		let json = serde_json::to_string(&[Scope::Profile, Scope::RidesRead])
			.expect("Scopes should serialize.");

		assert_eq!(json, r#"["rides.profile","rides.read"]"#);

		let back: Vec<Scope> = serde_json::from_str(&json).expect("Scopes should deserialize.");

		assert_eq!(back, vec![Scope::Profile, Scope::RidesRead]);
	}
}
