//! Ordered, duplicate-free access tokens held by a [`Client`](crate::client::Client).

// std
use std::slice::Iter;
// self
use crate::{_prelude::*, auth::TokenSecret};

/// How the dispatcher picks credentials when more than one is configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CredentialFallback {
	/// Try each credential in insertion order until one yields a non-401 response.
	#[default]
	Sequential,
	/// Only ever use the first credential.
	PrimaryOnly,
}

/// Ordered collection of access tokens without duplicates.
///
/// Insertion order is the trial order used by [`CredentialFallback::Sequential`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialSet {
	tokens: Vec<TokenSecret>,
}
impl CredentialSet {
	/// Appends `token` unless it is already present; returns whether it was inserted.
	pub fn insert(&mut self, token: impl Into<TokenSecret>) -> bool {
		let token = token.into();

		if self.tokens.contains(&token) {
			return false;
		}

		self.tokens.push(token);

		true
	}

	/// Removes `token` when present; returns whether it was removed.
	pub fn remove(&mut self, token: &str) -> bool {
		let before = self.tokens.len();

		self.tokens.retain(|held| held.expose() != token);

		self.tokens.len() != before
	}

	/// Returns `true` when `token` is held.
	pub fn contains(&self, token: &str) -> bool {
		self.tokens.iter().any(|held| held.expose() == token)
	}

	/// First token in insertion order.
	pub fn primary(&self) -> Option<&TokenSecret> {
		self.tokens.first()
	}

	/// Number of held tokens.
	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	/// Returns `true` if no tokens are held.
	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	/// Tokens in insertion order.
	pub fn iter(&self) -> Iter<'_, TokenSecret> {
		self.tokens.iter()
	}

	/// Tokens to try for one dispatch under `fallback`.
	pub(crate) fn candidates(&self, fallback: CredentialFallback) -> &[TokenSecret] {
		match fallback {
			CredentialFallback::Sequential => &self.tokens,
			CredentialFallback::PrimaryOnly => &self.tokens[..self.tokens.len().min(1)],
		}
	}
}
impl<T> FromIterator<T> for CredentialSet
where
	T: Into<TokenSecret>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = T>,
	{
		let mut set = Self::default();

		for token in iter {
			set.insert(token);
		}

		set
	}
}
impl<'a> IntoIterator for &'a CredentialSet {
	type IntoIter = Iter<'a, TokenSecret>;
	type Item = &'a TokenSecret;

	fn into_iter(self) -> Self::IntoIter {
		self.tokens.iter()
	}
}
