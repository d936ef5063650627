//! Two-legged flow: application tokens from the client credentials grant.
//!
//! Application tokens only reach public endpoints (ETAs, ride types, cost estimates), so the
//! request defaults to the `public` scope when the caller asks for none.

// self
use crate::{
	_prelude::*,
	auth::{self, Scope, Token},
	flows::OAuthClient,
	http::{ApiResponse, HttpTransport},
	obs::{self, FlowKind},
};

#[derive(Serialize)]
struct ClientCredentialsRequest<'a> {
	grant_type: &'static str,
	scope: &'a str,
}

impl<C> OAuthClient<C>
where
	C: HttpTransport,
{
	/// Performs the `client_credentials` grant for `scopes` (`public` when empty).
	pub async fn client_credentials(&self, scopes: &[Scope]) -> Result<ApiResponse<Token>> {
		obs::observe(FlowKind::ClientCredentials, "client_credentials", async move {
			let scope = if scopes.is_empty() {
				Scope::Public.as_str().to_owned()
			} else {
				auth::join_scopes(scopes)
			};
			let body = ClientCredentialsRequest { grant_type: "client_credentials", scope: &scope };

			Ok(self.request_token(&body).await?.into_token()?)
		})
		.await
	}
}
