//! Refresh and revocation of three-legged user tokens.
//!
//! A refreshed token only carries a refresh token when the provider sends one back; callers that
//! want to keep refreshing should hold on to the original refresh token otherwise.

// self
use crate::{
	_prelude::*,
	auth::{AuthorizationToken, TokenSecret},
	error::ConfigError,
	flows::OAuthClient,
	http::{ApiResponse, HttpTransport, ResponseMetadata},
	obs::{self, FlowKind},
	status,
};

#[derive(Serialize)]
struct RefreshTokenRequest<'a> {
	grant_type: &'static str,
	refresh_token: &'a str,
}

#[derive(Serialize)]
struct RevokeTokenRequest<'a> {
	token: &'a str,
}

impl<C> OAuthClient<C>
where
	C: HttpTransport,
{
	/// Exchanges `refresh_token` for a new access token.
	pub async fn refresh_token(
		&self,
		refresh_token: &TokenSecret,
	) -> Result<ApiResponse<AuthorizationToken>> {
		obs::observe(FlowKind::Refresh, "refresh_token", async move {
			let body = RefreshTokenRequest {
				grant_type: "refresh_token",
				refresh_token: refresh_token.expose(),
			};

			Ok(self.request_token(&body).await?.into_authorization_token()?)
		})
		.await
	}

	/// Refreshes `token`, carrying its refresh token over when the provider does not rotate it.
	pub async fn refresh(
		&self,
		token: &AuthorizationToken,
	) -> Result<ApiResponse<AuthorizationToken>> {
		let refresh_token = token.refresh_token.as_ref().ok_or(ConfigError::MissingRefreshToken)?;
		let mut refreshed = self.refresh_token(refresh_token).await?;

		if refreshed.data.refresh_token.is_none() {
			refreshed.data.refresh_token = Some(refresh_token.clone());
		}

		Ok(refreshed)
	}

	/// Revokes the refresh token tied to `access_token`.
	///
	/// Success is a `200` response; its body is not read, only its headers.
	pub async fn revoke_token(&self, access_token: &TokenSecret) -> Result<ResponseMetadata> {
		obs::observe(FlowKind::Revoke, "revoke_token", async move {
			let url = self.endpoints.revoke_url().map_err(ConfigError::from)?;
			let body = RevokeTokenRequest { token: access_token.expose() };
			let response = self.post_json(url, &body).await?;
			let response = status::expect_status(response, StatusCode::OK)?;

			Ok(ResponseMetadata::from_response(&response))
		})
		.await
	}
}
