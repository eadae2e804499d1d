//! `AuthUser` extractor: validates the bearer token and builds the request context.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use stowage_auth::Claims;
use stowage_core::error::AppError;
use stowage_service::context::RequestContext;

use crate::error::ApiError;
use crate::extractors::client::ClientInfo;
use crate::state::AppState;

/// Extracted authenticated account available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Context handed to services.
    pub context: RequestContext,
    /// Validated access token claims.
    pub claims: Claims,
}

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AppError::authentication("Missing or malformed Authorization header")
                        .with_key("auth.missing_token")
                })?;

        let claims = state
            .auth_manager
            .decoder()
            .decode_access_token(bearer.token())
            .await?;

        let client = ClientInfo::from_parts(parts);
        let context = RequestContext::new(
            claims.user_id(),
            claims.family_id(),
            claims.role,
            claims.username.clone(),
            client.ip_address,
            client.user_agent,
        );

        Ok(AuthUser { context, claims })
    }
}
