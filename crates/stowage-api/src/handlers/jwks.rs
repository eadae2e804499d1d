//! Public key set for verifying access tokens.

use axum::Json;
use axum::extract::State;

use stowage_auth::Jwks;

use crate::state::AppState;

/// GET /.well-known/jwks.json
///
/// Served bare, not wrapped in `ApiResponse`, so standard JWKS clients can
/// read it. Empty when tokens are HMAC-signed.
pub async fn jwks(State(state): State<AppState>) -> Json<Jwks> {
    Json(state.jwks.as_ref().clone())
}
