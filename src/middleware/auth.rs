//! Bearer authentication
//!
//! Resolves the `Authorization: Bearer <jwt>` header to an active vendor and
//! injects it into the request extensions as `AuthenticatedVendor`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    models::Vendor,
    state::AppState,
    utils::{errors::AppError, jwt::extract_token_from_header},
};

/// Vendor behind the current request
#[derive(Debug, Clone)]
pub struct AuthenticatedVendor(pub Vendor);

impl std::ops::Deref for AuthenticatedVendor {
    type Target = Vendor;

    fn deref(&self) -> &Vendor {
        &self.0
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let vendor = state.auth.authenticate(token).await?;

    request.extensions_mut().insert(AuthenticatedVendor(vendor));
    Ok(next.run(request).await)
}
