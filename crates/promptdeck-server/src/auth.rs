//! Identity provider wiring
//!
//! The hosted identity provider is consumed as `Option<Principal>` per
//! request. The dev provider decodes a base64-encoded principal JSON
//! document from the `Authorization: Bearer` header; production
//! deployments swap the decode step for real token validation.

use crate::AppState;
use crate::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use promptdeck_engine::entities::Principal;

/// Authenticated principal; rejects with 401 when absent or malformed.
///
/// ```ignore
/// async fn my_handler(AuthUser(principal): AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user = %principal.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

/// Optional principal: `None` when no Authorization header is present,
/// 401 only when a header is present but malformed.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Principal>);

fn principal_from_parts(parts: &Parts) -> Result<Option<Principal>, ApiError> {
    let Some(header) = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
    else {
        return Ok(None);
    };

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::unauthorized("Invalid Authorization format. Expected: Bearer <token>")
    })?;

    let bytes = STANDARD
        .decode(token)
        .map_err(|_| ApiError::unauthorized("Invalid token encoding"))?;
    let principal = serde_json::from_slice(&bytes)
        .map_err(|_| ApiError::unauthorized("Invalid token payload"))?;
    Ok(Some(principal))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        principal_from_parts(parts)?
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(principal_from_parts(parts)?))
    }
}

/// Encode a principal as a dev bearer token.
#[cfg(test)]
pub fn encode_token(principal: &Principal) -> String {
    STANDARD.encode(serde_json::to_vec(principal).expect("principal serializes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/templates");
        if let Some(value) = value {
            builder = builder.header("authorization", value);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_missing_header_is_none() {
        let parts = parts_with_auth(None);
        assert!(principal_from_parts(&parts).unwrap().is_none());
    }

    #[test]
    fn test_round_trips_encoded_principal() {
        let principal =
            Principal::new("alice", "alice@example.com").with_display_name("Alice");
        let token = encode_token(&principal);
        let parts = parts_with_auth(Some(&format!("Bearer {token}")));

        let decoded = principal_from_parts(&parts).unwrap().unwrap();
        assert_eq!(decoded.id, principal.id);
        assert_eq!(decoded.email, principal.email);
        assert_eq!(decoded.display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_malformed_header_rejected() {
        let parts = parts_with_auth(Some("Basic abc"));
        assert!(principal_from_parts(&parts).is_err());

        let parts = parts_with_auth(Some("Bearer not-base64!!!"));
        assert!(principal_from_parts(&parts).is_err());
    }
}
