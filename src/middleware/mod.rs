use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    Json,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Caller identity for the admin write path, proven by a bearer token with
/// the `admin` scope. Token issuance belongs to the external identity
/// provider; this extractor only verifies and gates.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub subject: String,
}

#[derive(Debug, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub scope: String,
    pub exp: usize,
}

impl Claims {
    pub fn has_scope(&self, wanted: &str) -> bool {
        self.scope.split_whitespace().any(|s| s == wanted)
    }
}

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

impl FromRequestParts<Arc<crate::AppState>> for AdminUser {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Missing bearer token"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Missing bearer token"))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.auth.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| reject(StatusCode::UNAUTHORIZED, "Invalid bearer token"))?;

        if !decoded.claims.has_scope("admin") {
            return Err(reject(StatusCode::FORBIDDEN, "Admin scope required"));
        }

        Ok(AdminUser {
            subject: decoded.claims.sub,
        })
    }
}
