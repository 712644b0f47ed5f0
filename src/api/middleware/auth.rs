//! Identity cookie middleware.
//!
//! Every request leaves this layer with a user id in its extensions. A
//! missing `Auth` cookie gets a fresh identity: a new UUID signed into an
//! HS256 JWT and set as an HttpOnly cookie. A present cookie is verified;
//! verification failure is a 401.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Cookie carrying the signed identity token.
pub const AUTH_COOKIE: &str = "Auth";

const TOKEN_TTL_SECONDS: i64 = 3600;

/// Authenticated user identity, attached to request extensions.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    /// Pulls the identity placed by [`layer`]; its absence is a 401.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<UserId>().cloned().ok_or_else(|| {
            tracing::error!("user id not found in request extensions");
            AppError::unauthorized("Unauthorized")
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    exp: usize,
    #[serde(rename = "UserID")]
    user_id: String,
}

/// Verifies the identity cookie or issues a new one.
pub async fn layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match jar.get(AUTH_COOKIE) {
        Some(cookie) => {
            let user_id = verify_token(cookie.value(), &state.auth_secret).map_err(|e| {
                tracing::warn!(error = %e, "failed to verify auth token");
                AppError::unauthorized("Unauthorized")
            })?;

            req.extensions_mut().insert(UserId(user_id));
            Ok(next.run(req).await)
        }
        None => {
            tracing::debug!("no auth cookie found, issuing new identity");
            let user_id = Uuid::new_v4().to_string();
            let token = issue_token(&user_id, &state.auth_secret)?;

            req.extensions_mut().insert(UserId(user_id));

            let cookie = Cookie::build((AUTH_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(time::Duration::seconds(TOKEN_TTL_SECONDS));
            let jar = jar.add(cookie);

            Ok((jar, next.run(req).await).into_response())
        }
    }
}

fn issue_token(user_id: &str, secret: &str) -> Result<String, AppError> {
    let claims = Claims {
        exp: (chrono::Utc::now() + chrono::Duration::seconds(TOKEN_TTL_SECONDS)).timestamp()
            as usize,
        user_id: user_id.to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        AppError::internal(
            "Failed to sign auth token",
            serde_json::json!({ "cause": e.to_string() }),
        )
    })
}

fn verify_token(token: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims.user_id)
}
