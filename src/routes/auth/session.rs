use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::routes::auth::claims::Claims;
use crate::utils::jwt::{decode_jwt, JwtKeyProvider};

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Debug, PartialEq)]
pub struct AuthSession(pub Claims);

fn bearer_or_cookie(parts: &Parts) -> Option<String> {
    if let Some(Authorization(bearer)) = parts.headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(AUTH_COOKIE).map(|c| c.value().to_string())
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: JwtKeyProvider + Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_or_cookie(parts).ok_or(StatusCode::UNAUTHORIZED)?;

        let claims = decode_jwt(
            &token,
            state.jwt_keys(),
            state.jwt_issuer(),
            state.jwt_audience(),
        )
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

        Ok(AuthSession(claims.claims))
    }
}
