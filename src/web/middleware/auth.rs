use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::database::current_user_repo;

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
}

#[derive(Deserialize)]
struct JwtPayload {
    sub: String,
}

fn access_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|c| c.strip_prefix("access_token="))
        })
}

/// Reads `sub` from the JWT payload. The signature is not checked; the
/// gateway in front of this service has already done that.
pub fn subject_from_jwt(token: &str) -> Option<String> {
    let mut parts = token.split('.');
    let (_, payload, _) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let bytes = general_purpose::URL_SAFE_NO_PAD.decode(payload).ok()?;
    let payload: JwtPayload = serde_json::from_slice(&bytes).ok()?;
    Some(payload.sub).filter(|sub| !sub.is_empty())
}

pub async fn require_auth(
    State(pool): State<SqlitePool>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(user_id) = access_token(request.headers()).and_then(subject_from_jwt) {
        request
            .extensions_mut()
            .insert(AuthenticatedUser { id: user_id });
        return next.run(request).await;
    }

    // Local/offline use: fall back to the current_user row
    match current_user_repo::load_current_user_id(&pool).await {
        Ok(Some(user_id)) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser { id: user_id });
            return next.run(request).await;
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("current_user lookup failed: {}", e),
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "unauthorized" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn token_for(payload: &str) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.c2ln",
            general_purpose::URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn subject_is_read_from_the_payload() {
        assert_eq!(
            subject_from_jwt(&token_for(r#"{"sub":"user-7","exp":1}"#)),
            Some("user-7".to_string())
        );
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert_eq!(subject_from_jwt("not-a-jwt"), None);
        assert_eq!(subject_from_jwt("a.b.c.d"), None);
        assert_eq!(subject_from_jwt(&token_for(r#"{"exp":1}"#)), None);
        assert_eq!(subject_from_jwt(&token_for(r#"{"sub":""}"#)), None);
    }

    #[test]
    fn cookie_lookup_tolerates_spacing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark;access_token=abc.def.ghi; lang=nl"),
        );
        assert_eq!(access_token(&headers), Some("abc.def.ghi"));
    }
}
