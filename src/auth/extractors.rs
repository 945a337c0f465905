use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::error::ApiError;

/// Extracts and validates the bearer token, yielding the caller's account ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<JwtKeys>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<JwtKeys>::from_ref(state);

        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header"))?;

        let claims = keys.verify(token).map_err(|e| {
            warn!("invalid or expired token");
            e
        })?;

        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use axum::http::Request;

    #[derive(Clone)]
    struct KeysOnly(Arc<JwtKeys>);

    impl FromRef<KeysOnly> for Arc<JwtKeys> {
        fn from_ref(s: &KeysOnly) -> Self {
            s.0.clone()
        }
    }

    fn state() -> KeysOnly {
        KeysOnly(Arc::new(JwtKeys::new(&JwtConfig {
            secret: "extractor-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 5,
        })))
    }

    async fn extract(state: &KeysOnly, header: Option<&str>) -> Result<AuthUser, ApiError> {
        let mut builder = Request::builder().uri("/books");
        if let Some(h) = header {
            builder = builder.header("authorization", h);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn accepts_valid_bearer_token() {
        let st = state();
        let token = st.0.sign(9, "bob", "b@x.com").unwrap();
        let user = extract(&st, Some(&format!("Bearer {token}"))).await.unwrap();
        assert_eq!(user, AuthUser(9));
    }

    #[tokio::test]
    async fn rejects_missing_header() {
        let err = extract(&state(), None).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(m) if m.contains("Missing")));
    }

    #[tokio::test]
    async fn rejects_other_schemes_and_empty_tokens() {
        let st = state();
        assert!(extract(&st, Some("Basic dXNlcjpwYXNz")).await.is_err());
        assert!(extract(&st, Some("Bearer ")).await.is_err());
        assert!(extract(&st, Some("Bearer not-a-token")).await.is_err());
    }
}
