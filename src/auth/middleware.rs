// Authentication middleware for protected routes

use std::{convert::Infallible, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    token::{TokenService, TokenType},
};

/// Identity bound to a request once its bearer token has been verified
///
/// Handlers take the caller's id from here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub token_type: TokenType,
}

/// Resolve the caller from the `Authorization` header
///
/// A missing header or one that is not `Bearer <token>` is rejected before
/// the token is parsed at all.
pub fn authenticate_headers(
    headers: &HeaderMap,
    tokens: &TokenService,
) -> Result<AuthenticatedUser, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)?;

    let claims = tokens.verify(token)?;

    Ok(AuthenticatedUser {
        user_id: claims.sub,
        token_type: claims.typ,
    })
}

/// Reject the request unless it carries a valid bearer token
pub async fn require_auth(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let endpoint = request.uri().path().to_string();

    let user = authenticate_headers(request.headers(), &tokens).map_err(|err| {
        warn!("Rejected request to {}: {}", endpoint, err);
        err
    })?;

    debug!("Authenticated user_id={} endpoint={}", user.user_id, endpoint);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Bind the caller when a valid token is present, otherwise continue anonymously
pub async fn optional_auth(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate_headers(request.headers(), &tokens) {
        Ok(user) => {
            request.extensions_mut().insert(user);
        }
        Err(err) => debug!("Continuing without identity: {}", err),
    }
    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or(AuthError::MissingToken)
    }
}

/// Caller identity on routes behind `optional_auth`
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthenticatedUser>().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderValue, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use axum_test::TestServer;

    fn test_token_service() -> TokenService {
        TokenService::new("test_secret_key_for_testing_purposes", 900, 604_800)
    }

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn test_server() -> (TestServer, Arc<TokenService>) {
        let tokens = Arc::new(test_token_service());

        async fn whoami(user: AuthenticatedUser) -> String {
            user.user_id.to_string()
        }

        async fn maybe(MaybeUser(user): MaybeUser) -> String {
            user.map(|u| u.user_id.to_string())
                .unwrap_or_else(|| "anonymous".to_string())
        }

        let app = Router::new()
            .route("/protected", get(whoami))
            .route_layer(middleware::from_fn_with_state(tokens.clone(), require_auth))
            .merge(
                Router::new()
                    .route("/open", get(maybe))
                    .route_layer(middleware::from_fn_with_state(tokens.clone(), optional_auth)),
            );

        (TestServer::new(app).unwrap(), tokens)
    }

    #[test]
    fn test_missing_header_rejected() {
        let result = authenticate_headers(&HeaderMap::new(), &test_token_service());
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_non_bearer_header_rejected_before_parsing() {
        let service = test_token_service();
        let token = service.issue(Uuid::new_v4(), TokenType::Access, 900).unwrap();

        for value in [token.clone(), format!("Basic {}", token), "Bearer ".to_string()] {
            let result = authenticate_headers(&headers_with_auth(&value), &service);
            assert!(matches!(result, Err(AuthError::InvalidAuthHeader)), "{}", value);
        }
    }

    #[test]
    fn test_valid_token_binds_subject() {
        let service = test_token_service();
        let subject = Uuid::new_v4();
        let token = service.issue(subject, TokenType::Access, 900).unwrap();

        let user = authenticate_headers(&headers_with_auth(&format!("Bearer {}", token)), &service)
            .unwrap();
        assert_eq!(user.user_id, subject);
        assert_eq!(user.token_type, TokenType::Access);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = test_token_service();
        let token = service.issue(Uuid::new_v4(), TokenType::Access, -5).unwrap();

        let result = authenticate_headers(&headers_with_auth(&format!("Bearer {}", token)), &service);
        assert!(matches!(result, Err(AuthError::ExpiredToken)));
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let (server, _) = test_server();

        let response = server.get("/protected").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error_code"], "MISSING_TOKEN");
    }

    #[tokio::test]
    async fn test_protected_route_rejects_malformed_header() {
        let (server, _) = test_server();

        let response = server
            .get("/protected")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Token abc"))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error_code"], "INVALID_TOKEN_FORMAT");
    }

    #[tokio::test]
    async fn test_protected_route_accepts_valid_token() {
        let (server, tokens) = test_server();
        let subject = Uuid::new_v4();
        let token = tokens.issue(subject, TokenType::Access, 900).unwrap();

        let response = server
            .get("/protected")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            )
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), subject.to_string());
    }

    #[tokio::test]
    async fn test_optional_route_proceeds_on_bad_token() {
        let (server, _) = test_server();

        let response = server
            .get("/open")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer garbage"))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "anonymous");
    }

    #[tokio::test]
    async fn test_optional_route_binds_valid_token() {
        let (server, tokens) = test_server();
        let subject = Uuid::new_v4();
        let token = tokens.issue(subject, TokenType::Access, 900).unwrap();

        let response = server
            .get("/open")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            )
            .await;
        assert_eq!(response.text(), subject.to_string());
    }
}
