use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    Error, HttpMessage,
};
use crypto_core::jwt::{self, Claims, TokenScope};
use futures::future::{ready, Ready};
use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;
use std::rc::Rc;

use crate::error::AuthError;

/// Claims of the validated access token for the current request
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

impl Deref for AuthClaims {
    type Target = Claims;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Token from an `Authorization: Bearer <token>` header.
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Validate a bearer token and require the access scope.
pub fn authenticate(token: &str) -> Result<Claims, AuthError> {
    let claims = jwt::validate_token::<Claims>(token)?.claims;
    if claims.scope != TokenScope::AccessToken {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(claims)
}

/// JWT Authentication Middleware
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let token = bearer_token(req.headers()).ok_or(AuthError::MissingCredentials)?;

            let claims = authenticate(token).map_err(|e| {
                tracing::warn!(path = %req.path(), "JWT validation failed: {}", e);
                e
            })?;

            req.extensions_mut().insert(claims);

            service.call(req).await
        })
    }
}

impl actix_web::FromRequest for AuthClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(AuthClaims(claims.clone()))),
            None => ready(Err(AuthError::MissingCredentials.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn init_test_keys() {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            jwt::initialize_jwt_keys(
                "middleware-test-secret-0123456789abcdef",
                "http://localhost:8000",
                "http://localhost:8000/authentication/login",
            )
            .expect("Failed to initialize test keys");
        });
    }

    fn token(scope: TokenScope, lifetime: Duration) -> String {
        let now = Utc::now();
        let claims = Claims {
            iss: "http://localhost:8000".into(),
            sub: Claims::subject_for(Uuid::new_v4()),
            aud: "http://localhost:8000/authentication/login".into(),
            exp: (now + lifetime).timestamp(),
            nbf: now.timestamp() - 1,
            iat: now.timestamp(),
            jti: Uuid::new_v4(),
            scope,
            email: "ana@example.com".into(),
            name: "Ana Ruiz".into(),
            nickname: "Ana".into(),
            preferred_username: "ana".into(),
            given_name: "Ana".into(),
            middle_name: None,
            family_name: "Ruiz".into(),
            gender: None,
            birthdate: None,
            phone_number: None,
            address: None,
            updated_at: None,
        };
        jwt::encode_token(&claims).unwrap()
    }

    async fn whoami(claims: AuthClaims) -> HttpResponse {
        HttpResponse::Ok().body(claims.preferred_username.clone())
    }

    macro_rules! protected_app {
        () => {
            test::init_service(
                App::new().service(
                    web::resource("/me")
                        .wrap(JwtAuthMiddleware)
                        .route(web::get().to(whoami)),
                ),
            )
            .await
        };
    }

    #[::core::prelude::v1::test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[actix_web::test]
    async fn valid_access_token_reaches_handler() {
        init_test_keys();
        let app = protected_app!();

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((
                AUTHORIZATION,
                format!("Bearer {}", token(TokenScope::AccessToken, Duration::minutes(5))),
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, "ana");
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        init_test_keys();
        let app = protected_app!();

        let req = test::TestRequest::get().uri("/me").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();

        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn refresh_token_is_forbidden() {
        init_test_keys();
        let app = protected_app!();

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((
                AUTHORIZATION,
                format!("Bearer {}", token(TokenScope::RefreshToken, Duration::minutes(5))),
            ))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();

        assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn expired_token_is_unauthorized() {
        init_test_keys();
        let app = protected_app!();

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((
                AUTHORIZATION,
                format!("Bearer {}", token(TokenScope::AccessToken, Duration::hours(-2))),
            ))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();

        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn garbage_token_is_forbidden() {
        init_test_keys();
        let app = protected_app!();

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, "Bearer not-a-jwt"))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();

        assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
    }
}
