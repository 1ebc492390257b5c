use actix_middleware::AuthClaims;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use crypto_core::Claims;
use std::future::Future;
use std::pin::Pin;

use crate::db::UserLookup;
use crate::error::{AppError, CREDENTIALS_ERROR};
use crate::models::User;
use crate::services::UserService;
use crate::AppState;

/// The account behind the request's access token.
///
/// Requires `JwtAuthMiddleware` on the route. A token whose user has since
/// disappeared is rejected with 403.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub claims: Claims,
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let claims = AuthClaims::from_request(req, payload);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let AuthClaims(claims) = claims
                .await
                .map_err(|_| AppError::Unauthorized("Not authenticated".into()))?;
            let state = state
                .ok_or_else(|| AppError::Internal("application state not configured".into()))?;

            let user = UserService::new(state.db.clone())
                .find(UserLookup::ByUsername(&claims.preferred_username))
                .await?
                .ok_or_else(|| AppError::Forbidden(CREDENTIALS_ERROR.to_string()))?;

            // username may have been re-registered by a different account
            if claims.user_id().ok() != Some(user.id) {
                return Err(AppError::Forbidden(CREDENTIALS_ERROR.to_string()));
            }

            Ok(CurrentUser { user, claims })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App, HttpResponse, ResponseError};

    async fn whoami(current: CurrentUser) -> HttpResponse {
        HttpResponse::Ok().body(current.user.username)
    }

    #[actix_web::test]
    async fn unauthenticated_request_is_rejected_before_lookup() {
        // No middleware and no app state: the claims check must fail first.
        let app = test::init_service(App::new().route("/me", web::get().to(whoami))).await;
        let req = test::TestRequest::get().uri("/me").to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn missing_claims_map_to_not_authenticated() {
        let req = test::TestRequest::default().to_http_request();
        let err = CurrentUser::extract(&req).await.unwrap_err();

        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(matches!(err, AppError::Unauthorized(ref msg) if msg == "Not authenticated"));
    }
}
