use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    web, Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::auth::{authorize, AuthzError, Claims, JwtManager};
use crate::utils::AppError;

/// Returns the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Per-route guard. Validates the bearer token, checks the permission claim
/// and exposes the claims to handlers through `web::ReqData<Claims>`.
#[derive(Clone)]
pub struct RequirePermission {
    permission: Option<Rc<str>>,
}

impl RequirePermission {
    pub fn new(permission: &str) -> Self {
        Self {
            permission: Some(Rc::from(permission)),
        }
    }

    /// Any valid token is enough.
    pub fn authenticated() -> Self {
        Self { permission: None }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequirePermission
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequirePermissionService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequirePermissionService {
            service,
            permission: self.permission.clone(),
        }))
    }
}

pub struct RequirePermissionService<S> {
    service: S,
    permission: Option<Rc<str>>,
}

impl<S> RequirePermissionService<S> {
    fn check(&self, req: &ServiceRequest) -> Result<Claims, AppError> {
        let jwt = req
            .app_data::<web::Data<JwtManager>>()
            .ok_or_else(|| AppError::Internal("JWT manager is not configured".to_string()))?;

        let claims = bearer_token(req.headers()).and_then(|token| match jwt.verify(token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                log::warn!("❌ Rejected token on {}: {}", req.path(), e);
                None
            }
        });

        match authorize(claims.as_ref(), self.permission.as_deref()) {
            Ok(()) => claims.ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string())),
            Err(AuthzError::Unauthorized) => {
                Err(AppError::Unauthorized("Missing or invalid authorization token".to_string()))
            }
            Err(AuthzError::Forbidden { required }) => {
                log::warn!("🚫 {} denied on {}: missing {}", claims.map(|c| c.name).unwrap_or_default(), req.path(), required);
                Err(AppError::Forbidden(format!("Permission '{}' is required", required)))
            }
        }
    }
}

impl<S, B> Service<ServiceRequest> for RequirePermissionService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.check(&req) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Err(e) => {
                let response = req.into_response(e.error_response()).map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenSubject;
    use crate::config::JwtSettings;
    use actix_web::{http::StatusCode, test as actix_test, App, HttpResponse};

    async fn whoami(claims: web::ReqData<Claims>) -> HttpResponse {
        HttpResponse::Ok().body(claims.name.clone())
    }

    fn token(jwt: &JwtManager, permissions: &[&str]) -> String {
        jwt.issue(TokenSubject {
            user_id: 7,
            username: "jperez",
            email: "jperez@medbot.com",
            role: "Doctor",
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        })
        .unwrap()
        .0
    }

    fn app_jwt() -> web::Data<JwtManager> {
        web::Data::new(JwtManager::new(&JwtSettings::for_tests()))
    }

    #[actix_web::test]
    async fn status_depends_on_token_and_permission() {
        let jwt = app_jwt();
        let app = actix_test::init_service(
            App::new()
                .app_data(jwt.clone())
                .service(
                    web::resource("/patients")
                        .wrap(RequirePermission::new("ViewPatients"))
                        .route(web::get().to(whoami)),
                ),
        )
        .await;

        let anonymous = actix_test::TestRequest::get().uri("/patients").to_request();
        assert_eq!(actix_test::call_service(&app, anonymous).await.status(), StatusCode::UNAUTHORIZED);

        let garbage = actix_test::TestRequest::get()
            .uri("/patients")
            .insert_header((AUTHORIZATION, "Bearer not.a.jwt"))
            .to_request();
        assert_eq!(actix_test::call_service(&app, garbage).await.status(), StatusCode::UNAUTHORIZED);

        let wrong_scheme = actix_test::TestRequest::get()
            .uri("/patients")
            .insert_header((AUTHORIZATION, format!("Basic {}", token(&jwt, &["ViewPatients"]))))
            .to_request();
        assert_eq!(actix_test::call_service(&app, wrong_scheme).await.status(), StatusCode::UNAUTHORIZED);

        let lacking = actix_test::TestRequest::get()
            .uri("/patients")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token(&jwt, &["ViewAppointments"]))))
            .to_request();
        assert_eq!(actix_test::call_service(&app, lacking).await.status(), StatusCode::FORBIDDEN);

        let allowed = actix_test::TestRequest::get()
            .uri("/patients")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token(&jwt, &["ViewPatients"]))))
            .to_request();
        let response = actix_test::call_service(&app, allowed).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(response).await, web::Bytes::from_static(b"jperez"));
    }

    #[actix_web::test]
    async fn authenticated_only_accepts_any_valid_token() {
        let jwt = app_jwt();
        let app = actix_test::init_service(
            App::new().app_data(jwt.clone()).service(
                web::resource("/me")
                    .wrap(RequirePermission::authenticated())
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let no_permissions = actix_test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token(&jwt, &[]))))
            .to_request();
        assert_eq!(actix_test::call_service(&app, no_permissions).await.status(), StatusCode::OK);

        let anonymous = actix_test::TestRequest::get().uri("/me").to_request();
        assert_eq!(actix_test::call_service(&app, anonymous).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn rejection_body_uses_error_envelope() {
        let app = actix_test::init_service(
            App::new().app_data(app_jwt()).service(
                web::resource("/me")
                    .wrap(RequirePermission::authenticated())
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let body: serde_json::Value =
            actix_test::call_and_read_body_json(&app, actix_test::TestRequest::get().uri("/me").to_request()).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Unauthorized"));
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
