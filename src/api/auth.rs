use actix_web::{web, HttpResponse};

use crate::auth::{Claims, JwtManager};
use crate::config::Settings;
use crate::database::Database;
use crate::middleware::RequirePermission;
use crate::services::auth_service::{self, LoginRequest, RegisterRequest, RegisterResponse, VerifyTokenResponse};
use crate::services::login_service;
use crate::utils::{AppError, AppResult};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::post().to(login))
        .route("/register", web::post().to(register));
    super::protected(cfg, "/verify", RequirePermission::authenticated(), web::get().to(verify_token));
}

#[utoipa::path(
    post,
    path = "/api/Auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = login_service::LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    db: web::Data<Database>,
    jwt: web::Data<JwtManager>,
    request: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    log::info!("🔐 POST /api/Auth/login - username: {}", request.username);

    match login_service::login(&db, &jwt, &request).await? {
        Some(response) => {
            log::info!("✅ Login successful: {}", request.username);
            Ok(HttpResponse::Ok().json(response))
        }
        None => {
            log::warn!("❌ Login failed: {}", request.username);
            Err(AppError::Unauthorized("Invalid username or password".to_string()))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/Auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = RegisterResponse),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn register(
    db: web::Data<Database>,
    settings: web::Data<Settings>,
    request: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    log::info!("📝 POST /api/Auth/register - username: {}", request.username);

    let message = auth_service::register(&db, &request, settings.bcrypt_cost).await?;
    Ok(HttpResponse::Created().json(RegisterResponse {
        success: true,
        message,
    }))
}

#[utoipa::path(
    get,
    path = "/api/Auth/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid", body = VerifyTokenResponse),
        (status = 401, description = "Invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_token(claims: web::ReqData<Claims>) -> HttpResponse {
    let claims = claims.into_inner();
    log::info!("✓ GET /api/Auth/verify - user: {}", claims.sub);

    HttpResponse::Ok().json(VerifyTokenResponse {
        valid: true,
        user_id: claims.sub,
        username: claims.name,
        role: claims.role,
        permissions: claims.permissions,
        exp: claims.exp,
    })
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{test_app, TestState};
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn register_login_then_call_a_protected_route() {
        let state = TestState::new().await;
        let app = test_app!(state);

        let register = test::TestRequest::post()
            .uri("/api/Auth/register")
            .set_json(json!({
                "username": "jperez",
                "password": "s3cret",
                "fullName": "Juan Pérez",
                "email": "jperez@medbot.com",
                "licenseNumber": "LIC-001"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, register).await.status(), StatusCode::CREATED);

        let login = test::TestRequest::post()
            .uri("/api/Auth/login")
            .set_json(json!({ "username": "jperez", "password": "s3cret" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, login).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["role"], "Doctor");
        assert!(body["doctorId"].is_i64());
        let token = body["token"].as_str().unwrap().to_string();

        let patients = test::TestRequest::get()
            .uri("/api/Patient/getAll")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        assert_eq!(test::call_service(&app, patients).await.status(), StatusCode::OK);

        let verify = test::TestRequest::get()
            .uri("/api/Auth/verify")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let verified: Value = test::call_and_read_body_json(&app, verify).await;
        assert_eq!(verified["valid"], true);
        assert_eq!(verified["username"], "jperez");
    }

    #[actix_web::test]
    async fn bad_credentials_and_duplicates() {
        let state = TestState::new().await;
        let app = test_app!(state);

        let login = test::TestRequest::post()
            .uri("/api/Auth/login")
            .set_json(json!({ "username": "ghost", "password": "x" }))
            .to_request();
        assert_eq!(test::call_service(&app, login).await.status(), StatusCode::UNAUTHORIZED);

        let payload = json!({
            "username": "jperez",
            "password": "s3cret",
            "fullName": "Juan Pérez",
            "email": "jperez@medbot.com"
        });
        let first = test::TestRequest::post().uri("/api/Auth/register").set_json(&payload).to_request();
        assert_eq!(test::call_service(&app, first).await.status(), StatusCode::CREATED);
        let second = test::TestRequest::post().uri("/api/Auth/register").set_json(&payload).to_request();
        assert_eq!(test::call_service(&app, second).await.status(), StatusCode::CONFLICT);
    }
}
