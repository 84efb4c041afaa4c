use actix_web::{web, HttpResponse, Route};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::middleware::RequirePermission;
use crate::utils::{AppError, AppResult};

pub mod appointments;
pub mod auth;
pub mod chat;
pub mod clinical_summaries;
pub mod doctors;
pub mod health;
pub mod medical_notes;
pub mod patients;
pub mod roles;
pub mod specialties;
pub mod swagger;
pub mod users;

/// Registers every route of the service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| AppError::InvalidRequest(err.to_string()).into()))
        .app_data(web::QueryConfig::default().error_handler(|err, _| AppError::InvalidRequest(err.to_string()).into()))
        .app_data(web::PathConfig::default().error_handler(|err, _| AppError::InvalidRequest(err.to_string()).into()))
        .route("/health", web::get().to(health::health_check))
        .service(web::scope("/api/Auth").configure(auth::routes))
        .service(web::scope("/api/Patient").configure(patients::routes))
        .service(web::scope("/api/Doctor").configure(doctors::routes))
        .service(web::scope("/api/Appointment").configure(appointments::routes))
        .service(web::scope("/api/MedicalNote").configure(medical_notes::routes))
        .service(web::scope("/api/ClinicalSummary").configure(clinical_summaries::routes))
        .service(web::scope("/api/Specialty").configure(specialties::routes))
        .service(web::scope("/api/User").configure(users::routes))
        .service(web::scope("/api/Role").configure(roles::role_routes))
        .service(web::scope("/api/Permission").configure(roles::permission_routes))
        .service(web::scope("/api/Chat").configure(chat::routes));
}

/// Mounts a single route behind the permission filter.
pub(crate) fn protected(cfg: &mut web::ServiceConfig, path: &str, guard: RequirePermission, route: Route) {
    cfg.service(web::resource(path).wrap(guard).route(route));
}

fn envelope(entries: Vec<(&str, Value)>) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    for (key, value) in entries {
        body.insert(key.to_string(), value);
    }
    body
}

fn to_value<T: Serialize>(value: T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(format!("Failed to serialize response: {}", e)))
}

/// `{"success": true, "<key>": [...], "total": n}`
pub(crate) fn listed<T: Serialize>(key: &str, items: Vec<T>) -> AppResult<HttpResponse> {
    let total = items.len();
    let body = envelope(vec![(key, to_value(items)?), ("total", Value::from(total))]);
    Ok(HttpResponse::Ok().json(body))
}

/// `{"success": true, "<key>": {...}}`
pub(crate) fn single<T: Serialize>(key: &str, item: T) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(envelope(vec![(key, to_value(item)?)])))
}

pub(crate) fn created<T: Serialize>(key: &str, item: T) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Created().json(envelope(vec![(key, to_value(item)?)])))
}

pub(crate) fn deleted(what: &str, id: i64, removed: bool) -> AppResult<HttpResponse> {
    if !removed {
        return Err(AppError::NotFound(format!("{} {} not found", what, id)));
    }
    Ok(HttpResponse::Ok().json(envelope(vec![(
        "message",
        Value::from(format!("{} {} deleted", what, id)),
    )])))
}

pub(crate) fn found<T>(what: &str, id: i64, item: Option<T>) -> AppResult<T> {
    item.ok_or_else(|| AppError::NotFound(format!("{} {} not found", what, id)))
}

#[cfg(test)]
pub(crate) mod testing {
    use actix_web::web;

    use crate::auth::jwt::TokenSubject;
    use crate::auth::JwtManager;
    use crate::config::Settings;
    use crate::database::Database;
    use crate::seeds::roles_seed;
    use crate::services::ChatbotClient;

    /// Shared state handed to test apps.
    pub struct TestState {
        pub db: web::Data<crate::database::Database>,
        pub jwt: web::Data<JwtManager>,
        pub settings: web::Data<Settings>,
        pub chatbot: web::Data<ChatbotClient>,
    }

    impl TestState {
        pub async fn new() -> Self {
            let db = Database::in_memory();
            roles_seed::seed_roles_and_permissions(&db).await.unwrap();
            let settings = Settings::for_tests();
            Self {
                db: web::Data::new(db),
                jwt: web::Data::new(JwtManager::new(&settings.jwt)),
                chatbot: web::Data::new(ChatbotClient::new(&settings.chatbot_api_url)),
                settings: web::Data::new(settings),
            }
        }

        pub fn bearer(&self, permissions: &[&str]) -> (&'static str, String) {
            let (token, _) = self
                .jwt
                .issue(TokenSubject {
                    user_id: 1,
                    username: "tester",
                    email: "tester@medbot.com",
                    role: "Doctor",
                    permissions: permissions.iter().map(|p| p.to_string()).collect(),
                })
                .unwrap();
            ("Authorization", format!("Bearer {}", token))
        }
    }

    /// Builds the full application around a [`TestState`].
    macro_rules! test_app {
        ($state:expr) => {
            actix_web::test::init_service(
                actix_web::App::new()
                    .app_data($state.db.clone())
                    .app_data($state.jwt.clone())
                    .app_data($state.settings.clone())
                    .app_data($state.chatbot.clone())
                    .configure($crate::api::configure),
            )
            .await
        };
    }
    pub(crate) use test_app;
}
