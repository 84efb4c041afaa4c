use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use medbot_assist::auth::JwtManager;
use medbot_assist::config::Settings;
use medbot_assist::database::Database;
use medbot_assist::services::ChatbotClient;
use medbot_assist::{api, middleware, seeds};

fn fatal(context: &str, error: impl std::fmt::Display) -> std::io::Error {
    log::error!("❌ {}: {}", context, error);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, error))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env().map_err(|e| fatal("Invalid configuration", e))?;

    log::info!("🚀 Starting MedBotAssist...");

    let db = Database::connect(&settings.database_url)
        .await
        .map_err(|e| fatal("Failed to connect to the database", e))?;

    // 🌱 Roles, permissions and the optional bootstrap admin
    seeds::roles_seed::seed_roles_and_permissions(&db)
        .await
        .map_err(|e| fatal("Failed to seed roles", e))?;
    if let (Some(username), Some(password)) = (&settings.admin_username, &settings.admin_password) {
        seeds::roles_seed::seed_admin_user(&db, username, password, settings.bcrypt_cost)
            .await
            .map_err(|e| fatal("Failed to seed admin user", e))?;
    }

    let db_data = web::Data::new(db);
    let jwt_data = web::Data::new(JwtManager::new(&settings.jwt));
    let chatbot_data = web::Data::new(ChatbotClient::new(&settings.chatbot_api_url));
    let settings_data = web::Data::new(settings.clone());

    log::info!("🤖 Chatbot agent: {}", settings.chatbot_api_url);
    log::info!("🌐 Server starting on {}:{}", settings.host, settings.port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", settings.host, settings.port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", settings.host, settings.port);

    let allowed_origins = settings.allowed_origins.clone();

    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(jwt_data.clone())
            .app_data(chatbot_data.clone())
            .app_data(settings_data.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .configure(api::configure)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
