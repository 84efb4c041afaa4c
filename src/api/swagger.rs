use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MedBotAssist API",
        version = "1.0.0",
        description = "Backend for appointments, clinical notes and AI-generated clinical summaries.\n\n**Authentication:** every `/api` route except login and register requires a JWT Bearer token. Each route also checks one permission claim (e.g. `ViewPatients`).",
        contact(
            name = "MedBotAssist Team"
        )
    ),
    paths(
        // Auth
        crate::api::auth::login,
        crate::api::auth::register,
        crate::api::auth::verify_token,

        // Health
        crate::api::health::health_check,

        // Clinical data
        crate::api::patients::get_all,
        crate::api::patients::get_info,
        crate::api::patients::search,
        crate::api::patients::create,
        crate::api::patients::update,
        crate::api::patients::delete,
        crate::api::doctors::get_all,
        crate::api::doctors::create,
        crate::api::appointments::get_by_doctor_and_date,
        crate::api::appointments::create,
        crate::api::appointments::update,
        crate::api::medical_notes::create,
        crate::api::clinical_summaries::get_by_patient,
        crate::api::clinical_summaries::search_by_diagnosis,
        crate::api::specialties::get_all,
        crate::api::specialties::create,

        // Administration
        crate::api::users::get_all,
        crate::api::roles::grant,

        // Agent
        crate::api::chat::send,
        crate::api::chat::history,
        crate::api::chat::clear_history,
    ),
    components(
        schemas(
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::RegisterResponse,
            crate::services::auth_service::VerifyTokenResponse,
            crate::services::login_service::LoginResponse,
            crate::api::health::HealthResponse,
            crate::models::PatientRequest,
            crate::models::PatientResponse,
            crate::models::DoctorRequest,
            crate::models::DoctorResponse,
            crate::models::SpecialtyRequest,
            crate::models::SpecialtyResponse,
            crate::models::AppointmentStatus,
            crate::models::AppointmentRequest,
            crate::models::AppointmentResponse,
            crate::models::AppointmentDetails,
            crate::models::MedicalNoteRequest,
            crate::models::MedicalNoteResponse,
            crate::models::ClinicalSummaryRequest,
            crate::models::ClinicalSummaryResponse,
            crate::models::UpdateUserRequest,
            crate::models::UserResponse,
            crate::models::RoleResponse,
            crate::models::PermissionResponse,
            crate::models::RolePermissionRequest,
            crate::models::ChatRequest,
            crate::models::ChatResponse,
            crate::models::InteractionResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Login, registration and token verification."),
        (name = "Health", description = "Liveness and database connectivity."),
        (name = "Patient", description = "Patient records."),
        (name = "Doctor", description = "Doctor profiles linked to users."),
        (name = "Appointment", description = "Scheduling and daily agendas."),
        (name = "MedicalNote", description = "Free-text notes taken during appointments."),
        (name = "ClinicalSummary", description = "Structured summaries generated from notes."),
        (name = "Specialty", description = "Medical specialties catalogue."),
        (name = "User", description = "User administration."),
        (name = "Role", description = "Roles and permission grants."),
        (name = "Chat", description = "Proxy to the medical AI agent."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by /api/Auth/login"))
                        .build()
                ),
            );
        }
    }
}
