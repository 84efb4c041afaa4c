pub mod appointment_service;
pub mod auth_service;
pub mod chatbot_service;
pub mod clinical_summary_service;
pub mod doctor_service;
pub mod login_service;
pub mod medical_note_service;
pub mod patient_service;
pub mod role_service;
pub mod specialty_service;
pub mod user_service;

pub use chatbot_service::ChatbotClient;
