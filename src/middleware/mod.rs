pub mod auth;
pub mod security_headers;

pub use auth::{bearer_token, RequirePermission};
pub use security_headers::SecurityHeaders;
