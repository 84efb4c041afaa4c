//! Token issuance, password hashing and the permission check used by the
//! request filter.

pub mod jwt;
pub mod password;
pub mod permissions;

pub use jwt::{Claims, JwtManager};

/// Why a request was refused by [`authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// No valid token accompanied the request.
    Unauthorized,
    /// The token is valid but lacks the permission.
    Forbidden { required: String },
}

/// Decides whether a caller may proceed. `claims` is `None` when the request
/// carried no valid token; `required` is `None` for routes that only need an
/// authenticated caller.
pub fn authorize(claims: Option<&Claims>, required: Option<&str>) -> Result<(), AuthzError> {
    let claims = claims.ok_or(AuthzError::Unauthorized)?;
    match required {
        Some(permission) if !claims.has_permission(permission) => Err(AuthzError::Forbidden {
            required: permission.to_string(),
        }),
        _ => Ok(()),
    }
}
