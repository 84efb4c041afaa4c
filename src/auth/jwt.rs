use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtSettings;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,              // user id
    pub name: String,             // username
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Who a token is being issued for.
#[derive(Debug, Clone)]
pub struct TokenSubject<'a> {
    pub user_id: i64,
    pub username: &'a str,
    pub email: &'a str,
    pub role: &'a str,
    pub permissions: Vec<String>,
}

/// Signs and validates HS256 session tokens.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl JwtManager {
    pub fn new(settings: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_issuer(&[settings.issuer.as_str()]);

        Self {
            encoding: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding: DecodingKey::from_secret(settings.secret.as_bytes()),
            validation,
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            lifetime: Duration::minutes(settings.expiration_minutes),
        }
    }

    pub fn issue(&self, subject: TokenSubject<'_>) -> Result<(String, Claims), String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.user_id.to_string(),
            name: subject.username.to_string(),
            email: subject.email.to_string(),
            role: subject.role.to_string(),
            permissions: subject.permissions,
            iat: now.timestamp() as usize,
            exp: (now + self.lifetime).timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| format!("Failed to generate token: {}", e))?;
        Ok((token, claims))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, String> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| format!("Invalid token: {}", e))
    }
}
