use std::env;

/// Runtime configuration read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt: JwtSettings,
    pub bcrypt_cost: u32,
    pub chatbot_api_url: String,
    pub allowed_origins: Vec<String>,
    /// Optional bootstrap administrator, created at startup if missing.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiration_minutes: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_or("PORT", 5098)?,
            database_url: required("DATABASE_URL")?,
            jwt: JwtSettings {
                secret: required("JWT_SECRET")?,
                issuer: var_or("JWT_ISSUER", "MedBotAssist"),
                audience: var_or("JWT_AUDIENCE", "MedBotAssistUsers"),
                expiration_minutes: parse_or("JWT_EXPIRATION_MINUTES", 60)?,
            },
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            chatbot_api_url: var_or("CHATBOT_API_URL", "http://localhost:8000/api/v1"),
            allowed_origins: var_or("ALLOWED_ORIGINS", "http://localhost:3000,http://localhost:5173")
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            admin_username: optional("ADMIN_USERNAME"),
            admin_password: optional("ADMIN_PASSWORD"),
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "memory://".to_string(),
            jwt: JwtSettings::for_tests(),
            bcrypt_cost: 4,
            chatbot_api_url: "http://127.0.0.1:1/api/v1".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            admin_username: None,
            admin_password: None,
        }
    }
}

impl JwtSettings {
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            secret: "test-secret-key-with-enough-length-for-hs256".to_string(),
            issuer: "MedBotAssist".to_string(),
            audience: "MedBotAssistUsers".to_string(),
            expiration_minutes: 60,
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_and_rejects_garbage() {
        assert_eq!(parse_or::<u16>("MEDBOT_TEST_UNSET_PORT", 5098).unwrap(), 5098);

        env::set_var("MEDBOT_TEST_BAD_PORT", "eighty");
        let err = parse_or::<u16>("MEDBOT_TEST_BAD_PORT", 5098).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MEDBOT_TEST_BAD_PORT", .. }));
    }

    #[test]
    fn required_treats_empty_as_missing() {
        env::set_var("MEDBOT_TEST_EMPTY", "");
        assert!(matches!(required("MEDBOT_TEST_EMPTY"), Err(ConfigError::Missing(_))));
    }
}
