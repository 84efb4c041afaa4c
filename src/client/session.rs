use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::token_store::{SessionStorage, TokenManager};
use super::{ClientError, ClientResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginReply {
    token: String,
    username: String,
    doctor_id: Option<i64>,
}

/// Authenticated HTTP access to the API, backed by a [`TokenManager`].
pub struct AuthSession<S: SessionStorage> {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenManager<S>,
}

impl<S: SessionStorage> AuthSession<S> {
    pub fn new(base_url: &str, storage: S) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: TokenManager::new(storage),
        }
    }

    pub fn tokens(&self) -> &TokenManager<S> {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Logs in and stores the session. Any failure, including network
    /// errors, is reported as `false`.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        match self.try_login(username, password).await {
            Ok(logged_in) => logged_in,
            Err(e) => {
                log::warn!("❌ Login request failed: {}", e);
                false
            }
        }
    }

    async fn try_login(&self, username: &str, password: &str) -> ClientResult<bool> {
        let response = self
            .http
            .post(self.url("/api/Auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            log::warn!("❌ Login rejected for {}: {}", username, response.status());
            return Ok(false);
        }

        let reply: LoginReply = response.json().await?;
        self.tokens.save_session(&reply.token, &reply.username, reply.doctor_id)?;
        Ok(true)
    }

    pub fn logout(&self) -> ClientResult<()> {
        self.tokens.clear()
    }

    /// Sends a request with the stored bearer token. A `401` clears the
    /// session and yields [`ClientError::SessionExpired`]; nothing is retried.
    pub async fn fetch_with_auth(&self, method: Method, path: &str, body: Option<&Value>) -> ClientResult<Response> {
        let mut request = self.http.request(method, self.url(path));
        if let Some(token) = self.tokens.token()? {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            log::warn!("🔒 Session expired on {}", path);
            self.logout()?;
            return Err(ClientError::SessionExpired);
        }
        Ok(response)
    }

    /// Token refresh is not offered by the server.
    pub async fn refresh_token(&self) -> bool {
        false
    }
}
