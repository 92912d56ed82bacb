use async_trait::async_trait;
use serde::Serialize;

use crate::backend::http::BackendHttpClient;
use crate::backend::AccountService;
use crate::models::{Account, Config, Session};
use crate::Result;

/// REST client for account registration and email sessions.
///
/// Session state rides on the shared cookie jar, so a login performed
/// through one clone of the underlying HTTP client is visible to all of
/// them.
pub struct AccountClient {
    http: BackendHttpClient,
}

#[derive(Debug, Serialize)]
struct CreateAccountRequest<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl AccountClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = BackendHttpClient::new(&config.endpoint, &config.project_id)?;
        Ok(Self::with_http(http))
    }

    pub fn with_http(http: BackendHttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AccountService for AccountClient {
    async fn create(&self, email: &str, password: &str, name: &str) -> Result<Account> {
        tracing::debug!("Registering account for {}", email);
        let request = CreateAccountRequest {
            user_id: "unique()",
            email,
            password,
            name,
        };
        self.http.post_json("account", &request).await
    }

    async fn create_session(&self, email: &str, password: &str) -> Result<Session> {
        tracing::debug!("Opening session for {}", email);
        let request = CreateSessionRequest { email, password };
        self.http.post_json("account/sessions/email", &request).await
    }

    async fn current(&self) -> Result<Account> {
        self.http.get_json("account").await
    }

    async fn delete_sessions(&self) -> Result<()> {
        tracing::debug!("Closing all sessions");
        self.http.delete("account/sessions").await
    }
}
