use tracing::info;

use crate::api::{ApiError, MockApi};
use crate::domain::User;

pub const MOCK_TOKEN: &str = "mock_token";

/// Demo login state. Any non-empty credentials log in as the mock user.
#[derive(Debug, Default)]
pub struct Session {
    user: Option<User>,
    token: Option<String>,
}

impl Session {
    pub async fn login(&mut self, api: &MockApi, email: &str, password: &str) -> Result<&User, ApiError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ApiError::MissingCredentials);
        }
        let user = api.user().await;
        info!("session opened for {}", user.email);
        self.token = Some(MOCK_TOKEN.to_string());
        Ok(self.user.insert(user))
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!("session closed for {}", user.email);
        }
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}
