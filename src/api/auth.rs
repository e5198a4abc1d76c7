//! Auth endpoints: sign-up, sign-in, sign-out, who-am-I.
//!
//! Successful sign-up/sign-in persists the returned bearer token into the
//! cookie jar so every later call carries it; sign-out forgets it without
//! any network traffic.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::wire::{self, UserRecord};
use super::{ApiClient, ApiError};
use crate::models::{Role, User};

/// Registration details for the sign-up endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpDetails {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Authenticated identity plus the bearer token the backend issued for it.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Serialize)]
struct SignInBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    user: Option<UserRecord>,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Deserialize)]
struct MeEnvelope {
    success: bool,
    #[serde(default)]
    user: Option<UserRecord>,
}

impl ApiClient {
    pub async fn sign_up(&self, details: &SignUpDetails) -> Result<AuthSession, ApiError> {
        let builder = self.request(Method::POST, "/auth/signup")?.json(details);
        let response = self.send(builder).await?;
        let envelope: AuthEnvelope = Self::parse(response).await?;
        self.finish_auth(envelope, "Sign up failed")
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let body = SignInBody { email, password };
        let builder = self.request(Method::POST, "/auth/signin")?.json(&body);
        let response = self.send(builder).await?;
        let envelope: AuthEnvelope = Self::parse(response).await?;
        self.finish_auth(envelope, "Sign in failed")
    }

    pub fn sign_out(&self) -> Result<(), ApiError> {
        self.cookies().clear_token()?;
        tracing::info!("signed out, bearer token cleared");
        Ok(())
    }

    /// Current user, or None when the backend rejects the token. A non-2xx
    /// status short-circuits to None before envelope parsing.
    pub async fn get_current_user(&self) -> Result<Option<User>, ApiError> {
        let builder = self.request(Method::GET, "/auth/me")?;
        let response = self.send(builder).await?;
        if !response.status().is_success() {
            return Ok(None);
        }

        let envelope: MeEnvelope = Self::parse(response).await?;
        match (envelope.success, envelope.user) {
            (true, Some(record)) => Ok(Some(wire::user_from_record(record)?)),
            _ => Ok(None),
        }
    }

    fn finish_auth(
        &self,
        envelope: AuthEnvelope,
        fallback: &str,
    ) -> Result<AuthSession, ApiError> {
        if !envelope.success {
            return Err(ApiError::rejected(envelope.message, fallback));
        }

        let (Some(record), Some(token)) = (envelope.user, envelope.token) else {
            return Err(ApiError::Decode(
                "auth envelope missing user or token".into(),
            ));
        };

        let user = wire::user_from_record(record)?;
        self.cookies().set_token(&token)?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "authenticated");

        Ok(AuthSession { user, token })
    }
}
