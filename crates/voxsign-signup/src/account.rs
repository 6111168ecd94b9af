//! Account creation collaborator.
//!
//! The orchestrator hands the finished form to an [`AccountCreator`] exactly
//! once per attempt. Failures are only ever classified as a weak password or
//! something else; the orchestrator branches on nothing more than that.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};
use voxsign_types::FormState;

/// Structured error code for a rejected password.
pub const WEAK_PASSWORD_CODE: &str = "weak_password";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCreated {
    #[serde(default)]
    pub needs_email_confirmation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("password rejected as too weak: {0}")]
    WeakPassword(String),

    #[error("account creation failed: {0}")]
    Other(String),
}

impl AccountError {
    pub fn is_weak_password(&self) -> bool {
        matches!(self, Self::WeakPassword(_))
    }

    /// Classifies a failure reported by the account backend.
    ///
    /// A structured `code` decides when present. Backends that only send a
    /// message are matched on its wording.
    pub fn classify(code: Option<&str>, message: &str) -> Self {
        let message = message.to_string();
        match code {
            Some(WEAK_PASSWORD_CODE) => Self::WeakPassword(message),
            Some(_) => Self::Other(message),
            None if looks_like_weak_password(&message) => Self::WeakPassword(message),
            None => Self::Other(message),
        }
    }
}

fn looks_like_weak_password(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("weak")
        || (lower.contains("password")
            && ["at least", "too short", "should contain", "must contain", "strength"]
                .iter()
                .any(|hint| lower.contains(hint)))
}

impl From<reqwest::Error> for AccountError {
    fn from(err: reqwest::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[async_trait]
pub trait AccountCreator: Send + Sync {
    async fn create_account(&self, form: &FormState) -> Result<AccountCreated, AccountError>;
}

/// Body posted to the account endpoint. The confirmation copy of the
/// password stays on the client.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountRequest<'a> {
    name: &'a str,
    username: &'a str,
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "is_blank")]
    date_of_birth: &'a str,
    #[serde(skip_serializing_if = "is_blank")]
    country: &'a str,
    #[serde(skip_serializing_if = "is_blank")]
    country_code: &'a str,
    #[serde(skip_serializing_if = "is_blank")]
    city: &'a str,
    agreed_to_terms: bool,
}

fn is_blank(value: &&str) -> bool {
    value.is_empty()
}

impl<'a> From<&'a FormState> for CreateAccountRequest<'a> {
    fn from(form: &'a FormState) -> Self {
        Self {
            name: &form.name,
            username: &form.username,
            email: &form.email,
            password: &form.password,
            date_of_birth: &form.date_of_birth,
            country: &form.country,
            country_code: &form.country_code,
            city: &form.city,
            agreed_to_terms: form.agreed_to_terms,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default, alias = "error")]
    message: String,
}

/// [`AccountCreator`] backed by an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpAccountCreator {
    http: reqwest::Client,
    url: String,
}

impl HttpAccountCreator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AccountError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AccountCreator for HttpAccountCreator {
    async fn create_account(&self, form: &FormState) -> Result<AccountCreated, AccountError> {
        let resp = self
            .http
            .post(&self.url)
            .json(&CreateAccountRequest::from(form))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            let created = if body.trim().is_empty() {
                AccountCreated::default()
            } else {
                serde_json::from_str(&body)
                    .map_err(|e| AccountError::Other(format!("invalid response: {}", e)))?
            };
            info!(
                username = %form.username,
                needs_email_confirmation = created.needs_email_confirmation,
                "account created"
            );
            return Ok(created);
        }

        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_else(|_| ErrorBody {
            code: None,
            message: body.trim().to_string(),
        });
        let message = if parsed.message.is_empty() {
            status.to_string()
        } else {
            parsed.message
        };
        let err = AccountError::classify(parsed.code.as_deref(), &message);
        warn!(%status, weak_password = err.is_weak_password(), "account creation rejected");
        Err(err)
    }
}
