//! SDP offer/answer exchange with the signaling endpoint.

use crate::error::VoiceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use voxsign_types::Locale;

/// Request body posted to the signaling endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOffer {
    pub sdp: String,
    pub locale: Locale,
}

/// Response body returned by the signaling endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAnswer {
    pub sdp: String,
}

/// Client for the signaling endpoint.
#[derive(Debug, Clone)]
pub struct SignalingClient {
    http: reqwest::Client,
    url: String,
}

impl SignalingClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, VoiceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Posts the local offer and returns the remote answer SDP.
    #[instrument(skip(self, offer_sdp), fields(url = %self.url, offer_len = offer_sdp.len()))]
    pub async fn exchange(&self, offer_sdp: &str, locale: Locale) -> Result<String, VoiceError> {
        let offer = SessionOffer {
            sdp: offer_sdp.to_string(),
            locale,
        };

        let resp = self.http.post(&self.url).json(&offer).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VoiceError::Signaling(format!(
                "endpoint returned {}: {}",
                status,
                body.trim()
            )));
        }

        let answer: SessionAnswer = resp.json().await?;
        if answer.sdp.trim().is_empty() {
            return Err(VoiceError::Signaling("empty answer SDP".to_string()));
        }
        debug!(answer_len = answer.sdp.len(), "received answer");
        Ok(answer.sdp)
    }
}
