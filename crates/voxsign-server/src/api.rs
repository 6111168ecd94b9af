//! Realtime session signaling proxy.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use voxsign_types::Locale;

use crate::AppState;

/// Largest SDP offer accepted from a client.
pub const MAX_SDP_BYTES: usize = 64 * 1024;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Request body for `POST /api/realtime/session`.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub sdp: String,
    #[serde(default)]
    pub locale: Option<String>,
}

/// Response body for `POST /api/realtime/session`.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub sdp: String,
}

impl SessionRequest {
    fn validate(&self) -> Result<Locale, ApiError> {
        if self.sdp.trim().is_empty() {
            return Err(ApiError::BadRequest("sdp offer is empty".to_string()));
        }
        if self.sdp.len() > MAX_SDP_BYTES {
            return Err(ApiError::BadRequest(format!(
                "sdp offer exceeds {MAX_SDP_BYTES} bytes"
            )));
        }
        match self.locale.as_deref() {
            None => Ok(Locale::default()),
            Some(code) => Locale::from_code(code)
                .ok_or_else(|| ApiError::BadRequest(format!("unsupported locale: {code}"))),
        }
    }
}

/// Handler for `POST /api/realtime/session`.
///
/// Forwards the browser's SDP offer to the upstream realtime endpoint and
/// returns its answer. The upstream key never leaves the server.
pub async fn create_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let locale = payload.validate()?;

    let upstream = &state.config.realtime;
    let api_key = upstream.api_key().ok_or_else(|| {
        tracing::warn!("realtime session requested but no upstream api key is configured");
        ApiError::Unavailable("realtime sessions are not configured".to_string())
    })?;
    let voice = upstream.voice_for(locale);

    tracing::debug!(
        %locale,
        voice,
        model = %upstream.model,
        offer_bytes = payload.sdp.len(),
        "forwarding sdp offer upstream"
    );

    let response = state
        .http
        .post(&upstream.url)
        .query(&[("model", upstream.model.as_str()), ("voice", voice)])
        .bearer_auth(api_key)
        .header(header::CONTENT_TYPE, "application/sdp")
        .body(payload.sdp)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "upstream realtime request failed");
            ApiError::Upstream("realtime endpoint unreachable".to_string())
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        tracing::warn!(error = %e, "failed to read upstream realtime response");
        ApiError::Upstream("failed to read realtime answer".to_string())
    })?;

    if !status.is_success() {
        tracing::warn!(%status, body = %body, "upstream realtime endpoint rejected offer");
        return Err(ApiError::Upstream(format!(
            "realtime endpoint returned {}",
            status.as_u16()
        )));
    }
    if body.trim().is_empty() {
        return Err(ApiError::Upstream(
            "realtime endpoint returned an empty answer".to_string(),
        ));
    }

    tracing::info!(%locale, answer_bytes = body.len(), "realtime session negotiated");
    Ok(Json(SessionResponse { sdp: body }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(sdp: &str, locale: Option<&str>) -> SessionRequest {
        SessionRequest {
            sdp: sdp.to_string(),
            locale: locale.map(str::to_string),
        }
    }

    #[test]
    fn locale_defaults_to_english() {
        assert_eq!(request("v=0", None).validate().unwrap(), Locale::En);
    }

    #[test]
    fn region_tagged_locale_is_accepted() {
        assert_eq!(request("v=0", Some("ar-SA")).validate().unwrap(), Locale::Ar);
    }

    #[test]
    fn unknown_locale_is_rejected() {
        let err = request("v=0", Some("fr")).validate().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn oversized_offer_is_rejected() {
        let sdp = "a".repeat(MAX_SDP_BYTES + 1);
        let err = request(&sdp, Some("en")).validate().unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn offer_at_the_limit_is_accepted() {
        let sdp = "a".repeat(MAX_SDP_BYTES);
        assert!(request(&sdp, Some("en")).validate().is_ok());
    }

    #[test]
    fn blank_offer_is_rejected() {
        assert!(request("  \n", Some("en")).validate().is_err());
    }
}
