//! Google Gemini API generation client

use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trichoscan_core::{
    Generate, GenerationRequest, GenerationResponse, Part, ProviderErrorKind, TrichoscanError,
};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// One credential-bound Gemini client.
#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    http: Client,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(120);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("valid reqwest client config");
        Self {
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn model_name(&self, request_model: &str) -> String {
        let model = if request_model.is_empty() {
            self.model.as_str()
        } else {
            request_model
        };
        model
            .trim()
            .strip_prefix("models/")
            .unwrap_or(model)
            .to_string()
    }

    fn generate_url(&self, request_model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model_name(request_model)
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<WireInlineData>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct WireInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<GoogleErrorItem>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorItem {
    #[serde(default)]
    reason: Option<String>,
}

/// The single point where provider failures are sorted into retriable and
/// fatal. Invalid keys arrive as HTTP 400 with an `API_KEY_INVALID` reason,
/// so the reason field is consulted before the status code.
fn classify(status: StatusCode, detail: Option<&GoogleErrorDetail>) -> ProviderErrorKind {
    if let Some(detail) = detail {
        if detail
            .details
            .iter()
            .any(|item| item.reason.as_deref() == Some("API_KEY_INVALID"))
        {
            return ProviderErrorKind::Transient;
        }
        if let Some(status) = detail.status.as_deref() {
            if matches!(
                status,
                "UNAUTHENTICATED" | "RESOURCE_EXHAUSTED" | "INTERNAL" | "UNAVAILABLE"
            ) {
                return ProviderErrorKind::Transient;
            }
        }
    }
    match status.as_u16() {
        401 | 429 | 500 | 503 => ProviderErrorKind::Transient,
        _ => ProviderErrorKind::Fatal,
    }
}

fn is_blocked_finish_reason(reason: &str) -> bool {
    matches!(reason, "SAFETY" | "RECITATION" | "BLOCKLIST")
}

fn build_request(input: &GenerationRequest) -> GenerateContentRequest {
    let parts = input
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => WirePart {
                text: Some(text.clone()),
                inline_data: None,
            },
            Part::Inline(inline) => WirePart {
                text: None,
                inline_data: Some(WireInlineData {
                    mime_type: inline.mime_type.clone(),
                    data: inline.data.clone(),
                }),
            },
        })
        .collect();

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: input.config.as_ref().map(|config| WireGenerationConfig {
            response_mime_type: config.response_mime_type.clone(),
            response_schema: config.response_schema.clone(),
        }),
    }
}

#[async_trait::async_trait]
impl Generate for GeminiClient {
    async fn generate(
        &self,
        input: GenerationRequest,
    ) -> Result<GenerationResponse, TrichoscanError> {
        let request = build_request(&input);

        let response = self
            .http
            .post(self.generate_url(&input.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|err| TrichoscanError::transient(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<GoogleErrorResponse>(&body)
                .ok()
                .map(|envelope| envelope.error);
            let message = detail
                .as_ref()
                .map(|detail| detail.message.clone())
                .unwrap_or_else(|| format!("HTTP {}: {}", status, body));
            return Err(TrichoscanError::Provider {
                kind: classify(status, detail.as_ref()),
                message,
            });
        }

        let response = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|err| TrichoscanError::fatal(err.to_string()))?;

        let candidate = response
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .ok_or_else(|| TrichoscanError::fatal("No candidates in response"))?;

        let finish_reason = candidate.finish_reason;

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty()
            && finish_reason
                .as_deref()
                .map(is_blocked_finish_reason)
                .unwrap_or(false)
        {
            let reason = finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(TrichoscanError::fatal(format!(
                "Generation blocked: {}",
                reason
            )));
        }

        Ok(GenerationResponse { text })
    }
}
