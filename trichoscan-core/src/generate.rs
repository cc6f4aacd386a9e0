use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::TrichoscanError;

/// One content part of a generation request.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub enum Part {
    Text(String),
    Inline(InlinePart),
}

/// Base64-encoded binary payload paired with its media type.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct InlinePart {
    pub mime_type: String,
    pub data: String,
}

/// Structured-output directive: the response must be `response_mime_type`
/// content conforming to `response_schema`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
}

impl GenerationConfig {
    pub fn json(schema: Value) -> Self {
        Self {
            response_mime_type: "application/json".to_string(),
            response_schema: schema,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<GenerationConfig>,
}

/// Text of the provider's first candidate.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GenerationResponse {
    pub text: String,
}

/// The provider seam. A credential-bound client implements this, and so does
/// [`FailoverChain`](crate::FailoverChain), so callers compose against one
/// trait object.
#[async_trait::async_trait]
pub trait Generate: Send + Sync {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, TrichoscanError>;
}
