use thiserror::Error;

/// How a provider failure should be handled by the failover chain.
///
/// The kind is assigned once, at the transport boundary that talked to the
/// provider. Failover policy keys off this value and never inspects message
/// text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Transient or credential-local failure; the next credential may succeed.
    Transient,
    /// The request itself was rejected; no other credential can help.
    Fatal,
}

#[derive(Debug, Error)]
pub enum TrichoscanError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Provider call failed: {message}")]
    Provider {
        kind: ProviderErrorKind,
        message: String,
    },
    #[error("All {attempts} API keys failed. Last error: {last}")]
    ProvidersExhausted { attempts: usize, last: String },
    #[error("Parsing failed on output '{output}': {reason}")]
    ParseFailed { output: String, reason: String },
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Failed to read image: {0}")]
    ImageRead(#[from] std::io::Error),
    #[error("Failed to analyze hair and scalp images. Please try again.")]
    AnalysisFailed,
    #[error("Failed to generate haircare routine. Please try again.")]
    RoutineFailed,
}

impl TrichoscanError {
    pub fn transient(message: impl Into<String>) -> Self {
        TrichoscanError::Provider {
            kind: ProviderErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        TrichoscanError::Provider {
            kind: ProviderErrorKind::Fatal,
            message: message.into(),
        }
    }
}
