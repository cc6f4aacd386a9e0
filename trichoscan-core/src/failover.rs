use std::sync::Arc;

use crate::{Generate, GenerationRequest, GenerationResponse, ProviderErrorKind, TrichoscanError};

/// Priority-ordered failover over a set of credential-bound providers.
///
/// Every call starts from the first provider and the first success wins. A
/// transient failure advances to the next provider; a fatal one aborts the
/// whole call. Attempts are strictly sequential.
pub struct FailoverChain {
    providers: Vec<Arc<dyn Generate>>,
}

impl FailoverChain {
    /// The chain must hold at least one provider.
    pub fn new(providers: Vec<Arc<dyn Generate>>) -> Result<Self, TrichoscanError> {
        if providers.is_empty() {
            return Err(TrichoscanError::InvalidConfig(
                "failover chain requires at least one provider".to_string(),
            ));
        }
        Ok(Self { providers })
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub async fn invoke(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, TrichoscanError> {
        let total = self.providers.len();
        let mut last = String::from("Unknown error");

        for (index, provider) in self.providers.iter().enumerate() {
            match provider.generate(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(TrichoscanError::Provider {
                    kind: ProviderErrorKind::Transient,
                    message,
                }) => {
                    tracing::warn!(
                        attempt = index + 1,
                        total,
                        message = %message,
                        "provider attempt failed; advancing to next credential"
                    );
                    last = message;
                }
                Err(other) => return Err(other),
            }
        }

        Err(TrichoscanError::ProvidersExhausted {
            attempts: total,
            last,
        })
    }
}

#[async_trait::async_trait]
impl Generate for FailoverChain {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, TrichoscanError> {
        self.invoke(request).await
    }
}
