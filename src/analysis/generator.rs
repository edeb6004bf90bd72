use async_trait::async_trait;

use crate::{
    client::{Error as ClientError, Gemini},
    generation::{GenerateContentRequest, GenerationResponse},
};

/// Anything that can answer a content generation request.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, ClientError>;
}

#[async_trait]
impl Generator for Gemini {
    async fn generate(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, ClientError> {
        Gemini::generate(self, request).await
    }
}
