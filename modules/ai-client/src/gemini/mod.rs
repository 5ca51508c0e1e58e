mod client;
pub(crate) mod types;

use anyhow::{anyhow, Context, Result};

use crate::schema::GeminiOutput;

use client::GeminiClient;
use types::*;

// =============================================================================
// Gemini Agent
// =============================================================================

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    model: String,
    base_url: Option<String>,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> GeminiClient {
        let client = GeminiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    // =========================================================================
    // Convenience methods
    // =========================================================================

    /// Free-text generation with the search-grounding tool attached.
    ///
    /// The response is prose: callers that expect JSON embedded in it must
    /// strip fence markers themselves (`util::strip_code_blocks`). A response
    /// schema cannot be combined with tools, which is why this path returns
    /// raw text.
    pub async fn generate_grounded(&self, prompt: impl Into<String>) -> Result<String> {
        let request = GenerateRequest::new()
            .content(Content::user(prompt))
            .tool(ToolWire::google_search());

        let response = self.client().generate(&self.model, &request).await?;

        response
            .text()
            .ok_or_else(|| anyhow!("No text in Gemini response"))
    }

    /// Schema-constrained generation. The service validates the output
    /// against the schema derived from `T`, so the text parses directly.
    pub async fn generate_structured<T: GeminiOutput>(
        &self,
        prompt: impl Into<String>,
    ) -> Result<T> {
        let request = GenerateRequest::new()
            .content(Content::user(prompt))
            .response_mime_type("application/json")
            .response_schema(T::gemini_schema());

        let response = self.client().generate(&self.model, &request).await?;

        let text = response
            .text()
            .ok_or_else(|| anyhow!("No text in Gemini response"))?;

        serde_json::from_str(&text).context("Failed to deserialize structured response")
    }
}
