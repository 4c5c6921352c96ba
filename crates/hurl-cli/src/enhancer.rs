//! Text enhancer backed by a local Ollama server.

use std::time::Duration;

use async_trait::async_trait;
use hurl_core::{EnhancementError, TextEnhancer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    seed: u64,
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Clone)]
pub struct OllamaEnhancer {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaEnhancer {
    /// `base_url` is the server root, e.g. `http://localhost:11434`.
    /// `timeout` bounds the whole HTTP exchange; the engine applies its own
    /// budget on top.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }

    fn prompt(text: &str, context: &str) -> String {
        format!(
            "Rewrite this social media post to be more natural and varied, matching this style: {context}\n\n\
             Original: {text}\n\n\
             Rewritten (keep it under 50 words):"
        )
    }
}

#[async_trait]
impl TextEnhancer for OllamaEnhancer {
    async fn enhance(&self, text: &str, context: &str, seed: u64) -> Result<String, EnhancementError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: Self::prompt(text, context),
            stream: false,
            options: GenerateOptions {
                seed,
                temperature: 0.8,
                num_predict: 50,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| EnhancementError::Failure(e.to_string()))?;
        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| EnhancementError::Failure(e.to_string()))?;
        Ok(body.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joined_once() {
        let e = OllamaEnhancer::new("http://localhost:11434/", "llama3.2", Duration::from_secs(1)).unwrap();
        assert_eq!(e.url, "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_prompt_carries_text_and_style() {
        let prompt = OllamaEnhancer::prompt("AI is mid", "cynicism=0.90, reading_level=10");
        assert!(prompt.contains("Original: AI is mid"));
        assert!(prompt.contains("cynicism=0.90"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_failure() {
        let e = OllamaEnhancer::new("http://127.0.0.1:9", "m", Duration::from_millis(200)).unwrap();
        let err = e.enhance("hi", "", 1).await.unwrap_err();
        assert!(matches!(err, EnhancementError::Failure(_)));
    }
}
