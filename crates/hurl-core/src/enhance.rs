//! Optional external text enhancement.
//!
//! The synthesizer never depends on an enhancer succeeding: every failure,
//! including a slow answer, falls back to the text it already has.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnhancementError {
    #[error("enhancement timed out after {0:?}")]
    Timeout(Duration),
    #[error("enhancement failed: {0}")]
    Failure(String),
}

/// Rewrites a drafted post, e.g. through a local language model.
#[async_trait]
pub trait TextEnhancer: Send + Sync {
    /// `context` is a one-line persona description; `seed` is the post seed so
    /// providers that accept one can stay reproducible.
    async fn enhance(&self, text: &str, context: &str, seed: u64) -> Result<String, EnhancementError>;

    fn name(&self) -> &str {
        "enhancer"
    }
}

/// Run `enhancer` under `timeout`, returning `text` unchanged on any failure
/// or on an empty answer.
pub async fn enhance_or_fallback(
    enhancer: &dyn TextEnhancer,
    text: &str,
    context: &str,
    seed: u64,
    timeout: Duration,
) -> String {
    let outcome = match tokio::time::timeout(timeout, enhancer.enhance(text, context, seed)).await {
        Ok(result) => result,
        Err(_) => Err(EnhancementError::Timeout(timeout)),
    };

    match outcome {
        Ok(enhanced) if !enhanced.trim().is_empty() => enhanced.trim().to_string(),
        Ok(_) => {
            tracing::debug!(enhancer = enhancer.name(), "empty enhancement, keeping draft");
            text.to_string()
        }
        Err(e) => {
            tracing::debug!(enhancer = enhancer.name(), "{e}, keeping draft");
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shout;

    #[async_trait]
    impl TextEnhancer for Shout {
        async fn enhance(&self, text: &str, _: &str, _: u64) -> Result<String, EnhancementError> {
            Ok(format!("{}!", text.to_uppercase()))
        }
    }

    struct Broken;

    #[async_trait]
    impl TextEnhancer for Broken {
        async fn enhance(&self, _: &str, _: &str, _: u64) -> Result<String, EnhancementError> {
            Err(EnhancementError::Failure("connection refused".into()))
        }
    }

    struct Sleepy;

    #[async_trait]
    impl TextEnhancer for Sleepy {
        async fn enhance(&self, text: &str, _: &str, _: u64) -> Result<String, EnhancementError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(format!("late {text}"))
        }
    }

    const LIMIT: Duration = Duration::from_millis(150);

    #[tokio::test]
    async fn test_success_replaces_text() {
        assert_eq!(enhance_or_fallback(&Shout, "hi", "", 1, LIMIT).await, "HI!");
    }

    #[tokio::test]
    async fn test_failure_keeps_draft() {
        assert_eq!(enhance_or_fallback(&Broken, "hi", "", 1, LIMIT).await, "hi");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_keeps_draft() {
        assert_eq!(enhance_or_fallback(&Sleepy, "hi", "", 1, LIMIT).await, "hi");
    }
}
