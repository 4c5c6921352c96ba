use thiserror::Error;

/// Errors surfaced by the engine to its callers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HurlError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no personas match the requested filters")]
    NoPersonasAvailable,

    #[error(
        "persona {persona_id} exceeded toxicity {toxicity_max} on all {attempts} attempts"
    )]
    ToxicityUnsatisfiable {
        persona_id: String,
        attempts: u32,
        toxicity_max: f64,
    },

    #[error("trend tick produced a non-finite value for topic {topic_id}")]
    NonFiniteScore { topic_id: String },
}

impl HurlError {
    pub fn topic_not_found(id: impl Into<String>) -> Self {
        HurlError::NotFound {
            kind: "topic",
            id: id.into(),
        }
    }

    pub fn persona_not_found(id: impl Into<String>) -> Self {
        HurlError::NotFound {
            kind: "persona",
            id: id.into(),
        }
    }

    pub fn post_not_found(id: impl Into<String>) -> Self {
        HurlError::NotFound {
            kind: "post",
            id: id.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        HurlError::InvalidParameter(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HurlError>;
