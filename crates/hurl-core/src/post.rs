use serde::{Deserialize, Serialize};

/// How a post's topics were chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Topics drawn from the adoption model.
    #[default]
    Emergent,
    /// Topics drawn uniformly.
    PureRandom,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Emergent => "emergent",
            Mode::PureRandom => "pure_random",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "emergent" => Ok(Mode::Emergent),
            "pure_random" | "pure-random" => Ok(Mode::PureRandom),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoration counts recorded while styling a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleMetrics {
    pub emojis: u32,
    pub hashtags: u32,
    pub links: u32,
    /// Share of words upper-cased, in [0, 1].
    pub caps: f64,
}

/// Where a post came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    pub template: String,
    /// Ids of earlier posts that "influenced" this one.
    pub influences: Vec<String>,
}

/// Simulated audience reaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub likes: u64,
    pub replies: u64,
    pub quotes: u64,
    pub impressions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub persona_id: String,
    /// ISO-8601 UTC with milliseconds.
    pub created_at: String,
    pub mode: Mode,
    pub topics: Vec<String>,
    pub language: String,
    pub style: StyleMetrics,
    pub lineage: Lineage,
    pub metrics: EngagementMetrics,
    pub toxicity: f64,
}

impl Post {
    pub fn mentions(&self, topic_id: &str) -> bool {
        self.topics.iter().any(|t| t == topic_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("emergent".parse::<Mode>().unwrap(), Mode::Emergent);
        assert_eq!("pure-random".parse::<Mode>().unwrap(), Mode::PureRandom);
        assert!("chaos".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_serializes_snake_case() {
        let json = serde_json::to_string(&Mode::PureRandom).unwrap();
        assert_eq!(json, "\"pure_random\"");
    }
}
