//! The topic graph: a fixed directed, weighted graph of content subjects.
//!
//! Structure (ids, names, tags, edges) never changes after construction.
//! Each topic also carries a trend score and velocity; those live behind a
//! lock and are only written by [`crate::trends::TrendEngine`].

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants::BASELINE_SCORE;
use crate::error::{HurlError, Result};

/// Static description of one topic node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A directed edge `source → target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Point-in-time view of a topic, including its current trend state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    /// Outgoing edges only: target id → edge weight.
    pub related: BTreeMap<String, f64>,
    pub trend_score: f64,
    pub velocity: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct TrendState {
    pub scores: Vec<f64>,
    pub velocities: Vec<f64>,
}

#[derive(Debug)]
struct Node {
    spec: TopicSpec,
    related: BTreeMap<String, f64>,
}

#[derive(Debug)]
pub struct TopicGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    /// Per node: `(source index, weight)` of every incoming edge.
    in_edges: Vec<Vec<(usize, f64)>>,
    state: RwLock<TrendState>,
}

impl TopicGraph {
    /// Graph over the built-in topic table.
    pub fn seeded() -> Self {
        let topics = SEED_TOPICS
            .iter()
            .map(|(id, name, tags)| TopicSpec {
                id: (*id).to_string(),
                name: (*name).to_string(),
                tags: tags.iter().map(|t| (*t).to_string()).collect(),
            })
            .collect();
        let edges = SEED_EDGES
            .iter()
            .map(|(source, target, weight)| EdgeSpec {
                source: (*source).to_string(),
                target: (*target).to_string(),
                weight: *weight,
            })
            .collect();
        Self::build(topics, edges)
    }

    /// Build from caller-supplied topics and edges.
    ///
    /// Duplicate topic ids keep their first definition. Edges naming an
    /// unknown topic, or with a weight outside [0, 1], are dropped.
    pub fn build(topics: Vec<TopicSpec>, edges: Vec<EdgeSpec>) -> Self {
        let mut nodes: Vec<Node> = Vec::with_capacity(topics.len());
        let mut index = HashMap::with_capacity(topics.len());
        for spec in topics {
            if index.contains_key(&spec.id) {
                tracing::debug!(topic = %spec.id, "duplicate topic ignored");
                continue;
            }
            index.insert(spec.id.clone(), nodes.len());
            nodes.push(Node {
                spec,
                related: BTreeMap::new(),
            });
        }

        let mut in_edges = vec![Vec::new(); nodes.len()];
        for edge in edges {
            let (Some(&src), Some(&dst)) = (index.get(&edge.source), index.get(&edge.target))
            else {
                tracing::debug!(source = %edge.source, target = %edge.target, "edge dropped: unknown topic");
                continue;
            };
            if !(0.0..=1.0).contains(&edge.weight) {
                tracing::debug!(source = %edge.source, target = %edge.target, "edge dropped: weight out of range");
                continue;
            }
            nodes[src].related.insert(edge.target.clone(), edge.weight);
            in_edges[dst].push((src, edge.weight));
        }

        let n = nodes.len();
        Self {
            nodes,
            index,
            in_edges,
            state: RwLock::new(TrendState {
                scores: vec![BASELINE_SCORE; n],
                velocities: vec![0.0; n],
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Topic ids in table order.
    pub fn ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.spec.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Result<Topic> {
        let &idx = self
            .index
            .get(id)
            .ok_or_else(|| HurlError::topic_not_found(id))?;
        let state = self.state.read();
        Ok(self.topic_at(idx, &state))
    }

    /// Every topic in table order, scores from one consistent read.
    pub fn all(&self) -> Vec<Topic> {
        let state = self.state.read();
        (0..self.nodes.len())
            .map(|idx| self.topic_at(idx, &state))
            .collect()
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.index.get(id).map(|&i| self.nodes[i].spec.name.as_str())
    }

    pub fn tags(&self, id: &str) -> Option<&[String]> {
        self.index.get(id).map(|&i| self.nodes[i].spec.tags.as_slice())
    }

    pub fn score(&self, id: &str) -> Option<f64> {
        let &idx = self.index.get(id)?;
        Some(self.state.read().scores[idx])
    }

    pub fn velocity(&self, id: &str) -> Option<f64> {
        let &idx = self.index.get(id)?;
        Some(self.state.read().velocities[idx])
    }

    /// Current score of every topic, keyed by id.
    pub fn scores(&self) -> BTreeMap<String, f64> {
        let state = self.state.read();
        self.nodes
            .iter()
            .zip(state.scores.iter())
            .map(|(n, &s)| (n.spec.id.clone(), s))
            .collect()
    }

    /// Incoming edges of `id` as `(source id, weight)`.
    pub fn in_edges(&self, id: &str) -> Result<Vec<(String, f64)>> {
        let &idx = self
            .index
            .get(id)
            .ok_or_else(|| HurlError::topic_not_found(id))?;
        Ok(self.in_edges[idx]
            .iter()
            .map(|&(src, w)| (self.nodes[src].spec.id.clone(), w))
            .collect())
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn id_at(&self, idx: usize) -> &str {
        &self.nodes[idx].spec.id
    }

    pub(crate) fn in_edges_at(&self, idx: usize) -> &[(usize, f64)] {
        &self.in_edges[idx]
    }

    pub(crate) fn read_state(&self) -> TrendState {
        self.state.read().clone()
    }

    /// Replace scores and velocities in one write.
    pub(crate) fn commit_state(&self, next: TrendState) {
        *self.state.write() = next;
    }

    fn topic_at(&self, idx: usize, state: &TrendState) -> Topic {
        let node = &self.nodes[idx];
        Topic {
            id: node.spec.id.clone(),
            name: node.spec.name.clone(),
            tags: node.spec.tags.clone(),
            related: node.related.clone(),
            trend_score: state.scores[idx],
            velocity: state.velocities[idx],
        }
    }
}

impl Default for TopicGraph {
    fn default() -> Self {
        Self::seeded()
    }
}

type TopicRow = (&'static str, &'static str, &'static [&'static str]);

const SEED_TOPICS: &[TopicRow] = &[
    ("ai", "Artificial Intelligence", &["tech", "ai", "ml"]),
    ("crypto", "Cryptocurrency", &["tech", "crypto", "finance"]),
    ("web3", "Web3", &["tech", "crypto", "decentralization"]),
    ("cloud", "Cloud Computing", &["tech", "infrastructure"]),
    ("cybersec", "Cybersecurity", &["tech", "security"]),
    ("gaming", "Gaming", &["tech", "entertainment", "gaming"]),
    ("vr_ar", "VR/AR", &["tech", "vr", "metaverse"]),
    ("quantum", "Quantum Computing", &["tech", "science"]),
    ("robotics", "Robotics", &["tech", "automation"]),
    ("open_source", "Open Source", &["tech", "software", "community"]),
    ("politics", "Politics", &["politics", "government"]),
    ("climate", "Climate Change", &["environment", "science", "politics"]),
    ("healthcare", "Healthcare", &["health", "policy", "society"]),
    ("education", "Education", &["society", "learning"]),
    ("privacy", "Privacy Rights", &["politics", "tech", "society"]),
    ("elections", "Elections", &["politics", "democracy"]),
    ("stocks", "Stock Market", &["finance", "markets", "investing"]),
    ("real_estate", "Real Estate", &["finance", "property", "markets"]),
    ("startups", "Startups", &["business", "tech", "entrepreneurship"]),
    ("economy", "Economy", &["finance", "markets", "policy"]),
    ("job_market", "Job Market", &["employment", "economy", "careers"]),
    ("football", "Football", &["sports", "football"]),
    ("basketball", "Basketball", &["sports", "basketball"]),
    ("soccer", "Soccer", &["sports", "soccer", "football"]),
    ("esports", "Esports", &["sports", "gaming", "competitive"]),
    ("fitness", "Fitness", &["sports", "health", "wellness"]),
    ("movies", "Movies", &["entertainment", "film", "culture"]),
    ("tv", "TV Shows", &["entertainment", "television", "culture"]),
    ("music", "Music", &["entertainment", "music", "culture"]),
    ("celebrities", "Celebrities", &["entertainment", "culture", "gossip"]),
    ("memes", "Memes", &["internet", "culture", "humor"]),
    ("fashion", "Fashion", &["culture", "style", "trends"]),
    ("mental_health", "Mental Health", &["wellness", "health", "psychology"]),
    ("nutrition", "Nutrition", &["wellness", "health", "food"]),
    ("meditation", "Meditation", &["wellness", "mindfulness", "health"]),
    ("productivity", "Productivity", &["self-improvement", "work"]),
    ("travel", "Travel", &["lifestyle", "adventure", "culture"]),
    ("space", "Space Exploration", &["science", "space", "astronomy"]),
    ("biology", "Biology", &["science", "nature", "research"]),
    ("physics", "Physics", &["science", "research"]),
    ("wildlife", "Wildlife", &["nature", "conservation", "animals"]),
    ("social_media", "Social Media", &["internet", "culture", "tech"]),
    ("influencers", "Influencers", &["internet", "culture", "marketing"]),
    ("cancel_culture", "Cancel Culture", &["internet", "society", "culture"]),
    ("misinformation", "Misinformation", &["internet", "politics", "media"]),
];

// `tech` and `wellness` are tags, not topics; their edges are dropped at build.
const SEED_EDGES: &[(&str, &str, f64)] = &[
    ("ai", "tech", 0.9),
    ("ai", "quantum", 0.3),
    ("ai", "robotics", 0.6),
    ("crypto", "web3", 0.8),
    ("crypto", "stocks", 0.4),
    ("crypto", "privacy", 0.5),
    ("gaming", "esports", 0.9),
    ("gaming", "vr_ar", 0.6),
    ("climate", "politics", 0.7),
    ("climate", "wildlife", 0.5),
    ("healthcare", "mental_health", 0.6),
    ("healthcare", "nutrition", 0.5),
    ("stocks", "economy", 0.8),
    ("startups", "open_source", 0.4),
    ("startups", "ai", 0.6),
    ("fitness", "nutrition", 0.7),
    ("fitness", "wellness", 0.6),
    ("movies", "celebrities", 0.7),
    ("tv", "celebrities", 0.6),
    ("memes", "social_media", 0.8),
    ("influencers", "social_media", 0.9),
    ("cancel_culture", "social_media", 0.7),
    ("misinformation", "social_media", 0.6),
    ("misinformation", "politics", 0.5),
    ("space", "physics", 0.6),
    ("privacy", "cybersec", 0.7),
    ("education", "productivity", 0.4),
    ("job_market", "economy", 0.6),
    ("fashion", "influencers", 0.5),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_table() {
        let graph = TopicGraph::seeded();
        assert_eq!(graph.len(), 45);
        assert!(graph.contains("ai"));
        assert!(!graph.contains("tech"));
        assert_eq!(graph.name("vr_ar"), Some("VR/AR"));
    }

    #[test]
    fn test_edges_to_unknown_topics_dropped() {
        let graph = TopicGraph::seeded();
        let ai = graph.get("ai").unwrap();
        assert_eq!(ai.related.len(), 2);
        assert_eq!(ai.related.get("robotics"), Some(&0.6));
        assert!(!ai.related.contains_key("tech"));
    }

    #[test]
    fn test_in_edges() {
        let graph = TopicGraph::seeded();
        let mut incoming = graph.in_edges("social_media").unwrap();
        incoming.sort_by(|a, b| a.0.cmp(&b.0));
        let sources: Vec<&str> = incoming.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(
            sources,
            vec!["cancel_culture", "influencers", "memes", "misinformation"]
        );
        assert!(graph.in_edges("cloud").unwrap().is_empty());
    }

    #[test]
    fn test_scores_start_at_baseline() {
        let graph = TopicGraph::seeded();
        for topic in graph.all() {
            assert_eq!(topic.trend_score, BASELINE_SCORE);
            assert_eq!(topic.velocity, 0.0);
        }
    }

    #[test]
    fn test_unknown_topic_not_found() {
        let graph = TopicGraph::seeded();
        let err = graph.get("nope").unwrap_err();
        assert_eq!(err, HurlError::topic_not_found("nope"));
        assert!(graph.score("nope").is_none());
    }

    #[test]
    fn test_build_skips_duplicates_and_bad_weights() {
        let topics = vec![
            TopicSpec {
                id: "a".into(),
                name: "A".into(),
                tags: vec![],
            },
            TopicSpec {
                id: "a".into(),
                name: "Again".into(),
                tags: vec![],
            },
            TopicSpec {
                id: "b".into(),
                name: "B".into(),
                tags: vec![],
            },
        ];
        let edges = vec![
            EdgeSpec {
                source: "a".into(),
                target: "b".into(),
                weight: 1.5,
            },
            EdgeSpec {
                source: "b".into(),
                target: "a".into(),
                weight: 0.5,
            },
        ];
        let graph = TopicGraph::build(topics, edges);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.name("a"), Some("A"));
        assert!(graph.get("a").unwrap().related.is_empty());
        assert_eq!(graph.in_edges("a").unwrap(), vec![("b".to_string(), 0.5)]);
    }
}
