//! Topic adoption: how likely a persona is to post about each topic right now.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ADOPTION_ALPHA, ADOPTION_BETA, ADOPTION_DELTA, ADOPTION_GAMMA, PEER_RECENCY_SCALE,
    RECENCY_PENALTY_SCALE,
};
use crate::post::Post;
use crate::rng::SimRng;
use crate::topics::TopicGraph;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdoptionModel {
    /// Weight of the topic trend score.
    pub alpha: f64,
    /// Weight of peer influence.
    pub beta: f64,
    /// Weight of persona interest.
    pub gamma: f64,
    /// Weight of the recency penalty; subtracted.
    pub delta: f64,
}

impl Default for AdoptionModel {
    fn default() -> Self {
        Self {
            alpha: ADOPTION_ALPHA,
            beta: ADOPTION_BETA,
            gamma: ADOPTION_GAMMA,
            delta: ADOPTION_DELTA,
        }
    }
}

impl AdoptionModel {
    /// Adoption probability for every topic in the graph.
    ///
    /// `recent_topics` is newest first; a topic's penalty uses its first
    /// position in that list.
    pub fn compute(
        &self,
        graph: &TopicGraph,
        interests: &BTreeMap<String, f64>,
        peer_influence: &BTreeMap<String, f64>,
        recent_topics: &[String],
    ) -> BTreeMap<String, f64> {
        graph
            .scores()
            .into_iter()
            .map(|(topic, trend)| {
                let peer = peer_influence.get(&topic).copied().unwrap_or(0.0);
                let interest = interests.get(&topic).copied().unwrap_or(0.0);
                let penalty = recency_penalty(&topic, recent_topics);
                let logit = self.alpha * trend + self.beta * peer + self.gamma * interest
                    - self.delta * penalty;
                (topic, sigmoid(logit))
            })
            .collect()
    }
}

/// `e^(-index / 3)` for the first index of `topic` in `recent`, else 0.
pub fn recency_penalty(topic: &str, recent: &[String]) -> f64 {
    recent
        .iter()
        .position(|t| t == topic)
        .map_or(0.0, |idx| (-(idx as f64) / RECENCY_PENALTY_SCALE).exp())
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Draw up to `k` distinct topics, weighted by probability.
///
/// Probabilities are normalized first; when all are zero every candidate is
/// equally likely. Returns `min(k, probs.len())` ids.
pub fn sample_topics(probs: &BTreeMap<String, f64>, k: usize, rng: &mut SimRng) -> Vec<String> {
    let ids: Vec<&String> = probs.keys().collect();
    let weights: Vec<f64> = probs.values().copied().collect();
    rng.sample_weighted_without_replacement(&weights, k)
        .into_iter()
        .map(|idx| ids[idx].clone())
        .collect()
}

/// Recency-weighted share of recent posts mentioning each topic.
///
/// `recent` is oldest first, as the store returns it. Posts by
/// `exclude_persona` are skipped. Values are scaled so the most-discussed
/// topic gets 1.0.
pub fn peer_influence(recent: &[Arc<Post>], exclude_persona: &str) -> BTreeMap<String, f64> {
    let mut mass: BTreeMap<String, f64> = BTreeMap::new();
    for (age, post) in recent
        .iter()
        .rev()
        .filter(|p| p.persona_id != exclude_persona)
        .enumerate()
    {
        let weight = (-(age as f64) / PEER_RECENCY_SCALE).exp();
        for topic in &post.topics {
            *mass.entry(topic.clone()).or_insert(0.0) += weight;
        }
    }

    let max = mass.values().copied().fold(0.0, f64::max);
    if max > 0.0 {
        for v in mass.values_mut() {
            *v /= max;
        }
    }
    mass
}
