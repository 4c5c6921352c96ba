//! Simulated audience reaction for a finished post.

use crate::persona::Persona;
use crate::post::EngagementMetrics;
use crate::rng::SimRng;
use crate::topics::TopicGraph;

/// Reach multiplier in [1, 100] from persona influence.
pub fn base_reach(persona: &Persona) -> f64 {
    1.0 + persona.influence * 99.0
}

/// `1 + mean trend score / 10`, so in [1, 2]. Unknown topics score zero.
pub fn topic_boost(graph: &TopicGraph, topics: &[String]) -> f64 {
    if topics.is_empty() {
        return 1.0;
    }
    let total: f64 = topics.iter().filter_map(|t| graph.score(t)).sum();
    1.0 + (total / topics.len() as f64) / 10.0
}

/// Longer posts get slightly more engagement, capped at double.
pub fn length_factor(text: &str) -> f64 {
    let words = text.split_whitespace().count() as f64;
    (1.0 + words / 100.0).min(2.0)
}

pub fn simulate(
    persona: &Persona,
    graph: &TopicGraph,
    topics: &[String],
    text: &str,
    rng: &mut SimRng,
) -> EngagementMetrics {
    let mean = base_reach(persona) * topic_boost(graph, topics) * length_factor(text) * 50.0;
    let impressions = (rng.exponential(mean) as u64).max(1);
    let share = |rng: &mut SimRng, a: f64, b: f64| (impressions as f64 * rng.beta(a, b)) as u64;

    let likes = share(rng, 2.0, 10.0);
    let replies = share(rng, 1.0, 20.0);
    let quotes = share(rng, 1.0, 50.0);

    EngagementMetrics {
        likes,
        replies,
        quotes,
        impressions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{PersonaCatalog, PersonaSpec};
    use crate::trends::TrendEngine;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn persona(influence: f64) -> Persona {
        let mut spec = PersonaSpec::new("Reach", "reach");
        spec.influence = Some(influence);
        (*PersonaCatalog::empty().create(spec).unwrap()).clone()
    }

    #[test]
    fn test_base_reach_bounds() {
        assert_relative_eq!(base_reach(&persona(0.0)), 1.0);
        assert_relative_eq!(base_reach(&persona(1.0)), 100.0);
    }

    #[test]
    fn test_length_factor_caps() {
        assert_relative_eq!(length_factor(""), 1.0);
        assert_relative_eq!(length_factor(&"w ".repeat(50)), 1.5);
        assert_relative_eq!(length_factor(&"w ".repeat(500)), 2.0);
    }

    #[test]
    fn test_topic_boost_tracks_trend() {
        let graph = Arc::new(TopicGraph::seeded());
        let topics = vec!["ai".to_string()];
        let quiet = topic_boost(&graph, &topics);
        assert_relative_eq!(quiet, 1.01);

        let engine = TrendEngine::new(Arc::clone(&graph));
        engine.inject_shock_at("ai", 10.0, 100.0, 0.0).unwrap();
        engine.tick_at(0.0).unwrap();
        assert!(topic_boost(&graph, &topics) > 1.9);
        assert_eq!(topic_boost(&graph, &[]), 1.0);
    }

    #[test]
    fn test_metrics_ordering() {
        let graph = TopicGraph::seeded();
        let p = persona(0.5);
        let topics = vec!["ai".to_string()];
        for seed in 0..100 {
            let m = simulate(&p, &graph, &topics, "some text", &mut SimRng::seeded(seed));
            assert!(m.impressions >= 1);
            assert!(m.likes <= m.impressions);
            assert!(m.replies <= m.impressions);
            assert!(m.quotes <= m.impressions);
        }
    }

    #[test]
    fn test_influence_drives_reach() {
        let graph = TopicGraph::seeded();
        let topics = vec!["ai".to_string()];
        let total = |p: &Persona| -> u64 {
            (0..200)
                .map(|s| simulate(p, &graph, &topics, "x", &mut SimRng::seeded(s)).impressions)
                .sum()
        };
        assert!(total(&persona(0.9)) > total(&persona(0.1)) * 5);
    }
}
