//! Post text synthesis: template, Markov tail, optional enhancement, style,
//! engagement.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{
    DEFAULT_ENHANCE_TIMEOUT_MS, ENHANCE_PROBABILITY, MARKOV_MAX_APPENDED, MARKOV_MAX_WORDS,
    MARKOV_PROBABILITY,
};
use crate::engagement;
use crate::enhance::{TextEnhancer, enhance_or_fallback};
use crate::markov::{MarkovModel, default_model};
use crate::persona::Persona;
use crate::post::{EngagementMetrics, StyleMetrics};
use crate::rng::SimRng;
use crate::style::{self, StyleContext};
use crate::templates::{fill, select_category, select_template};
use crate::topics::TopicGraph;

/// Topic name used when a post has no topics.
const FALLBACK_TOPIC: &str = "everything";

/// Output of one synthesis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesized {
    pub text: String,
    pub template: String,
    pub style: StyleMetrics,
    pub metrics: EngagementMetrics,
}

pub struct PostSynthesizer {
    markov: &'static MarkovModel,
    enhancer: Option<Arc<dyn TextEnhancer>>,
    enhancement_timeout: Duration,
}

impl fmt::Debug for PostSynthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostSynthesizer")
            .field("markov_states", &self.markov.len())
            .field("enhancer", &self.enhancer.as_ref().map(|e| e.name().to_string()))
            .field("enhancement_timeout", &self.enhancement_timeout)
            .finish()
    }
}

impl Default for PostSynthesizer {
    fn default() -> Self {
        Self::new(None, Duration::from_millis(DEFAULT_ENHANCE_TIMEOUT_MS))
    }
}

impl PostSynthesizer {
    pub fn new(enhancer: Option<Arc<dyn TextEnhancer>>, enhancement_timeout: Duration) -> Self {
        Self {
            markov: default_model(),
            enhancer,
            enhancement_timeout,
        }
    }

    pub fn has_enhancer(&self) -> bool {
        self.enhancer.is_some()
    }

    /// Build one post body. Every stage draws from `rng` in a fixed order, so
    /// the result depends only on the inputs, the rng state and the
    /// enhancer's answer.
    pub async fn synthesize(
        &self,
        persona: &Persona,
        topics: &[String],
        graph: &TopicGraph,
        seed: u64,
        rng: &mut SimRng,
    ) -> Synthesized {
        let topic_name = match rng.choose(topics) {
            Some(id) => graph.name(id).unwrap_or(id.as_str()),
            None => FALLBACK_TOPIC,
        };

        let category = select_category(&persona.style, rng);
        let template = select_template(category, rng);
        let mut text = fill(template, topic_name, persona.style.cynicism, rng);

        if rng.chance(MARKOV_PROBABILITY) {
            text = self.extend(&text, rng);
        }

        // Drawn even without an enhancer so the stream is the same either way.
        let wants_enhancement = rng.chance(ENHANCE_PROBABILITY);
        if wants_enhancement && let Some(enhancer) = &self.enhancer {
            text = enhance_or_fallback(
                enhancer.as_ref(),
                &text,
                &persona.context_line(),
                seed,
                self.enhancement_timeout,
            )
            .await;
        }

        let ctx = StyleContext {
            persona,
            topics,
            tech_topic: topics
                .iter()
                .any(|t| graph.tags(t).is_some_and(|tags| tags.iter().any(|g| g == "tech"))),
        };
        let (text, style) = style::decorate(&text, &ctx, rng);
        let metrics = engagement::simulate(persona, graph, topics, &text, rng);

        Synthesized {
            text,
            template: category.template_id(),
            style,
            metrics,
        }
    }

    /// Continue from the last `order` words; the chain gets a fresh
    /// `MARKOV_MAX_WORDS` budget counted from that key.
    fn extend(&self, text: &str, rng: &mut SimRng) -> String {
        let words: Vec<String> = text.split_whitespace().map(String::from).collect();
        let key = &words[words.len().saturating_sub(self.markov.order)..];
        let tail = self.markov.continue_from(key, MARKOV_MAX_WORDS, rng);
        if tail.is_empty() {
            return text.to_string();
        }
        let tail: Vec<String> = tail.into_iter().take(MARKOV_MAX_APPENDED).collect();
        format!("{text} {}", tail.join(" "))
    }
}
