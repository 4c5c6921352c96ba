//! Word-level Markov chain used to ramble on after a template.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::constants::MARKOV_ORDER;
use crate::rng::SimRng;

/// Transition table: `order`-word prefix → `[(next word, count)]`.
///
/// Candidate lists keep first-seen order so draws are reproducible.
#[derive(Debug, Clone, Default)]
pub struct MarkovModel {
    pub order: usize,
    transitions: HashMap<Vec<String>, Vec<(String, u32)>>,
}

impl MarkovModel {
    /// Train on whitespace-tokenized lines. Lines shorter than `order + 1`
    /// words contribute nothing.
    pub fn train<'a>(lines: impl IntoIterator<Item = &'a str>, order: usize) -> Self {
        let order = order.max(1);
        let mut transitions: HashMap<Vec<String>, Vec<(String, u32)>> = HashMap::new();
        for line in lines {
            let words: Vec<String> = line.split_whitespace().map(normalize).collect();
            for window in words.windows(order + 1) {
                let prefix = window[..order].to_vec();
                add_transition(&mut transitions, prefix, window[order].clone());
            }
        }
        Self { order, transitions }
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Extend `seed` until it is `max_words` long or the chain runs dry.
    ///
    /// Returns only the new words. Seeds shorter than the order get nothing.
    pub fn continue_from(&self, seed: &[String], max_words: usize, rng: &mut SimRng) -> Vec<String> {
        if seed.len() < self.order {
            return Vec::new();
        }
        let mut state: Vec<String> = seed[seed.len() - self.order..]
            .iter()
            .map(|w| normalize(w))
            .collect();
        let mut out = Vec::new();

        while seed.len() + out.len() < max_words {
            let Some(next) = self.pick_next(&state, rng) else {
                break;
            };
            state.remove(0);
            state.push(next.clone());
            out.push(next);
        }
        out
    }

    fn pick_next(&self, state: &[String], rng: &mut SimRng) -> Option<String> {
        let options = self.transitions.get(state)?;
        let weights: Vec<f64> = options.iter().map(|(_, count)| *count as f64).collect();
        let idx = rng.weighted_index(&weights)?;
        Some(options[idx].0.clone())
    }
}

fn add_transition(
    transitions: &mut HashMap<Vec<String>, Vec<(String, u32)>>,
    prefix: Vec<String>,
    next: String,
) {
    let options = transitions.entry(prefix).or_default();
    if let Some(entry) = options.iter_mut().find(|(word, _)| *word == next) {
        entry.1 += 1;
    } else {
        options.push((next, 1));
    }
}

/// Lowercase and strip surrounding punctuation so template words match corpus keys.
fn normalize(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .to_lowercase()
}

const CORPUS: &[&str] = &[
    "the quick brown fox jumps over the lazy dog",
    "artificial intelligence is changing the world",
    "cryptocurrency has revolutionized finance",
    "social media connects people across the globe",
    "climate change requires urgent action",
    "technology advances at an exponential rate",
    "education shapes the future generation",
    "healthcare innovation saves lives every day",
    "sports bring communities together",
    "music transcends cultural boundaries",
    "movies tell stories that inspire us",
    "gaming has become mainstream entertainment",
    "productivity tools help us work smarter",
    "wellness practices improve mental health",
    "science explores the unknown frontiers",
    "honestly this is wild and nobody saw it coming",
    "it is overrated and everyone knows it",
    "it is mid at best and that is being generous",
    "the hype is overblown if you ask me",
    "hitting different today and i am here for it",
    "got me like i need a minute",
    "unfold like a slow motion train wreck",
    "explain it to me like i am five",
    "a thread on why this matters more than you think",
    "is trending again and i have questions",
    "is everywhere right now and i cannot escape it",
    "is peak and nobody can convince me otherwise",
    "changed everything and we are not ready for it",
    "went viral for all the wrong reasons",
    "broke the internet again this morning",
    "the timing is off and everyone can see it",
    "thoughts on this are welcome in the replies",
    "about this rn and i cannot stop thinking about it",
];

static DEFAULT_MODEL: LazyLock<MarkovModel> =
    LazyLock::new(|| MarkovModel::train(CORPUS.iter().copied(), MARKOV_ORDER));

/// The chain trained once on the built-in corpus.
pub fn default_model() -> &'static MarkovModel {
    &DEFAULT_MODEL
}
