//! Post templates and the vocabularies that fill their slots.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::persona::PersonaStyle;
use crate::rng::SimRng;

static SLOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    HotTake,
    Observation,
    Question,
    Statement,
    Reaction,
    Announcement,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::HotTake,
        Category::Observation,
        Category::Question,
        Category::Statement,
        Category::Reaction,
        Category::Announcement,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::HotTake => "hot_take",
            Category::Observation => "observation",
            Category::Question => "question",
            Category::Statement => "statement",
            Category::Reaction => "reaction",
            Category::Announcement => "announcement",
        }
    }

    /// Lineage id recorded on posts built from this category.
    pub fn template_id(self) -> String {
        format!("{}_v1", self.name())
    }

    /// Selection weight for a persona with this style.
    pub fn weight(self, style: &PersonaStyle) -> f64 {
        match self {
            Category::HotTake => style.hot_take_factor,
            Category::Observation => 0.3,
            Category::Question => 0.2,
            Category::Statement => 0.3,
            Category::Reaction => style.emoji_preference * 0.4,
            Category::Announcement => 0.1,
        }
    }

    pub fn templates(self) -> &'static [&'static str] {
        match self {
            Category::HotTake => &[
                "Hot take: {topic} is {adjective}",
                "Unpopular opinion: {topic} {verb}",
                "{topic}? More like {negative_prefix}{topic}",
                "Everyone's wrong about {topic}. Here's why:",
                "The problem with {topic} is {complaint}",
            ],
            Category::Observation => &[
                "Just noticed that {topic} is {trend_verb}",
                "Is it just me or is {topic} {adjective} lately?",
                "{topic} hitting different today",
                "The {topic} situation is {adjective}",
                "Watching {topic} unfold like",
            ],
            Category::Question => &[
                "Why is {topic} {trend_verb}?",
                "What's the deal with {topic}?",
                "Am I the only one who thinks {topic} is {adjective}?",
                "Can someone explain {topic} to me?",
                "Thoughts on {topic}?",
            ],
            Category::Statement => &[
                "{topic} is {adjective}",
                "Just {verb} some {topic}",
                "{topic}: a thread",
                "My take on {topic}",
                "{topic} >> {other_topic}",
            ],
            Category::Reaction => &[
                "{emotion} about {topic} rn",
                "{topic} got me like",
                "When {topic} {event}",
                "Me watching {topic}:",
                "*{action}* at {topic}",
            ],
            Category::Announcement => &[
                "New: {topic} just {event}",
                "BREAKING: {topic} {event}",
                "{topic} update: {news}",
                "This just in: {topic}",
                "PSA: {topic} is {status}",
            ],
        }
    }
}

/// Weighted draw over categories using the persona's style.
pub fn select_category(style: &PersonaStyle, rng: &mut SimRng) -> Category {
    let weights: Vec<f64> = Category::ALL.iter().map(|c| c.weight(style)).collect();
    rng.weighted_index(&weights)
        .map_or(Category::Statement, |idx| Category::ALL[idx])
}

/// Uniform draw within a category.
pub fn select_template(category: Category, rng: &mut SimRng) -> &'static str {
    let templates = category.templates();
    templates[rng.range(0, templates.len())]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Positive,
    Negative,
    Neutral,
}

const ADJECTIVES: &[(&str, Tone)] = &[
    ("wild", Tone::Neutral),
    ("crazy", Tone::Neutral),
    ("insane", Tone::Neutral),
    ("interesting", Tone::Positive),
    ("weird", Tone::Neutral),
    ("broken", Tone::Negative),
    ("overrated", Tone::Negative),
    ("underrated", Tone::Positive),
    ("revolutionary", Tone::Positive),
    ("outdated", Tone::Negative),
    ("amazing", Tone::Positive),
    ("terrible", Tone::Negative),
    ("mid", Tone::Negative),
    ("peak", Tone::Positive),
    ("bussin", Tone::Positive),
    ("sus", Tone::Negative),
    ("fire", Tone::Positive),
    ("trash", Tone::Negative),
    ("iconic", Tone::Positive),
    ("cringe", Tone::Negative),
];

const VERBS: &[&str] = &[
    "slaps",
    "hits different",
    "goes hard",
    "misses",
    "fails",
    "succeeds",
    "matters",
    "sucks",
    "rocks",
    "fell off",
    "came back",
    "peaked",
];

const TREND_VERBS: &[&str] = &[
    "trending",
    "blowing up",
    "dying",
    "everywhere",
    "back",
    "over",
    "having a moment",
    "mainstream",
    "niche",
];

const EMOTIONS: &[&str] = &[
    "Excited",
    "Worried",
    "Confused",
    "Angry",
    "Happy",
    "Disappointed",
    "Shocked",
    "Impressed",
    "Frustrated",
    "Hyped",
    "Concerned",
];

const ACTIONS: &[&str] = &["screaming", "crying", "laughing", "dying", "shaking", "sweating"];

const COMPLAINTS: &[&str] = &[
    "nobody talks about it",
    "everyone ignores the real issue",
    "the hype is overblown",
    "it's too complicated",
    "it's too simple",
    "the timing is off",
];

const EVENTS: &[&str] = &[
    "changed everything",
    "broke the internet",
    "went viral",
    "dropped unexpectedly",
    "made waves",
    "caused controversy",
];

const STATUS_WORDS: &[&str] = &["live", "dead", "back", "canceled", "revived", "trending", "fading"];

const NEGATIVE_PREFIXES: &[&str] = &["not-", "un-", "anti-"];

const OTHER_TOPICS: &[&str] = &["everything", "the rest", "alternatives"];

fn pick(rng: &mut SimRng, words: &[&'static str]) -> &'static str {
    rng.choose(words).copied().unwrap_or("")
}

/// Adjective weighted by tone: cynics lean negative, optimists positive.
fn pick_adjective(rng: &mut SimRng, cynicism: f64) -> &'static str {
    let weights: Vec<f64> = ADJECTIVES
        .iter()
        .map(|(_, tone)| match tone {
            Tone::Positive => 1.0 - cynicism,
            Tone::Negative => cynicism,
            Tone::Neutral => 0.5,
        })
        .collect();
    rng.weighted_index(&weights)
        .map_or("wild", |idx| ADJECTIVES[idx].0)
}

/// Substitute every `{slot}` left to right, one draw per slot.
///
/// `{topic}` is the display name and costs no draw. Unknown slots are left
/// untouched.
pub fn fill(template: &str, topic_name: &str, cynicism: f64, rng: &mut SimRng) -> String {
    SLOT.replace_all(template, |caps: &Captures<'_>| {
        let word = match &caps[1] {
            "topic" => return topic_name.to_string(),
            "adjective" => pick_adjective(rng, cynicism),
            "verb" => pick(rng, VERBS),
            "trend_verb" => pick(rng, TREND_VERBS),
            "emotion" => pick(rng, EMOTIONS),
            "action" => pick(rng, ACTIONS),
            "complaint" => pick(rng, COMPLAINTS),
            "negative_prefix" => pick(rng, NEGATIVE_PREFIXES),
            "event" | "news" => pick(rng, EVENTS),
            "status" => pick(rng, STATUS_WORDS),
            "other_topic" => pick(rng, OTHER_TOPICS),
            _ => return caps[0].to_string(),
        };
        word.to_string()
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_template_fills_completely() {
        let mut rng = SimRng::seeded(42);
        for category in Category::ALL {
            for template in category.templates() {
                let text = fill(template, "Artificial Intelligence", 0.5, &mut rng);
                assert!(!text.contains('{'), "unfilled: {text}");
                assert!(text.contains("Artificial Intelligence"));
            }
        }
    }

    #[test]
    fn test_fill_is_deterministic() {
        let template = "Hot take: {topic} is {adjective} and {verb}";
        let a = fill(template, "Gaming", 0.5, &mut SimRng::seeded(3));
        let b = fill(template, "Gaming", 0.5, &mut SimRng::seeded(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_slot_untouched() {
        let mut rng = SimRng::seeded(1);
        assert_eq!(fill("{mystery} {topic}", "AI", 0.5, &mut rng), "{mystery} AI");
    }

    #[test]
    fn test_full_cynic_never_positive() {
        let mut rng = SimRng::seeded(8);
        for _ in 0..200 {
            let adj = pick_adjective(&mut rng, 1.0);
            let tone = ADJECTIVES.iter().find(|(w, _)| *w == adj).unwrap().1;
            assert_ne!(tone, Tone::Positive, "{adj}");
        }
    }

    #[test]
    fn test_reaction_weight_follows_emoji_preference() {
        let style = PersonaStyle {
            emoji_preference: 0.0,
            hot_take_factor: 0.0,
            ..PersonaStyle::default()
        };
        let mut rng = SimRng::seeded(5);
        for _ in 0..500 {
            let c = select_category(&style, &mut rng);
            assert_ne!(c, Category::Reaction);
            assert_ne!(c, Category::HotTake);
        }
    }

    #[test]
    fn test_template_id() {
        assert_eq!(Category::HotTake.template_id(), "hot_take_v1");
    }
}
