//! Style decoration: emojis, hashtags, links, caps, punctuation quirks and
//! profanity masking, applied in that order.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::constants::{
    CAPS_WORD_PROBABILITY, PROFANITY_TOXICITY_THRESHOLD, QUIRK_PROBABILITY, STYLE_FLOOR,
};
use crate::persona::Persona;
use crate::post::StyleMetrics;
use crate::rng::SimRng;

static PROFANITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(fuck|shit|damn|ass|bitch)\b").unwrap());

const POSITIVE_EMOJIS: &[&str] = &["😊", "😃", "🔥", "💯", "✨", "🎉", "👏", "❤️", "🙌", "💪"];
const NEGATIVE_EMOJIS: &[&str] = &["😤", "😠", "💀", "😭", "😩", "🤦", "😑", "🙄", "😬"];
const NEUTRAL_EMOJIS: &[&str] = &["🤔", "👀", "📈", "📊", "💰", "🚀", "🎯", "⚡", "🌟", "✅"];
const TECH_EMOJIS: &[&str] = &["💻", "🤖", "🔧", "⚙️", "📱", "🖥️", "🌐", "🔌"];
const CELEBRATION_EMOJIS: &[&str] = &["🎊", "🥳", "🍾", "🏆", "🎁"];

const POSITIVE_WORDS: &[&str] = &["good", "great", "amazing", "love", "awesome", "best", "fire", "peak"];
const NEGATIVE_WORDS: &[&str] = &["bad", "terrible", "worst", "hate", "awful", "trash", "mid"];

const HASHTAGS: &[(&str, &[&str])] = &[
    ("ai", &["AI", "MachineLearning", "ArtificialIntelligence", "ML", "DeepLearning"]),
    ("crypto", &["Crypto", "Bitcoin", "Web3", "Blockchain", "DeFi"]),
    ("web3", &["Web3", "DeFi", "NFT"]),
    ("gaming", &["Gaming", "Gamer", "Esports", "GamerLife", "VideoGames"]),
    ("esports", &["Esports", "GG", "ProGaming"]),
    ("fitness", &["Fitness", "Workout", "FitnessMotivation", "GymLife", "Gains"]),
    ("climate", &["ClimateChange", "ClimateAction", "Environment", "Sustainability"]),
    ("politics", &["Politics", "Election", "Vote", "Democracy"]),
    ("elections", &["Election", "Vote"]),
    ("stocks", &["Stocks", "Investing", "StockMarket", "Trading", "Finance"]),
    ("startups", &["Startups", "BuildInPublic", "Founders"]),
    ("music", &["NewMusic", "NowPlaying"]),
    ("movies", &["Movies", "FilmTwitter"]),
    ("memes", &["Memes", "Relatable"]),
    ("space", &["Space", "Astronomy"]),
    ("mental_health", &["MentalHealth", "SelfCare"]),
];

const GENERIC_HASHTAGS: &[&str] = &["Trending", "Viral", "Thoughts", "Update", "News"];

const SAMPLE_URLS: &[&str] = &[
    "https://example.com/article",
    "https://site.io/post",
    "https://blog.net/read",
    "https://news.com/breaking",
    "https://media.org/story",
];

/// Everything the decorator needs besides the text.
#[derive(Debug, Clone, Copy)]
pub struct StyleContext<'a> {
    pub persona: &'a Persona,
    pub topics: &'a [String],
    /// Whether any of the post's topics is tagged `tech`.
    pub tech_topic: bool,
}

/// Run every decoration stage; returns the text and what was added.
pub fn decorate(text: &str, ctx: &StyleContext<'_>, rng: &mut SimRng) -> (String, StyleMetrics) {
    let (text, emojis) = add_emojis(text, ctx, rng);
    let (text, hashtags) = add_hashtags(&text, ctx, rng);
    let (text, links) = add_link(&text, ctx, rng);
    let (text, caps) = apply_caps(&text, ctx, rng);
    let text = apply_quirks(&text, ctx, rng);
    let text = mask_profanity(&text, ctx.persona.toxicity);
    (
        text,
        StyleMetrics {
            emojis,
            hashtags,
            links,
            caps,
        },
    )
}

fn emoji_pool(text: &str, tech_topic: bool) -> Vec<&'static str> {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .collect();
    let has = |list: &[&str]| words.iter().any(|w| list.contains(&w.as_str()));

    if has(POSITIVE_WORDS) {
        [POSITIVE_EMOJIS, CELEBRATION_EMOJIS].concat()
    } else if has(NEGATIVE_WORDS) {
        NEGATIVE_EMOJIS.to_vec()
    } else if tech_topic {
        [NEUTRAL_EMOJIS, TECH_EMOJIS].concat()
    } else {
        NEUTRAL_EMOJIS.to_vec()
    }
}

pub fn add_emojis(text: &str, ctx: &StyleContext<'_>, rng: &mut SimRng) -> (String, u32) {
    let pref = ctx.persona.style.emoji_preference;
    if pref < STYLE_FLOOR {
        return (text.to_string(), 0);
    }
    let max = (pref * 5.0) as usize;
    let n = rng.inclusive(0, max);
    if n == 0 {
        return (text.to_string(), 0);
    }

    let pool = emoji_pool(text, ctx.tech_topic);
    let picked: Vec<&str> = (0..n).filter_map(|_| rng.choose(&pool).copied()).collect();

    let out = if rng.chance(0.5) {
        format!("{text} {}", picked.join(" "))
    } else {
        let mut words: Vec<&str> = text.split_whitespace().collect();
        for &emoji in &picked {
            let pos = rng.inclusive(0, words.len());
            words.insert(pos, emoji);
        }
        words.join(" ")
    };
    (out, picked.len() as u32)
}

pub fn add_hashtags(text: &str, ctx: &StyleContext<'_>, rng: &mut SimRng) -> (String, u32) {
    let prop = ctx.persona.style.hashtag_propensity;
    if prop < STYLE_FLOOR {
        return (text.to_string(), 0);
    }
    let max = (prop * 4.0) as usize;
    let n = rng.inclusive(0, max);
    if n == 0 {
        return (text.to_string(), 0);
    }

    let mut pool: Vec<&str> = Vec::new();
    for topic in ctx.topics {
        if let Some((_, tags)) = HASHTAGS.iter().find(|(t, _)| *t == topic.as_str()) {
            pool.extend_from_slice(tags);
        }
    }
    if pool.is_empty() {
        pool.extend_from_slice(GENERIC_HASHTAGS);
    }

    let tags: Vec<String> = (0..n)
        .filter_map(|_| rng.choose(&pool).map(|t| format!("#{t}")))
        .collect();
    (format!("{text} {}", tags.join(" ")), tags.len() as u32)
}

pub fn add_link(text: &str, ctx: &StyleContext<'_>, rng: &mut SimRng) -> (String, u32) {
    if !rng.chance(ctx.persona.style.link_propensity) {
        return (text.to_string(), 0);
    }
    match rng.choose(SAMPLE_URLS) {
        Some(url) => (format!("{text} {url}"), 1),
        None => (text.to_string(), 0),
    }
}

/// Random shouting. Hashtags and URLs are never upper-cased.
pub fn apply_caps(text: &str, ctx: &StyleContext<'_>, rng: &mut SimRng) -> (String, f64) {
    let prob = ctx.persona.style.emoji_preference * 0.3;
    if !rng.chance(prob) {
        return (text.to_string(), 0.0);
    }

    let mut words: Vec<String> = text.split_whitespace().map(String::from).collect();
    if words.is_empty() {
        return (String::new(), 0.0);
    }
    let mut eligible = 0usize;
    let mut capped = 0usize;
    for word in words.iter_mut() {
        if !caps_eligible(word) {
            continue;
        }
        eligible += 1;
        if rng.chance(CAPS_WORD_PROBABILITY) {
            *word = word.to_uppercase();
            capped += 1;
        }
    }
    let ratio = if eligible == 0 {
        0.0
    } else {
        capped as f64 / eligible as f64
    };
    (words.join(" "), ratio)
}

/// Plain words only: no hashtags, URLs or emoji-only tokens.
fn caps_eligible(word: &str) -> bool {
    !word.starts_with('#') && !word.starts_with("http") && word.chars().any(char::is_alphabetic)
}

pub fn apply_quirks(text: &str, ctx: &StyleContext<'_>, rng: &mut SimRng) -> String {
    let mut out = text.to_string();
    for quirk in &ctx.persona.style.punctuation_quirks {
        if rng.chance(QUIRK_PROBABILITY) {
            out.push_str(quirk);
        }
    }
    out
}

/// Replace blocklisted words with their first letter plus asterisks, unless
/// the author is toxic enough to keep them.
pub fn mask_profanity(text: &str, toxicity: f64) -> String {
    if toxicity > PROFANITY_TOXICITY_THRESHOLD {
        return text.to_string();
    }
    PROFANITY
        .replace_all(text, |caps: &Captures<'_>| {
            let word = &caps[0];
            let mut chars = word.chars();
            let first = chars.next().map(String::from).unwrap_or_default();
            format!("{first}{}", "*".repeat(chars.count()))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{PersonaCatalog, PersonaSpec, PersonaStyle};

    fn persona(style: PersonaStyle, toxicity: f64) -> Persona {
        let catalog = PersonaCatalog::empty();
        let mut spec = PersonaSpec::new("Styled", "styled");
        spec.style = Some(style);
        spec.toxicity = toxicity;
        (*catalog.create(spec).unwrap()).clone()
    }

    fn quiet() -> PersonaStyle {
        PersonaStyle {
            emoji_preference: 0.0,
            hashtag_propensity: 0.0,
            link_propensity: 0.0,
            ..PersonaStyle::default()
        }
    }

    #[test]
    fn test_mask_profanity() {
        assert_eq!(mask_profanity("damn that is wild", 0.1), "d*** that is wild");
        assert_eq!(mask_profanity("SHIT happens", 0.1), "S*** happens");
        assert_eq!(mask_profanity("classic assumption", 0.1), "classic assumption");
        assert_eq!(mask_profanity("damn", 0.9), "damn");
    }

    #[test]
    fn test_quiet_persona_untouched() {
        let p = persona(quiet(), 0.1);
        let topics = vec!["ai".to_string()];
        let ctx = StyleContext {
            persona: &p,
            topics: &topics,
            tech_topic: true,
        };
        let mut rng = SimRng::seeded(42);
        let (text, metrics) = decorate("AI is wild", &ctx, &mut rng);
        assert_eq!(text, "AI is wild");
        assert_eq!(metrics, StyleMetrics::default());
    }

    #[test]
    fn test_counts_match_text() {
        let p = persona(
            PersonaStyle {
                emoji_preference: 1.0,
                hashtag_propensity: 1.0,
                link_propensity: 1.0,
                ..PersonaStyle::default()
            },
            0.1,
        );
        let topics = vec!["crypto".to_string()];
        let ctx = StyleContext {
            persona: &p,
            topics: &topics,
            tech_topic: true,
        };
        for seed in 0..50 {
            let mut rng = SimRng::seeded(seed);
            let (text, metrics) = decorate("crypto is peak", &ctx, &mut rng);
            let hashtags = text.split_whitespace().filter(|w| w.starts_with('#')).count();
            assert_eq!(hashtags as u32, metrics.hashtags, "{text}");
            assert_eq!(metrics.links, 1);
            assert!(text.contains("https://"));
            assert!((0.0..=1.0).contains(&metrics.caps));
        }
    }

    #[test]
    fn test_hashtags_fall_back_to_generic() {
        let p = persona(
            PersonaStyle {
                hashtag_propensity: 1.0,
                ..quiet()
            },
            0.1,
        );
        let topics = vec!["wildlife".to_string()];
        let ctx = StyleContext {
            persona: &p,
            topics: &topics,
            tech_topic: false,
        };
        for seed in 0..20 {
            let mut rng = SimRng::seeded(seed);
            let (text, n) = add_hashtags("hello", &ctx, &mut rng);
            for tag in text.split_whitespace().skip(1) {
                assert!(GENERIC_HASHTAGS.contains(&&tag[1..]), "{tag}");
            }
            assert!(n <= 4);
        }
    }

    #[test]
    fn test_positive_text_uses_positive_pool() {
        let pool = emoji_pool("this is peak", false);
        assert!(pool.contains(&"🎉"));
        assert!(!pool.contains(&"💀"));
        let pool = emoji_pool("kinda mid tbh", false);
        assert!(pool.contains(&"💀"));
        let pool = emoji_pool("cloud news", true);
        assert!(pool.contains(&"🤖"));
    }

    #[test]
    fn test_quirks_only_appended() {
        let p = persona(
            PersonaStyle {
                punctuation_quirks: vec!["...".into()],
                ..quiet()
            },
            0.1,
        );
        let ctx = StyleContext {
            persona: &p,
            topics: &[],
            tech_topic: false,
        };
        let mut rng = SimRng::seeded(4);
        let out = apply_quirks("hmm", &ctx, &mut rng);
        assert!(out == "hmm" || out == "hmm...");
    }

    #[test]
    fn test_caps_skips_hashtags_and_urls() {
        let p = persona(
            PersonaStyle {
                emoji_preference: 1.0,
                ..quiet()
            },
            0.1,
        );
        let ctx = StyleContext {
            persona: &p,
            topics: &[],
            tech_topic: false,
        };
        for seed in 0..100 {
            let mut rng = SimRng::seeded(seed);
            let (out, _) = apply_caps("a b c #tag https://x.io/y", &ctx, &mut rng);
            assert!(out.contains("#tag"));
            assert!(out.contains("https://x.io/y"));
        }
    }

    #[test]
    fn test_caps_ratio_counts_plain_words_only() {
        let p = persona(
            PersonaStyle {
                emoji_preference: 1.0,
                ..quiet()
            },
            0.1,
        );
        let ctx = StyleContext {
            persona: &p,
            topics: &[],
            tech_topic: false,
        };
        let mut saw_caps = false;
        for seed in 0..200 {
            let mut rng = SimRng::seeded(seed);
            let (out, ratio) = apply_caps("a b c #tag https://x.io/y 🔥", &ctx, &mut rng);
            let upper = out
                .split_whitespace()
                .take(3)
                .filter(|w| *w == w.to_uppercase())
                .count();
            assert!((ratio - upper as f64 / 3.0).abs() < 1e-12, "{out} {ratio}");
            saw_caps |= upper > 0;
        }
        assert!(saw_caps);

        let mut rng = SimRng::seeded(1);
        let (_, ratio) = apply_caps("🔥 #tag https://x.io/y", &ctx, &mut rng);
        assert_eq!(ratio, 0.0);
    }
}
