//! Synthetic authors and the catalog that owns them.
//!
//! The catalog starts with a hand-written seed cohort plus a generated
//! cohort drawn from a fixed catalog seed, so persona ids and traits are
//! identical across runs with the same seed.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_INFLUENCE;
use crate::error::{HurlError, Result};
use crate::rng::SimRng;

/// Writing-style markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaStyle {
    pub emoji_preference: f64,
    pub hashtag_propensity: f64,
    pub link_propensity: f64,
    pub cynicism: f64,
    pub hot_take_factor: f64,
    pub reading_level: u8,
    pub punctuation_quirks: Vec<String>,
    pub slang_set: Vec<String>,
}

impl Default for PersonaStyle {
    fn default() -> Self {
        Self {
            emoji_preference: 0.5,
            hashtag_propensity: 0.2,
            link_propensity: 0.1,
            cynicism: 0.5,
            hot_take_factor: 0.3,
            reading_level: 8,
            punctuation_quirks: Vec::new(),
            slang_set: Vec::new(),
        }
    }
}

/// Posting behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaBehavior {
    pub posting_rate_per_hour: f64,
    pub burstiness: f64,
    pub reply_propensity: f64,
    pub quote_propensity: f64,
    /// Language code → relative weight.
    pub language_distribution: BTreeMap<String, f64>,
}

impl Default for PersonaBehavior {
    fn default() -> Self {
        Self {
            posting_rate_per_hour: 1.0,
            burstiness: 0.5,
            reply_propensity: 0.3,
            quote_propensity: 0.1,
            language_distribution: BTreeMap::from([("en".to_string(), 1.0)]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StanceAxis {
    Tech,
    Politics,
    Sports,
    Markets,
    PopCulture,
    Wellness,
}

impl StanceAxis {
    pub const ALL: [StanceAxis; 6] = [
        StanceAxis::Tech,
        StanceAxis::Politics,
        StanceAxis::Sports,
        StanceAxis::Markets,
        StanceAxis::PopCulture,
        StanceAxis::Wellness,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StanceAxis::Tech => "tech",
            StanceAxis::Politics => "politics",
            StanceAxis::Sports => "sports",
            StanceAxis::Markets => "markets",
            StanceAxis::PopCulture => "pop_culture",
            StanceAxis::Wellness => "wellness",
        }
    }
}

/// Opinion vector, each axis in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stances {
    pub tech: f64,
    pub politics: f64,
    pub sports: f64,
    pub markets: f64,
    pub pop_culture: f64,
    pub wellness: f64,
}

impl Stances {
    pub fn get(&self, axis: StanceAxis) -> f64 {
        match axis {
            StanceAxis::Tech => self.tech,
            StanceAxis::Politics => self.politics,
            StanceAxis::Sports => self.sports,
            StanceAxis::Markets => self.markets,
            StanceAxis::PopCulture => self.pop_culture,
            StanceAxis::Wellness => self.wellness,
        }
    }

    pub fn set(&mut self, axis: StanceAxis, value: f64) {
        let slot = match axis {
            StanceAxis::Tech => &mut self.tech,
            StanceAxis::Politics => &mut self.politics,
            StanceAxis::Sports => &mut self.sports,
            StanceAxis::Markets => &mut self.markets,
            StanceAxis::PopCulture => &mut self.pop_culture,
            StanceAxis::Wellness => &mut self.wellness,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub display_name: String,
    pub handle: String,
    pub bio: String,
    /// Topic id → independent affinity in [0, 1].
    pub interests: BTreeMap<String, f64>,
    pub style: PersonaStyle,
    pub behavior: PersonaBehavior,
    pub stances: Stances,
    pub toxicity: f64,
    #[serde(alias = "influence_score")]
    pub influence: f64,
}

impl Persona {
    pub fn interest(&self, topic_id: &str) -> f64 {
        self.interests.get(topic_id).copied().unwrap_or(0.0)
    }

    /// Short description handed to the text enhancer.
    pub fn context_line(&self) -> String {
        format!(
            "cynicism={:.2}, reading_level={}",
            self.style.cynicism, self.style.reading_level
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(HurlError::invalid("persona id must not be blank"));
        }
        validate_fields(self)
    }
}

/// Caller-supplied persona definition for create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaSpec {
    pub display_name: String,
    pub handle: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub interests: BTreeMap<String, f64>,
    #[serde(default)]
    pub style: Option<PersonaStyle>,
    #[serde(default)]
    pub behavior: Option<PersonaBehavior>,
    #[serde(default)]
    pub stances: Option<Stances>,
    #[serde(default = "default_toxicity")]
    pub toxicity: f64,
    #[serde(default)]
    pub influence: Option<f64>,
}

fn default_toxicity() -> f64 {
    0.1
}

impl PersonaSpec {
    pub fn new(display_name: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            handle: handle.into(),
            bio: String::new(),
            interests: BTreeMap::new(),
            style: None,
            behavior: None,
            stances: None,
            toxicity: default_toxicity(),
            influence: None,
        }
    }

    fn into_persona(self, id: String) -> Persona {
        Persona {
            id,
            display_name: self.display_name,
            handle: self.handle,
            bio: self.bio,
            interests: self.interests,
            style: self.style.unwrap_or_default(),
            behavior: self.behavior.unwrap_or_default(),
            stances: self.stances.unwrap_or_default(),
            toxicity: self.toxicity,
            influence: self.influence.unwrap_or(DEFAULT_INFLUENCE),
        }
    }
}

fn validate_fields(persona: &Persona) -> Result<()> {
    let Persona {
        display_name,
        handle,
        interests,
        style,
        behavior,
        stances,
        toxicity,
        influence,
        ..
    } = persona;
    if display_name.trim().is_empty() {
        return Err(HurlError::invalid("display_name must not be blank"));
    }
    if handle.trim().is_empty() {
        return Err(HurlError::invalid("handle must not be blank"));
    }
    for (topic, &weight) in interests {
        if topic.trim().is_empty() {
            return Err(HurlError::invalid("interest topic id must not be blank"));
        }
        unit("interest weight", weight)?;
    }

    unit("emoji_preference", style.emoji_preference)?;
    unit("hashtag_propensity", style.hashtag_propensity)?;
    unit("link_propensity", style.link_propensity)?;
    unit("cynicism", style.cynicism)?;
    unit("hot_take_factor", style.hot_take_factor)?;
    if !(1..=20).contains(&style.reading_level) {
        return Err(HurlError::invalid(format!(
            "reading_level must be within 1..=20, got {}",
            style.reading_level
        )));
    }

    if !behavior.posting_rate_per_hour.is_finite() || behavior.posting_rate_per_hour < 0.0 {
        return Err(HurlError::invalid("posting_rate_per_hour must be >= 0"));
    }
    unit("burstiness", behavior.burstiness)?;
    unit("reply_propensity", behavior.reply_propensity)?;
    unit("quote_propensity", behavior.quote_propensity)?;
    for (lang, &weight) in &behavior.language_distribution {
        if lang.trim().is_empty() {
            return Err(HurlError::invalid("language code must not be blank"));
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(HurlError::invalid(format!(
                "language weight for {lang} must be >= 0"
            )));
        }
    }

    for axis in StanceAxis::ALL {
        let v = stances.get(axis);
        if !(-1.0..=1.0).contains(&v) {
            return Err(HurlError::invalid(format!(
                "stance {} must be within [-1, 1], got {v}",
                axis.name()
            )));
        }
    }

    unit("toxicity", *toxicity)?;
    unit("influence", *influence)
}

fn unit(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(HurlError::invalid(format!(
            "{field} must be within [0, 1], got {value}"
        )))
    }
}

#[derive(Debug, Default)]
struct CatalogInner {
    personas: Vec<Arc<Persona>>,
    index: HashMap<String, usize>,
}

/// Owns every persona. Listing order is insertion order.
#[derive(Debug, Default)]
pub struct PersonaCatalog {
    inner: RwLock<CatalogInner>,
}

impl PersonaCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Seed cohort plus `generated` personas drawn from `seed`.
    pub fn seeded(seed: u64, generated: usize) -> Self {
        let mut rng = SimRng::seeded(seed);
        let catalog = Self::empty();
        let mut inner = catalog.inner.write();
        for persona in seed_cohort(&mut rng)
            .into_iter()
            .chain(generated_cohort(&mut rng, generated))
        {
            let idx = inner.personas.len();
            inner.index.insert(persona.id.clone(), idx);
            inner.personas.push(Arc::new(persona));
        }
        tracing::debug!(count = inner.personas.len(), seed, "persona catalog seeded");
        drop(inner);
        catalog
    }

    pub fn len(&self) -> usize {
        self.inner.read().personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn list(&self) -> Vec<Arc<Persona>> {
        self.inner.read().personas.clone()
    }

    pub fn get(&self, id: &str) -> Result<Arc<Persona>> {
        let inner = self.inner.read();
        inner
            .index
            .get(id)
            .map(|&idx| Arc::clone(&inner.personas[idx]))
            .ok_or_else(|| HurlError::persona_not_found(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().index.contains_key(id)
    }

    /// Validate and register a new persona under a fresh random id.
    pub fn create(&self, spec: PersonaSpec) -> Result<Arc<Persona>> {
        let persona = spec.into_persona(Uuid::new_v4().to_string());
        self.insert(persona)
    }

    /// Register a fully-formed persona. Rejects duplicate ids.
    pub fn insert(&self, persona: Persona) -> Result<Arc<Persona>> {
        persona.validate()?;
        let mut inner = self.inner.write();
        if inner.index.contains_key(&persona.id) {
            return Err(HurlError::invalid(format!(
                "persona id already exists: {}",
                persona.id
            )));
        }
        let persona = Arc::new(persona);
        let idx = inner.personas.len();
        inner.index.insert(persona.id.clone(), idx);
        inner.personas.push(Arc::clone(&persona));
        tracing::info!(id = %persona.id, handle = %persona.handle, "persona created");
        Ok(persona)
    }

    /// Administrative replace of every field but the id.
    ///
    /// An influence left unset keeps the persona's current influence.
    pub fn update(&self, id: &str, spec: PersonaSpec) -> Result<Arc<Persona>> {
        let mut inner = self.inner.write();
        let &idx = inner
            .index
            .get(id)
            .ok_or_else(|| HurlError::persona_not_found(id))?;
        let influence = spec.influence.unwrap_or(inner.personas[idx].influence);
        let mut persona = spec.into_persona(id.to_string());
        persona.influence = influence;
        persona.validate()?;
        let persona = Arc::new(persona);
        inner.personas[idx] = Arc::clone(&persona);
        tracing::info!(id, "persona updated");
        Ok(persona)
    }
}

// ---------------------------------------------------------------------------
// Seed cohort
// ---------------------------------------------------------------------------

const SEED_READING_LEVEL: u8 = 10;

#[derive(Clone, Copy)]
struct StyleOverrides {
    reading_level: Option<u8>,
    emoji_preference: Option<f64>,
    hashtag_propensity: Option<f64>,
    link_propensity: Option<f64>,
    cynicism: Option<f64>,
    hot_take_factor: Option<f64>,
    punctuation: &'static [&'static str],
    slang: &'static [&'static str],
}

impl StyleOverrides {
    const NONE: StyleOverrides = StyleOverrides {
        reading_level: None,
        emoji_preference: None,
        hashtag_propensity: None,
        link_propensity: None,
        cynicism: None,
        hot_take_factor: None,
        punctuation: &[],
        slang: &[],
    };

    fn resolve(&self) -> PersonaStyle {
        let d = PersonaStyle::default();
        PersonaStyle {
            emoji_preference: self.emoji_preference.unwrap_or(d.emoji_preference),
            hashtag_propensity: self.hashtag_propensity.unwrap_or(d.hashtag_propensity),
            link_propensity: self.link_propensity.unwrap_or(d.link_propensity),
            cynicism: self.cynicism.unwrap_or(d.cynicism),
            hot_take_factor: self.hot_take_factor.unwrap_or(d.hot_take_factor),
            reading_level: self.reading_level.unwrap_or(SEED_READING_LEVEL),
            punctuation_quirks: self.punctuation.iter().map(|s| (*s).to_string()).collect(),
            slang_set: self.slang.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

struct SeedPersona {
    display_name: &'static str,
    handle: &'static str,
    bio: &'static str,
    interests: &'static [(&'static str, f64)],
    stances: &'static [(StanceAxis, f64)],
    style: StyleOverrides,
}

use self::StanceAxis::{Markets, Politics, PopCulture, Sports, Tech, Wellness};

const SEED_PERSONAS: &[SeedPersona] = &[
    SeedPersona {
        display_name: "Alex Chen",
        handle: "alexc_tech",
        bio: "AI researcher. Building the future. Opinions are my own.",
        interests: &[("ai", 0.9), ("quantum", 0.6), ("open_source", 0.7)],
        stances: &[(Tech, 0.8), (Politics, 0.1)],
        style: StyleOverrides {
            reading_level: Some(14),
            hot_take_factor: Some(0.4),
            cynicism: Some(0.3),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "crypto_whale_42",
        handle: "crypto_whale_42",
        bio: "HODL. Not financial advice. Diamond hands.",
        interests: &[("crypto", 1.0), ("web3", 0.9), ("stocks", 0.5)],
        stances: &[(Tech, 0.6), (Markets, 0.9)],
        style: StyleOverrides {
            emoji_preference: Some(0.9),
            hashtag_propensity: Some(0.8),
            cynicism: Some(0.2),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "Sarah K",
        handle: "sarahk_codes",
        bio: "Full-stack dev. Coffee addict. She/her.",
        interests: &[("open_source", 0.8), ("cloud", 0.6), ("productivity", 0.5)],
        stances: &[(Tech, 0.7)],
        style: StyleOverrides {
            reading_level: Some(10),
            hot_take_factor: Some(0.2),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "hackerman3000",
        handle: "hackerman3000",
        bio: "Security researcher. Bug bounties. Ethical hacking.",
        interests: &[("cybersec", 0.95), ("privacy", 0.8), ("open_source", 0.6)],
        stances: &[(Tech, 0.5), (Politics, 0.3)],
        style: StyleOverrides {
            reading_level: Some(12),
            cynicism: Some(0.6),
            punctuation: &["..."],
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "VR Visionary",
        handle: "vr_visionary",
        bio: "Building the metaverse. VR/AR evangelist.",
        interests: &[("vr_ar", 1.0), ("gaming", 0.7), ("startups", 0.5)],
        stances: &[(Tech, 0.9)],
        style: StyleOverrides {
            hot_take_factor: Some(0.7),
            emoji_preference: Some(0.6),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "PolicyWonk",
        handle: "policywonk",
        bio: "Political analyst. Facts over feelings.",
        interests: &[("politics", 0.9), ("elections", 0.8), ("climate", 0.6)],
        stances: &[(Politics, 0.7)],
        style: StyleOverrides {
            reading_level: Some(15),
            cynicism: Some(0.5),
            hot_take_factor: Some(0.6),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "Climate Activist",
        handle: "climate_now",
        bio: "Climate action NOW. Science is real.",
        interests: &[("climate", 1.0), ("politics", 0.7), ("wildlife", 0.6)],
        stances: &[(Politics, 0.8)],
        style: StyleOverrides {
            hot_take_factor: Some(0.8),
            hashtag_propensity: Some(0.9),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "Dr. Maria Lopez",
        handle: "dr_maria_lopez",
        bio: "Public health physician. Advocate for healthcare reform.",
        interests: &[("healthcare", 0.9), ("politics", 0.5), ("mental_health", 0.7)],
        stances: &[(Politics, 0.4)],
        style: StyleOverrides {
            reading_level: Some(16),
            cynicism: Some(0.2),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "Wall St Wolf",
        handle: "wallstwolf",
        bio: "Stocks, options, gains. Let's get this bread.",
        interests: &[("stocks", 0.95), ("economy", 0.7), ("crypto", 0.4)],
        stances: &[(Markets, 0.9)],
        style: StyleOverrides {
            emoji_preference: Some(0.7),
            hot_take_factor: Some(0.8),
            cynicism: Some(0.6),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "StartupFounder",
        handle: "startup_founder",
        bio: "Building in public. Raised Series A. Always be shipping.",
        interests: &[("startups", 1.0), ("ai", 0.6), ("job_market", 0.4)],
        stances: &[(Tech, 0.7), (Markets, 0.6)],
        style: StyleOverrides {
            reading_level: Some(11),
            hot_take_factor: Some(0.5),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "SportsJunkie",
        handle: "sports_junkie",
        bio: "Live for game day. Stats nerd.",
        interests: &[("football", 0.9), ("basketball", 0.8), ("esports", 0.3)],
        stances: &[(Sports, 0.9)],
        style: StyleOverrides {
            emoji_preference: Some(0.8),
            cynicism: Some(0.4),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "EsportsKing",
        handle: "esports_king",
        bio: "Pro gamer. Streaming 24/7. GG.",
        interests: &[("esports", 1.0), ("gaming", 0.9), ("social_media", 0.5)],
        stances: &[(Sports, 0.7)],
        style: StyleOverrides {
            reading_level: Some(8),
            emoji_preference: Some(0.9),
            slang: &["gg", "ez", "noob"],
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "MovieBuff",
        handle: "movie_buff",
        bio: "Film critic. Seen everything. Hot takes on cinema.",
        interests: &[("movies", 0.95), ("tv", 0.7), ("celebrities", 0.5)],
        stances: &[(PopCulture, 0.8)],
        style: StyleOverrides {
            reading_level: Some(13),
            hot_take_factor: Some(0.9),
            cynicism: Some(0.7),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "pop_stan_forever",
        handle: "pop_stan_forever",
        bio: "Stan account. Protecting my fave at all costs.",
        interests: &[("music", 1.0), ("celebrities", 0.9), ("social_media", 0.8)],
        stances: &[(PopCulture, 1.0)],
        style: StyleOverrides {
            emoji_preference: Some(1.0),
            hashtag_propensity: Some(1.0),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "MemeL0rd",
        handle: "memelord",
        bio: "Curator of chaos. Dank memes only.",
        interests: &[("memes", 1.0), ("social_media", 0.9), ("gaming", 0.6)],
        stances: &[],
        style: StyleOverrides {
            emoji_preference: Some(0.9),
            cynicism: Some(0.8),
            reading_level: Some(7),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "Wellness Warrior",
        handle: "wellness_warrior",
        bio: "Holistic health. Mind, body, spirit. Namaste.",
        interests: &[("meditation", 0.9), ("nutrition", 0.8), ("mental_health", 0.7)],
        stances: &[(Wellness, 0.9)],
        style: StyleOverrides {
            emoji_preference: Some(0.7),
            cynicism: Some(0.1),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "FitnessFreak",
        handle: "fitness_freak",
        bio: "No pain, no gain. Gym rat. Macro tracking.",
        interests: &[("fitness", 1.0), ("nutrition", 0.9)],
        stances: &[(Wellness, 0.8)],
        style: StyleOverrides {
            emoji_preference: Some(0.8),
            hashtag_propensity: Some(0.7),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "Therapist Jane",
        handle: "therapist_jane",
        bio: "Licensed therapist. Mental health advocate. DMs open.",
        interests: &[("mental_health", 0.95), ("wellness", 0.6), ("healthcare", 0.5)],
        stances: &[],
        style: StyleOverrides {
            reading_level: Some(12),
            cynicism: Some(0.2),
            emoji_preference: Some(0.3),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "Skeptic Sam",
        handle: "skeptic_sam",
        bio: "Question everything. Prove it.",
        interests: &[("misinformation", 0.8), ("politics", 0.6), ("science", 0.7)],
        stances: &[],
        style: StyleOverrides {
            cynicism: Some(0.95),
            hot_take_factor: Some(0.8),
            reading_level: Some(14),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "Influencer Ivy",
        handle: "influencer_ivy",
        bio: "Brand partnerships: ivy@agency.com. Link in bio.",
        interests: &[("influencers", 1.0), ("fashion", 0.8), ("social_media", 0.9)],
        stances: &[],
        style: StyleOverrides {
            emoji_preference: Some(0.9),
            link_propensity: Some(0.9),
            hashtag_propensity: Some(0.9),
            ..StyleOverrides::NONE
        },
    },
    SeedPersona {
        display_name: "ClassroomCam",
        handle: "classroom_cam",
        bio: "Teaching high school. Education matters.",
        interests: &[("education", 0.9), ("politics", 0.4), ("productivity", 0.5)],
        stances: &[],
        style: StyleOverrides {
            reading_level: Some(11),
            cynicism: Some(0.3),
            ..StyleOverrides::NONE
        },
    },
];

fn deterministic_id(rng: &mut SimRng) -> String {
    uuid::Builder::from_random_bytes(rng.random_bytes())
        .into_uuid()
        .to_string()
}

fn seed_cohort(rng: &mut SimRng) -> Vec<Persona> {
    SEED_PERSONAS
        .iter()
        .map(|seed| {
            let id = deterministic_id(rng);
            let mut stances = Stances::default();
            for &(axis, value) in seed.stances {
                stances.set(axis, value);
            }
            Persona {
                id,
                display_name: seed.display_name.to_string(),
                handle: seed.handle.to_string(),
                bio: seed.bio.to_string(),
                interests: seed
                    .interests
                    .iter()
                    .map(|&(t, w)| (t.to_string(), w))
                    .collect(),
                style: seed.style.resolve(),
                behavior: PersonaBehavior::default(),
                stances,
                toxicity: 0.1,
                influence: rng.beta(2.0, 5.0),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Generated cohort
// ---------------------------------------------------------------------------

const GENERATED_INTERESTS: &[&str] = &[
    "ai",
    "crypto",
    "gaming",
    "politics",
    "climate",
    "stocks",
    "movies",
    "music",
    "fitness",
    "memes",
    "social_media",
    "startups",
    "healthcare",
    "education",
];

const FIRST_NAMES: &[&str] = &[
    "Jordan", "Priya", "Marcus", "Elena", "Kenji", "Aisha", "Liam", "Sofia", "Mateo", "Hannah",
    "Omar", "Grace", "Diego", "Mei", "Noah", "Zara", "Ethan", "Nadia", "Lucas", "Chloe",
    "Ravi", "Isabel", "Tariq", "Freya", "Andre", "Yuki", "Samir", "Leah", "Felix", "Amara",
];

const LAST_NAMES: &[&str] = &[
    "Park", "Nguyen", "Okafor", "Rossi", "Silva", "Kowalski", "Haddad", "Murphy", "Tanaka",
    "Schmidt", "Diaz", "Patel", "Johansson", "Moreau", "Ibrahim", "Walsh", "Costa", "Kim",
    "Fischer", "Mensah", "Novak", "Reyes", "Larsen", "Chowdhury", "Brooks",
];

const BIO_ROLES: &[&str] = &[
    "Designer",
    "Grad student",
    "Night owl",
    "Product manager",
    "Nurse",
    "Data nerd",
    "Barista",
    "Indie dev",
    "Parent of two",
    "Writer",
    "Accountant",
    "Photographer",
];

const BIO_HOBBIES: &[&str] = &[
    "Coffee first, opinions second.",
    "Posting through it.",
    "Always learning.",
    "Here for the discourse.",
    "Probably overthinking this.",
    "Terminally online.",
    "Touching grass on weekends.",
    "Views are mine alone.",
];

/// Language mixes for generated personas, with their draw weights.
const LANGUAGE_MIXES: &[(&[(&str, f64)], f64)] = &[
    (&[("en", 1.0)], 0.8),
    (&[("en", 0.7), ("es", 0.3)], 0.1),
    (&[("en", 0.6), ("pt", 0.4)], 0.05),
    (&[("en", 0.5), ("fr", 0.5)], 0.05),
];

fn generated_cohort(rng: &mut SimRng, count: usize) -> Vec<Persona> {
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let id = deterministic_id(rng);

        let n_interests = rng.inclusive(1, 3);
        let interests = rng
            .sample_without_replacement(GENERATED_INTERESTS.len(), n_interests)
            .into_iter()
            .map(|idx| (GENERATED_INTERESTS[idx].to_string(), rng.beta(2.0, 2.0)))
            .collect();

        let mut stances = Stances::default();
        let n_stances = rng.inclusive(0, 2);
        for idx in rng.sample_without_replacement(StanceAxis::ALL.len(), n_stances) {
            stances.set(StanceAxis::ALL[idx], rng.uniform_in(-1.0, 1.0));
        }

        let style = PersonaStyle {
            reading_level: rng.range(6, 18) as u8,
            emoji_preference: rng.beta(2.0, 3.0),
            hashtag_propensity: rng.beta(1.5, 3.0),
            hot_take_factor: rng.beta(2.0, 4.0),
            cynicism: rng.beta(2.0, 3.0),
            ..PersonaStyle::default()
        };

        let first = rng.choose(FIRST_NAMES).copied().unwrap_or("Sam");
        let last = rng.choose(LAST_NAMES).copied().unwrap_or("Lee");
        let handle = format!(
            "{}_{}{}",
            first.to_lowercase(),
            last.to_lowercase(),
            rng.range(1, 100)
        );
        let bio = format!(
            "{}. {}",
            rng.choose(BIO_ROLES).copied().unwrap_or("Writer"),
            rng.choose(BIO_HOBBIES).copied().unwrap_or("Always learning.")
        );

        let mix_weights: Vec<f64> = LANGUAGE_MIXES.iter().map(|(_, w)| *w).collect();
        let mix = rng
            .weighted_index(&mix_weights)
            .map_or(LANGUAGE_MIXES[0].0, |idx| LANGUAGE_MIXES[idx].0);
        let behavior = PersonaBehavior {
            language_distribution: mix.iter().map(|&(l, w)| (l.to_string(), w)).collect(),
            ..PersonaBehavior::default()
        };

        out.push(Persona {
            id,
            display_name: format!("{first} {last}"),
            handle,
            bio,
            interests,
            style,
            behavior,
            stances,
            toxicity: 0.1,
            influence: rng.beta(2.0, 5.0),
        });
        tracing::trace!(index = i, "generated persona");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_CATALOG_SEED, DEFAULT_GENERATED_PERSONAS};

    fn catalog() -> PersonaCatalog {
        PersonaCatalog::seeded(DEFAULT_CATALOG_SEED, DEFAULT_GENERATED_PERSONAS)
    }

    #[test]
    fn test_catalog_has_over_a_hundred() {
        let catalog = catalog();
        assert_eq!(catalog.len(), SEED_PERSONAS.len() + DEFAULT_GENERATED_PERSONAS);
        assert!(catalog.len() >= 100);
    }

    #[test]
    fn test_catalog_is_reproducible() {
        let a = catalog().list();
        let b = catalog().list();
        assert_eq!(a, b);
    }

    #[test]
    fn test_catalog_seed_changes_cohort() {
        let a = PersonaCatalog::seeded(1, 5).list();
        let b = PersonaCatalog::seeded(2, 5).list();
        assert_ne!(a[0].id, b[0].id);
    }

    #[test]
    fn test_every_persona_valid() {
        for persona in catalog().list() {
            persona.validate().unwrap();
            assert!(!persona.interests.is_empty());
        }
    }

    #[test]
    fn test_seed_persona_traits() {
        let catalog = catalog();
        let alex = catalog
            .list()
            .into_iter()
            .find(|p| p.handle == "alexc_tech")
            .unwrap();
        assert_eq!(alex.style.reading_level, 14);
        assert_eq!(alex.interest("ai"), 0.9);
        assert_eq!(alex.stances.tech, 0.8);
        // Unset fields fall back to the style defaults.
        assert_eq!(alex.style.emoji_preference, 0.5);

        let king = catalog
            .list()
            .into_iter()
            .find(|p| p.handle == "esports_king")
            .unwrap();
        assert_eq!(king.style.slang_set, vec!["gg", "ez", "noob"]);
    }

    #[test]
    fn test_create_and_get() {
        let catalog = PersonaCatalog::empty();
        let mut spec = PersonaSpec::new("Test User", "tester");
        spec.interests.insert("ai".into(), 0.5);
        let created = catalog.create(spec).unwrap();
        assert_eq!(created.influence, DEFAULT_INFLUENCE);
        assert_eq!(created.style, PersonaStyle::default());
        assert_eq!(catalog.get(&created.id).unwrap(), created);
    }

    #[test]
    fn test_create_rejects_out_of_range() {
        let catalog = PersonaCatalog::empty();

        let mut spec = PersonaSpec::new("Bad", "bad");
        spec.toxicity = 1.5;
        assert!(matches!(
            catalog.create(spec),
            Err(HurlError::InvalidParameter(_))
        ));

        let mut spec = PersonaSpec::new("Bad", "bad");
        spec.stances = Some(Stances {
            politics: -2.0,
            ..Stances::default()
        });
        assert!(matches!(
            catalog.create(spec),
            Err(HurlError::InvalidParameter(_))
        ));

        assert!(matches!(
            catalog.create(PersonaSpec::new("  ", "bad")),
            Err(HurlError::InvalidParameter(_))
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_update_keeps_id_and_influence() {
        let catalog = PersonaCatalog::empty();
        let mut spec = PersonaSpec::new("Before", "before");
        spec.influence = Some(0.8);
        let created = catalog.create(spec).unwrap();

        let updated = catalog
            .update(&created.id, PersonaSpec::new("After", "after"))
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.display_name, "After");
        assert_eq!(updated.influence, 0.8);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_get_unknown() {
        let catalog = PersonaCatalog::empty();
        assert_eq!(
            catalog.get("missing").unwrap_err(),
            HurlError::persona_not_found("missing")
        );
        assert!(catalog.update("missing", PersonaSpec::new("a", "b")).is_err());
    }

    #[test]
    fn test_spec_deserializes_with_defaults() {
        let spec: PersonaSpec =
            serde_json::from_str(r#"{"display_name":"X","handle":"x"}"#).unwrap();
        assert_eq!(spec.toxicity, 0.1);
        assert!(spec.style.is_none());
    }

    #[test]
    fn test_persona_accepts_influence_score_alias() {
        let catalog = catalog();
        let mut json = serde_json::to_value(&*catalog.list()[0]).unwrap();
        let influence = json["influence"].clone();
        let obj = json.as_object_mut().unwrap();
        obj.remove("influence");
        obj.insert("influence_score".into(), influence);
        let back: Persona = serde_json::from_value(json).unwrap();
        assert_eq!(back.influence, catalog.list()[0].influence);
    }
}
