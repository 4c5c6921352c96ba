/// Lower bound of every topic trend score.
pub const SCORE_MIN: f64 = 0.0;

/// Upper bound of every topic trend score.
pub const SCORE_MAX: f64 = 10.0;

/// Score every topic starts at, and the level recency decay pulls towards.
pub const BASELINE_SCORE: f64 = 0.1;

/// Trend tick: weight of a topic's own current score.
pub const TREND_ALPHA: f64 = 0.2;

/// Trend tick: weight of the mean weighted in-neighbor score.
pub const TREND_BETA: f64 = 0.3;

/// Trend tick: per-tick retention before blending with the baseline.
pub const RECENCY_DECAY: f64 = 0.95;

/// Shocks whose decayed magnitude drops below this are expired.
pub const SHOCK_EPSILON: f64 = 0.01;

/// Smallest shock half-life accepted, in seconds.
pub const MIN_HALF_LIFE_SECS: f64 = 1.0;

/// Floor on the elapsed time used for velocity, in seconds.
pub const MIN_TICK_ELAPSED_SECS: f64 = 0.1;

/// Default period of the background trend loop, in seconds.
pub const DEFAULT_TICK_INTERVAL_SECS: f64 = 5.0;

/// Adoption: weight of the topic trend score.
pub const ADOPTION_ALPHA: f64 = 0.3;

/// Adoption: weight of peer influence.
pub const ADOPTION_BETA: f64 = 0.4;

/// Adoption: weight of persona interest.
pub const ADOPTION_GAMMA: f64 = 0.5;

/// Adoption: weight of the recency penalty (subtracted).
pub const ADOPTION_DELTA: f64 = 0.2;

/// Recency penalty scale: penalty = e^(-index / scale).
pub const RECENCY_PENALTY_SCALE: f64 = 3.0;

/// Peer influence scale: weight of the i-th newest post = e^(-i / scale).
pub const PEER_RECENCY_SCALE: f64 = 10.0;

/// How many recent posts feed peer influence and lineage.
pub const PEER_WINDOW: usize = 50;

/// How many of a persona's own posts feed its recent-topic history.
pub const PERSONA_HISTORY: usize = 10;

/// Most influence ids recorded in a post's lineage.
pub const MAX_INFLUENCES: usize = 3;

/// Chance a post gets a Markov continuation.
pub const MARKOV_PROBABILITY: f64 = 0.3;

/// Markov chain order (words per key).
pub const MARKOV_ORDER: usize = 2;

/// Total word budget of a Markov continuation, seed words included.
pub const MARKOV_MAX_WORDS: usize = 10;

/// Most new words a continuation may append.
pub const MARKOV_MAX_APPENDED: usize = 5;

/// Chance the external enhancer is consulted, when one is configured.
pub const ENHANCE_PROBABILITY: f64 = 0.2;

/// Default budget for one enhancement call, in milliseconds.
pub const DEFAULT_ENHANCE_TIMEOUT_MS: u64 = 150;

/// Style: preferences below this never decorate.
pub const STYLE_FLOOR: f64 = 0.1;

/// Style: chance each punctuation quirk is appended.
pub const QUIRK_PROBABILITY: f64 = 0.4;

/// Style: chance each eligible word is upper-cased once caps kick in.
pub const CAPS_WORD_PROBABILITY: f64 = 0.3;

/// Personas above this toxicity keep their profanity unmasked.
pub const PROFANITY_TOXICITY_THRESHOLD: f64 = 0.7;

/// Upper bound of the per-post toxicity noise.
pub const TOXICITY_NOISE: f64 = 0.1;

/// Default number of toxicity-gate attempts per post.
pub const DEFAULT_TOXICITY_ATTEMPTS: u32 = 5;

/// Default upper bound on posts per `generate` call.
pub const DEFAULT_MAX_BATCH: usize = 1000;

/// Default capacity of the in-memory post store.
pub const DEFAULT_STORE_CAPACITY: usize = 10_000;

/// Default seed of the persona catalog's generated cohort.
pub const DEFAULT_CATALOG_SEED: u64 = 42;

/// Number of generated personas added on top of the seed cohort.
pub const DEFAULT_GENERATED_PERSONAS: usize = 80;

/// Influence assigned to personas created without one.
pub const DEFAULT_INFLUENCE: f64 = 0.3;
