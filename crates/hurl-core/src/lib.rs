//! Hurl: a deterministic synthetic social-feed engine.
//!
//! Personas post about topics whose trend scores evolve on a weighted graph,
//! pushed around by decaying shocks. Every random choice flows from an
//! explicit seed, so the same seed and inputs give the same posts.
//!
//! No network or disk I/O: transports, persistence and text enhancers plug in
//! from outside.

pub mod adoption;
pub mod constants;
pub mod engagement;
pub mod enhance;
pub mod error;
pub mod generator;
pub mod ids;
pub mod markov;
pub mod persona;
pub mod post;
pub mod rng;
pub mod store;
pub mod style;
pub mod synth;
pub mod system;
pub mod templates;
pub mod time;
pub mod topics;
pub mod trends;

pub use adoption::AdoptionModel;
pub use enhance::{EnhancementError, TextEnhancer};
pub use error::{HurlError, Result};
pub use generator::{ExhaustedPolicy, GenerateParams, Generator, GeneratorLimits};
pub use ids::IdGenerator;
pub use persona::{Persona, PersonaBehavior, PersonaCatalog, PersonaSpec, PersonaStyle, Stances};
pub use post::{EngagementMetrics, Lineage, Mode, Post, StyleMetrics};
pub use rng::{RngService, SimRng};
pub use store::BoundedPostStore;
pub use synth::{PostSynthesizer, Synthesized};
pub use system::{FeedSystem, SystemConfig};
pub use topics::{EdgeSpec, Topic, TopicGraph, TopicSpec};
pub use trends::{Shock, TickReport, TrendEngine, TrendParams, TrendPoint};
