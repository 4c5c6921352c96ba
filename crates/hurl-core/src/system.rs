//! The service container callers hold: one explicitly built set of engine
//! parts shared behind `Arc`s.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CATALOG_SEED, DEFAULT_ENHANCE_TIMEOUT_MS, DEFAULT_GENERATED_PERSONAS, DEFAULT_MAX_BATCH,
    DEFAULT_STORE_CAPACITY, DEFAULT_TICK_INTERVAL_SECS, DEFAULT_TOXICITY_ATTEMPTS,
};
use crate::enhance::TextEnhancer;
use crate::error::{HurlError, Result};
use crate::generator::{GenerateParams, Generator, GeneratorLimits};
use crate::persona::{Persona, PersonaCatalog, PersonaSpec};
use crate::post::Post;
use crate::rng::RngService;
use crate::store::BoundedPostStore;
use crate::synth::PostSynthesizer;
use crate::topics::{Topic, TopicGraph};
use crate::trends::{TickReport, TrendEngine, TrendParams, TrendPoint};

#[derive(Clone)]
pub struct SystemConfig {
    pub store_capacity: usize,
    pub catalog_seed: u64,
    /// Personas generated on top of the built-in cohort.
    pub generated_personas: usize,
    pub tick_interval: Duration,
    pub trend_params: TrendParams,
    pub max_batch_size: usize,
    pub toxicity_attempts: u32,
    /// Seed for the shared generator; unseeded calls fall back to it.
    pub default_seed: Option<u64>,
    pub enhancer: Option<Arc<dyn TextEnhancer>>,
    pub enhancement_timeout: Duration,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            store_capacity: DEFAULT_STORE_CAPACITY,
            catalog_seed: DEFAULT_CATALOG_SEED,
            generated_personas: DEFAULT_GENERATED_PERSONAS,
            tick_interval: Duration::from_secs_f64(DEFAULT_TICK_INTERVAL_SECS),
            trend_params: TrendParams::default(),
            max_batch_size: DEFAULT_MAX_BATCH,
            toxicity_attempts: DEFAULT_TOXICITY_ATTEMPTS,
            default_seed: None,
            enhancer: None,
            enhancement_timeout: Duration::from_millis(DEFAULT_ENHANCE_TIMEOUT_MS),
        }
    }
}

impl fmt::Debug for SystemConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemConfig")
            .field("store_capacity", &self.store_capacity)
            .field("catalog_seed", &self.catalog_seed)
            .field("generated_personas", &self.generated_personas)
            .field("tick_interval", &self.tick_interval)
            .field("trend_params", &self.trend_params)
            .field("max_batch_size", &self.max_batch_size)
            .field("toxicity_attempts", &self.toxicity_attempts)
            .field("default_seed", &self.default_seed)
            .field("enhancer", &self.enhancer.as_ref().map(|e| e.name().to_string()))
            .field("enhancement_timeout", &self.enhancement_timeout)
            .finish()
    }
}

#[derive(Debug)]
pub struct FeedSystem {
    rng: Arc<RngService>,
    catalog: Arc<PersonaCatalog>,
    graph: Arc<TopicGraph>,
    trends: Arc<TrendEngine>,
    store: Arc<BoundedPostStore>,
    generator: Generator,
    tick_interval: Duration,
}

impl Default for FeedSystem {
    fn default() -> Self {
        Self::new(SystemConfig::default())
    }
}

impl FeedSystem {
    pub fn new(config: SystemConfig) -> Self {
        let rng = Arc::new(RngService::new(config.default_seed));
        let catalog = Arc::new(PersonaCatalog::seeded(
            config.catalog_seed,
            config.generated_personas,
        ));
        let graph = Arc::new(TopicGraph::seeded());
        let trends = Arc::new(TrendEngine::with_params(Arc::clone(&graph), config.trend_params));
        let store = Arc::new(BoundedPostStore::new(config.store_capacity));
        let synth = PostSynthesizer::new(config.enhancer, config.enhancement_timeout);
        let generator = Generator::new(
            Arc::clone(&catalog),
            Arc::clone(&graph),
            Arc::clone(&store),
            Arc::clone(&rng),
            synth,
            GeneratorLimits {
                max_batch: config.max_batch_size,
                toxicity_attempts: config.toxicity_attempts,
            },
        );

        tracing::info!(
            personas = catalog.len(),
            topics = graph.len(),
            store_capacity = store.capacity(),
            "feed system ready"
        );
        Self {
            rng,
            catalog,
            graph,
            trends,
            store,
            generator,
            tick_interval: config.tick_interval,
        }
    }

    // Generation

    pub async fn generate(&self, params: &GenerateParams) -> Result<Vec<Post>> {
        self.generator.generate(params).await
    }

    /// One post with `params`, ignoring its count.
    pub async fn sample_one(&self, params: &GenerateParams) -> Result<Post> {
        let params = GenerateParams {
            count: 1,
            ..params.clone()
        };
        self.generate(&params)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HurlError::invalid("generation produced no post"))
    }

    pub fn max_batch_size(&self) -> usize {
        self.generator.limits().max_batch
    }

    pub fn has_enhancer(&self) -> bool {
        self.generator.synthesizer().has_enhancer()
    }

    // Trends

    pub fn inject_shock(&self, topic_id: &str, magnitude: f64, half_life_secs: f64) -> Result<()> {
        self.trends.inject_shock(topic_id, magnitude, half_life_secs)
    }

    pub fn trend_snapshot(&self) -> Vec<TrendPoint> {
        self.trends.snapshot()
    }

    pub fn tick(&self) -> Result<TickReport> {
        self.trends.tick()
    }

    pub fn trend_engine(&self) -> &Arc<TrendEngine> {
        &self.trends
    }

    /// Start the background trend loop. Needs a tokio runtime.
    pub fn start(&self) -> bool {
        self.trends.start(self.tick_interval)
    }

    pub async fn stop(&self) -> bool {
        self.trends.stop().await
    }

    pub fn is_running(&self) -> bool {
        self.trends.is_running()
    }

    // Randomness

    pub fn reseed(&self, seed: u64) {
        self.rng.reseed(seed);
    }

    pub fn global_seed(&self) -> Option<u64> {
        self.rng.global_seed()
    }

    // Personas

    pub fn list_personas(&self) -> Vec<Arc<Persona>> {
        self.catalog.list()
    }

    pub fn get_persona(&self, id: &str) -> Result<Arc<Persona>> {
        self.catalog.get(id)
    }

    pub fn create_persona(&self, spec: PersonaSpec) -> Result<Arc<Persona>> {
        self.catalog.create(spec)
    }

    pub fn update_persona(&self, id: &str, spec: PersonaSpec) -> Result<Arc<Persona>> {
        self.catalog.update(id, spec)
    }

    // Topics

    pub fn list_topics(&self) -> Vec<Topic> {
        self.graph.all()
    }

    pub fn get_topic(&self, id: &str) -> Result<Topic> {
        self.graph.get(id)
    }

    // Posts

    /// The last `limit` posts, oldest first.
    pub fn recent_posts(&self, limit: usize) -> Vec<Post> {
        self.store
            .recent(limit)
            .into_iter()
            .map(|p| Post::clone(&p))
            .collect()
    }

    pub fn get_post(&self, id: &str) -> Result<Post> {
        self.store
            .get(id)
            .map(|p| Post::clone(&p))
            .ok_or_else(|| HurlError::post_not_found(id))
    }

    pub fn post_count(&self) -> usize {
        self.store.len()
    }
}
