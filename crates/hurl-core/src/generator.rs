//! Batch generation: persona and topic selection, synthesis, the toxicity
//! gate, lineage and storage.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adoption::{AdoptionModel, peer_influence, sample_topics};
use crate::constants::{
    DEFAULT_MAX_BATCH, DEFAULT_TOXICITY_ATTEMPTS, MAX_INFLUENCES, PEER_WINDOW, PERSONA_HISTORY,
    TOXICITY_NOISE,
};
use crate::error::{HurlError, Result};
use crate::ids::IdGenerator;
use crate::persona::{Persona, PersonaCatalog};
use crate::post::{Lineage, Mode, Post};
use crate::rng::{RngService, SimRng};
use crate::store::BoundedPostStore;
use crate::synth::{PostSynthesizer, Synthesized};
use crate::time::{millis_to_iso8601, now_millis};
use crate::topics::TopicGraph;

const DEFAULT_LANGUAGE: &str = "en";

/// What to do when every toxicity attempt lands above the limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustedPolicy {
    /// Fail the whole call with `ToxicityUnsatisfiable`.
    #[default]
    Fail,
    /// Keep the least toxic attempt even though it is over the limit.
    KeepLeastToxic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateParams {
    pub count: usize,
    pub mode: Mode,
    /// Restrict topics to these ids. Empty means every topic.
    pub topics: Vec<String>,
    /// Restrict authors to these persona ids. Empty means every persona.
    pub persona_ids: Vec<String>,
    /// Allowed language codes. Empty means the persona's own mix.
    #[serde(alias = "language")]
    pub languages: Vec<String>,
    pub toxicity_max: f64,
    pub seed: Option<u64>,
    #[serde(alias = "reading_level")]
    pub max_reading_level: Option<u8>,
    pub on_exhausted: ExhaustedPolicy,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            count: 10,
            mode: Mode::Emergent,
            topics: Vec::new(),
            persona_ids: Vec::new(),
            languages: Vec::new(),
            toxicity_max: 0.3,
            seed: None,
            max_reading_level: None,
            on_exhausted: ExhaustedPolicy::Fail,
        }
    }
}

impl GenerateParams {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Reject bad parameters before anything is generated.
    pub fn validate(
        &self,
        max_batch: usize,
        graph: &TopicGraph,
        catalog: &PersonaCatalog,
    ) -> Result<()> {
        if self.count == 0 || self.count > max_batch {
            return Err(HurlError::invalid(format!(
                "count must be between 1 and {max_batch}, got {}",
                self.count
            )));
        }
        if !(0.0..=1.0).contains(&self.toxicity_max) {
            return Err(HurlError::invalid(format!(
                "toxicity_max must be within [0, 1], got {}",
                self.toxicity_max
            )));
        }
        if let Some(level) = self.max_reading_level
            && !(1..=20).contains(&level)
        {
            return Err(HurlError::invalid(format!(
                "max_reading_level must be within 1..=20, got {level}"
            )));
        }
        if self.languages.iter().any(|l| l.trim().is_empty()) {
            return Err(HurlError::invalid("language codes must not be blank"));
        }
        if let Some(unknown) = self.topics.iter().find(|t| !graph.contains(t)) {
            return Err(HurlError::topic_not_found(unknown.as_str()));
        }
        if let Some(unknown) = self.persona_ids.iter().find(|p| !catalog.contains(p)) {
            return Err(HurlError::persona_not_found(unknown.as_str()));
        }
        Ok(())
    }
}

/// Limits applied to every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorLimits {
    pub max_batch: usize,
    pub toxicity_attempts: u32,
}

impl Default for GeneratorLimits {
    fn default() -> Self {
        Self {
            max_batch: DEFAULT_MAX_BATCH,
            toxicity_attempts: DEFAULT_TOXICITY_ATTEMPTS,
        }
    }
}

/// One synthesis attempt, before the toxicity gate decides on it.
#[derive(Debug)]
struct Draft {
    persona: Arc<Persona>,
    topics: Vec<String>,
    language: String,
    body: Synthesized,
    toxicity: f64,
    /// Continues the attempt's stream for the lineage draw.
    rng: SimRng,
}

enum GateOutcome {
    Accepted(Draft),
    Exhausted { least_toxic: Draft, attempts: u32 },
}

#[derive(Debug)]
pub struct Generator {
    catalog: Arc<PersonaCatalog>,
    graph: Arc<TopicGraph>,
    store: Arc<BoundedPostStore>,
    rng: Arc<RngService>,
    synth: PostSynthesizer,
    adoption: AdoptionModel,
    ids: IdGenerator,
    limits: GeneratorLimits,
}

impl Generator {
    pub fn new(
        catalog: Arc<PersonaCatalog>,
        graph: Arc<TopicGraph>,
        store: Arc<BoundedPostStore>,
        rng: Arc<RngService>,
        synth: PostSynthesizer,
        limits: GeneratorLimits,
    ) -> Self {
        Self {
            catalog,
            graph,
            store,
            rng,
            synth,
            adoption: AdoptionModel::default(),
            ids: IdGenerator::new(),
            limits,
        }
    }

    pub fn limits(&self) -> GeneratorLimits {
        self.limits
    }

    pub fn synthesizer(&self) -> &PostSynthesizer {
        &self.synth
    }

    /// Generate `params.count` posts, storing each as it is produced.
    pub async fn generate(&self, params: &GenerateParams) -> Result<Vec<Post>> {
        params.validate(self.limits.max_batch, &self.graph, &self.catalog)?;
        let pool = self.persona_pool(params)?;
        let base = params.seed.or_else(|| self.rng.global_seed());

        let mut posts = Vec::with_capacity(params.count);
        for i in 0..params.count {
            let post_seed = match base {
                Some(base) => base.wrapping_add(i as u64),
                None => self.rng.global().next_u64(),
            };
            let post = self.generate_one(params, &pool, post_seed).await?;
            posts.push(post);
        }
        Ok(posts)
    }

    async fn generate_one(
        &self,
        params: &GenerateParams,
        pool: &[Arc<Persona>],
        post_seed: u64,
    ) -> Result<Post> {
        let draft = match self.gate(params, pool, post_seed).await {
            GateOutcome::Accepted(draft) => draft,
            GateOutcome::Exhausted {
                least_toxic,
                attempts,
            } => match params.on_exhausted {
                ExhaustedPolicy::KeepLeastToxic => {
                    tracing::debug!(
                        persona = %least_toxic.persona.id,
                        toxicity = least_toxic.toxicity,
                        "toxicity attempts exhausted, keeping least toxic"
                    );
                    least_toxic
                }
                ExhaustedPolicy::Fail => {
                    return Err(HurlError::ToxicityUnsatisfiable {
                        persona_id: least_toxic.persona.id.clone(),
                        attempts,
                        toxicity_max: params.toxicity_max,
                    });
                }
            },
        };
        Ok(self.finish(params.mode, draft))
    }

    /// Try seeds `post_seed + a` until one draft is within `toxicity_max`.
    async fn gate(&self, params: &GenerateParams, pool: &[Arc<Persona>], post_seed: u64) -> GateOutcome {
        let attempts = self.limits.toxicity_attempts.max(1);
        let mut least_toxic = self.draft(params, pool, post_seed).await;
        if least_toxic.toxicity <= params.toxicity_max {
            return GateOutcome::Accepted(least_toxic);
        }

        for a in 1..attempts {
            tracing::debug!(
                attempt = a,
                toxicity = least_toxic.toxicity,
                limit = params.toxicity_max,
                "draft over toxicity limit, retrying"
            );
            let draft = self.draft(params, pool, post_seed.wrapping_add(u64::from(a))).await;
            if draft.toxicity <= params.toxicity_max {
                return GateOutcome::Accepted(draft);
            }
            if draft.toxicity < least_toxic.toxicity {
                least_toxic = draft;
            }
        }

        GateOutcome::Exhausted {
            least_toxic,
            attempts,
        }
    }

    async fn draft(&self, params: &GenerateParams, pool: &[Arc<Persona>], seed: u64) -> Draft {
        let mut rng = self.rng.scoped(seed);
        let persona = pick_persona(pool, &params.topics, &mut rng);
        let topics = match params.mode {
            Mode::Emergent => self.emergent_topics(&persona, &params.topics, &mut rng),
            Mode::PureRandom => self.random_topics(&params.topics, &mut rng),
        };
        let language = pick_language(&persona, &params.languages, &mut rng);
        let body = self
            .synth
            .synthesize(&persona, &topics, &self.graph, seed, &mut rng)
            .await;
        let toxicity = (persona.toxicity + rng.uniform() * TOXICITY_NOISE).min(1.0);

        Draft {
            persona,
            topics,
            language,
            body,
            toxicity,
            rng,
        }
    }

    fn emergent_topics(&self, persona: &Persona, filter: &[String], rng: &mut SimRng) -> Vec<String> {
        let k = rng.inclusive(1, 2);
        let recent_topics: Vec<String> = self
            .store
            .by_persona(&persona.id, PERSONA_HISTORY)
            .iter()
            .rev()
            .flat_map(|p| p.topics.iter().cloned())
            .collect();
        let peers = peer_influence(&self.store.recent(PEER_WINDOW), &persona.id);

        let mut probs =
            self.adoption
                .compute(&self.graph, &persona.interests, &peers, &recent_topics);
        if !filter.is_empty() {
            probs.retain(|topic, _| filter.contains(topic));
        }
        if probs.is_empty() {
            probs = persona.interests.clone();
        }
        sample_topics(&probs, k, rng)
    }

    fn random_topics(&self, filter: &[String], rng: &mut SimRng) -> Vec<String> {
        let candidates: Vec<String> = if filter.is_empty() {
            self.graph.ids()
        } else {
            self.graph.ids().into_iter().filter(|t| filter.contains(t)).collect()
        };
        let k = rng.inclusive(1, 2).min(candidates.len());
        rng.sample_without_replacement(candidates.len(), k)
            .into_iter()
            .map(|idx| candidates[idx].clone())
            .collect()
    }

    fn finish(&self, mode: Mode, mut draft: Draft) -> Post {
        let influences = self.lineage(&draft.persona.id, &mut draft.rng);
        let millis = now_millis();
        let post = Post {
            id: self.ids.next_id_at(millis),
            text: draft.body.text,
            persona_id: draft.persona.id.clone(),
            created_at: millis_to_iso8601(millis),
            mode,
            topics: draft.topics,
            language: draft.language,
            style: draft.body.style,
            lineage: Lineage {
                template: draft.body.template,
                influences,
            },
            metrics: draft.body.metrics,
            toxicity: draft.toxicity,
        };

        tracing::debug!(
            id = %post.id,
            persona = %post.persona_id,
            topics = ?post.topics,
            toxicity = post.toxicity,
            "post generated"
        );
        self.store.add(Arc::new(post.clone()));
        post
    }

    /// Up to three distinct recent posts by other personas.
    fn lineage(&self, persona_id: &str, rng: &mut SimRng) -> Vec<String> {
        let candidates: Vec<String> = self
            .store
            .recent(PEER_WINDOW)
            .iter()
            .filter(|p| p.persona_id != persona_id)
            .map(|p| p.id.clone())
            .collect();
        let n = rng.inclusive(0, MAX_INFLUENCES).min(candidates.len());
        rng.sample_without_replacement(candidates.len(), n)
            .into_iter()
            .map(|idx| candidates[idx].clone())
            .collect()
    }

    /// The persona filter (or the whole catalog) cut down by reading level.
    fn persona_pool(&self, params: &GenerateParams) -> Result<Vec<Arc<Persona>>> {
        let mut pool: Vec<Arc<Persona>> = if params.persona_ids.is_empty() {
            self.catalog.list()
        } else {
            let mut seen = Vec::new();
            for id in &params.persona_ids {
                if !seen.contains(id) {
                    seen.push(id.clone());
                }
            }
            seen.iter()
                .map(|id| self.catalog.get(id))
                .collect::<Result<_>>()?
        };
        if let Some(level) = params.max_reading_level {
            pool.retain(|p| p.style.reading_level <= level);
        }
        if pool.is_empty() {
            return Err(HurlError::NoPersonasAvailable);
        }
        Ok(pool)
    }
}

/// Weighted by influence plus interest in the filtered topics (all interests
/// when unfiltered); uniform when every weight is zero.
fn pick_persona(pool: &[Arc<Persona>], topic_filter: &[String], rng: &mut SimRng) -> Arc<Persona> {
    let weights: Vec<f64> = pool
        .iter()
        .map(|p| {
            let interest: f64 = if topic_filter.is_empty() {
                p.interests.values().sum()
            } else {
                topic_filter.iter().map(|t| p.interest(t)).sum()
            };
            p.influence + interest
        })
        .collect();
    let idx = rng
        .weighted_index(&weights)
        .unwrap_or_else(|| rng.range(0, pool.len()));
    Arc::clone(&pool[idx])
}

/// Language for one post.
///
/// With a filter: the persona's languages inside it, weighted by the persona's
/// mix, else uniform over the filter. Without one: the persona's mix, else
/// English.
fn pick_language(persona: &Persona, filter: &[String], rng: &mut SimRng) -> String {
    let dist: &BTreeMap<String, f64> = &persona.behavior.language_distribution;
    if filter.is_empty() {
        let langs: Vec<&String> = dist.keys().collect();
        let weights: Vec<f64> = dist.values().copied().collect();
        return rng
            .weighted_index(&weights)
            .map_or_else(|| DEFAULT_LANGUAGE.to_string(), |idx| langs[idx].clone());
    }

    let overlap: Vec<(&String, f64)> = filter
        .iter()
        .filter_map(|l| dist.get(l).map(|w| (l, *w)))
        .filter(|(_, w)| *w > 0.0)
        .collect();
    let weights: Vec<f64> = overlap.iter().map(|(_, w)| *w).collect();
    match rng.weighted_index(&weights) {
        Some(idx) => overlap[idx].0.clone(),
        None => filter[rng.range(0, filter.len())].clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PersonaSpec;

    fn generator_with(catalog: PersonaCatalog, limits: GeneratorLimits) -> Generator {
        Generator::new(
            Arc::new(catalog),
            Arc::new(TopicGraph::seeded()),
            Arc::new(BoundedPostStore::new(100)),
            Arc::new(RngService::new(None)),
            PostSynthesizer::default(),
            limits,
        )
    }

    fn generator() -> Generator {
        generator_with(PersonaCatalog::seeded(42, 20), GeneratorLimits::default())
    }

    fn toxic_catalog() -> (PersonaCatalog, String) {
        let catalog = PersonaCatalog::empty();
        let mut spec = PersonaSpec::new("Grump", "grump");
        spec.toxicity = 0.9;
        let persona = catalog.create(spec).unwrap();
        (catalog, persona.id.clone())
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let graph = TopicGraph::seeded();
        let catalog = PersonaCatalog::seeded(42, 0);
        let ok = GenerateParams::new(3);
        assert!(ok.validate(1000, &graph, &catalog).is_ok());

        let zero = GenerateParams::new(0);
        assert!(matches!(zero.validate(1000, &graph, &catalog), Err(HurlError::InvalidParameter(_))));

        let big = GenerateParams::new(1001);
        assert!(matches!(big.validate(1000, &graph, &catalog), Err(HurlError::InvalidParameter(_))));

        let tox = GenerateParams {
            toxicity_max: f64::NAN,
            ..GenerateParams::new(1)
        };
        assert!(matches!(tox.validate(1000, &graph, &catalog), Err(HurlError::InvalidParameter(_))));

        let blank = GenerateParams {
            languages: vec![" ".into()],
            ..GenerateParams::new(1)
        };
        assert!(matches!(blank.validate(1000, &graph, &catalog), Err(HurlError::InvalidParameter(_))));

        let topic = GenerateParams {
            topics: vec!["nope".into()],
            ..GenerateParams::new(1)
        };
        assert!(matches!(
            topic.validate(1000, &graph, &catalog),
            Err(HurlError::NotFound { kind: "topic", .. })
        ));

        let persona = GenerateParams {
            persona_ids: vec!["nobody".into()],
            ..GenerateParams::new(1)
        };
        assert!(matches!(
            persona.validate(1000, &graph, &catalog),
            Err(HurlError::NotFound { kind: "persona", .. })
        ));
    }

    #[test]
    fn test_params_deserialize_with_aliases() {
        let params: GenerateParams = serde_json::from_str(
            r#"{"count": 2, "mode": "pure_random", "language": ["en"], "reading_level": 9}"#,
        )
        .unwrap();
        assert_eq!(params.count, 2);
        assert_eq!(params.mode, Mode::PureRandom);
        assert_eq!(params.languages, vec!["en".to_string()]);
        assert_eq!(params.max_reading_level, Some(9));
        assert_eq!(params.toxicity_max, 0.3);
    }

    #[tokio::test]
    async fn test_generate_respects_filters() {
        let g = generator();
        let personas = g.catalog.list();
        let chosen = vec![personas[0].id.clone(), personas[1].id.clone()];
        let params = GenerateParams {
            topics: vec!["ai".into(), "crypto".into()],
            persona_ids: chosen.clone(),
            languages: vec!["en".into()],
            toxicity_max: 1.0,
            ..GenerateParams::new(20).with_seed(5)
        };
        for mode in [Mode::Emergent, Mode::PureRandom] {
            let posts = g.generate(&params.clone().with_mode(mode)).await.unwrap();
            assert_eq!(posts.len(), 20);
            for post in &posts {
                assert!(chosen.contains(&post.persona_id));
                assert!(!post.topics.is_empty() && post.topics.len() <= 2);
                assert!(post.topics.iter().all(|t| t == "ai" || t == "crypto"));
                assert_eq!(post.language, "en");
                assert_eq!(post.mode, mode);
            }
        }
    }

    #[tokio::test]
    async fn test_generated_posts_are_stored() {
        let g = generator();
        let posts = g
            .generate(&GenerateParams {
                toxicity_max: 1.0,
                ..GenerateParams::new(5).with_seed(1)
            })
            .await
            .unwrap();
        assert_eq!(g.store.len(), 5);
        for post in &posts {
            assert_eq!(g.store.get(&post.id).as_deref(), Some(post));
            assert!(post.lineage.influences.len() <= MAX_INFLUENCES);
            assert!(!post.lineage.influences.contains(&post.id));
        }
    }

    #[tokio::test]
    async fn test_toxicity_gate_fails_after_cap() {
        let (catalog, id) = toxic_catalog();
        let g = generator_with(catalog, GeneratorLimits::default());
        let params = GenerateParams {
            toxicity_max: 0.0,
            ..GenerateParams::new(1).with_seed(42)
        };
        let err = g.generate(&params).await.unwrap_err();
        assert_eq!(
            err,
            HurlError::ToxicityUnsatisfiable {
                persona_id: id,
                attempts: DEFAULT_TOXICITY_ATTEMPTS,
                toxicity_max: 0.0,
            }
        );
        assert!(g.store.is_empty());
    }

    #[tokio::test]
    async fn test_toxicity_gate_keeps_least_toxic() {
        let (catalog, id) = toxic_catalog();
        let g = generator_with(catalog, GeneratorLimits::default());
        let params = GenerateParams {
            toxicity_max: 0.0,
            on_exhausted: ExhaustedPolicy::KeepLeastToxic,
            ..GenerateParams::new(2).with_seed(42)
        };
        let posts = g.generate(&params).await.unwrap();
        assert_eq!(posts.len(), 2);
        for post in posts {
            assert_eq!(post.persona_id, id);
            assert!((0.9..=1.0).contains(&post.toxicity));
        }
    }

    #[tokio::test]
    async fn test_reading_level_can_empty_pool() {
        let g = generator();
        let params = GenerateParams {
            max_reading_level: Some(1),
            ..GenerateParams::new(1)
        };
        assert_eq!(g.generate(&params).await.unwrap_err(), HurlError::NoPersonasAvailable);
    }

    #[tokio::test]
    async fn test_empty_catalog_has_no_personas() {
        let g = generator_with(PersonaCatalog::empty(), GeneratorLimits::default());
        let err = g.generate(&GenerateParams::new(1)).await.unwrap_err();
        assert_eq!(err, HurlError::NoPersonasAvailable);
    }

    #[test]
    fn test_language_selection() {
        let mut spec = PersonaSpec::new("Poly", "poly");
        spec.behavior = Some(crate::persona::PersonaBehavior {
            language_distribution: BTreeMap::from([("es".to_string(), 1.0), ("en".to_string(), 0.0)]),
            ..Default::default()
        });
        let persona = PersonaCatalog::empty().create(spec).unwrap();
        let mut rng = SimRng::seeded(3);
        for _ in 0..50 {
            assert_eq!(pick_language(&persona, &[], &mut rng), "es");
            assert_eq!(pick_language(&persona, &["es".into(), "fr".into()], &mut rng), "es");
            let fallback = pick_language(&persona, &["fr".into(), "en".into()], &mut rng);
            assert!(fallback == "fr" || fallback == "en");
        }
    }

    #[test]
    fn test_persona_weight_favours_interest() {
        let catalog = PersonaCatalog::empty();
        let mut keen = PersonaSpec::new("Keen", "keen");
        keen.interests = BTreeMap::from([("ai".to_string(), 1.0)]);
        keen.influence = Some(0.0);
        let mut idle = PersonaSpec::new("Idle", "idle");
        idle.influence = Some(0.0);
        let keen = catalog.create(keen).unwrap();
        catalog.create(idle).unwrap();

        let pool = catalog.list();
        let mut rng = SimRng::seeded(0);
        for _ in 0..50 {
            assert_eq!(pick_persona(&pool, &["ai".into()], &mut rng).id, keen.id);
        }
    }
}
