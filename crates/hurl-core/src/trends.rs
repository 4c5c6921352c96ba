//! Trend diffusion over the topic graph.
//!
//! Each tick blends a topic's own score, the weighted scores of its
//! in-neighbors, and the decayed contribution of every live shock, then pulls
//! the result towards the baseline and clamps it. All topics update from one
//! pre-tick snapshot and the new state is committed in a single write.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::constants::{
    BASELINE_SCORE, MIN_HALF_LIFE_SECS, MIN_TICK_ELAPSED_SECS, RECENCY_DECAY, SCORE_MAX,
    SCORE_MIN, SHOCK_EPSILON, TREND_ALPHA, TREND_BETA,
};
use crate::error::{HurlError, Result};
use crate::time::now_secs;
use crate::topics::{TopicGraph, TrendState};

/// A transient impulse on one topic's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shock {
    pub topic_id: String,
    pub magnitude: f64,
    pub half_life_secs: f64,
    /// Unix seconds.
    pub created_at: f64,
}

impl Shock {
    /// `magnitude · 0.5^(age / half_life)`. Ages below zero count as zero.
    pub fn contribution_at(&self, now: f64) -> f64 {
        let age = (now - self.created_at).max(0.0);
        self.magnitude * 0.5f64.powf(age / self.half_life_secs)
    }
}

/// Coefficients of the tick update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendParams {
    pub alpha: f64,
    pub beta: f64,
    pub recency_decay: f64,
    pub baseline: f64,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            alpha: TREND_ALPHA,
            beta: TREND_BETA,
            recency_decay: RECENCY_DECAY,
            baseline: BASELINE_SCORE,
        }
    }
}

/// One row of [`TrendEngine::snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub topic_id: String,
    pub trend_score: f64,
    pub velocity: f64,
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub elapsed_secs: f64,
    /// Summed shock contribution per topic, for topics with a live shock.
    pub shock_contributions: BTreeMap<String, f64>,
    pub expired_shocks: usize,
}

struct Runner {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the time evolution of a [`TopicGraph`] and its shock ledger.
pub struct TrendEngine {
    graph: Arc<TopicGraph>,
    params: TrendParams,
    shocks: Mutex<Vec<Shock>>,
    /// Serializes ticks and remembers when the last one ran.
    last_tick: Mutex<f64>,
    runner: Mutex<Option<Runner>>,
}

impl std::fmt::Debug for TrendEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrendEngine")
            .field("params", &self.params)
            .field("shocks", &self.shocks.lock().len())
            .field("running", &self.is_running())
            .finish()
    }
}

impl TrendEngine {
    pub fn new(graph: Arc<TopicGraph>) -> Self {
        Self::with_params(graph, TrendParams::default())
    }

    pub fn with_params(graph: Arc<TopicGraph>, params: TrendParams) -> Self {
        Self {
            graph,
            params,
            shocks: Mutex::new(Vec::new()),
            last_tick: Mutex::new(now_secs()),
            runner: Mutex::new(None),
        }
    }

    pub fn graph(&self) -> &Arc<TopicGraph> {
        &self.graph
    }

    pub fn params(&self) -> TrendParams {
        self.params
    }

    pub fn inject_shock(&self, topic_id: &str, magnitude: f64, half_life_secs: f64) -> Result<()> {
        self.inject_shock_at(topic_id, magnitude, half_life_secs, now_secs())
    }

    /// Record a shock created at `now` (Unix seconds).
    pub fn inject_shock_at(
        &self,
        topic_id: &str,
        magnitude: f64,
        half_life_secs: f64,
        now: f64,
    ) -> Result<()> {
        if !self.graph.contains(topic_id) {
            return Err(HurlError::topic_not_found(topic_id));
        }
        if !magnitude.is_finite() || magnitude < 0.0 {
            return Err(HurlError::invalid(format!(
                "shock magnitude must be a finite value >= 0, got {magnitude}"
            )));
        }
        if !half_life_secs.is_finite() || half_life_secs < MIN_HALF_LIFE_SECS {
            return Err(HurlError::invalid(format!(
                "shock half-life must be >= {MIN_HALF_LIFE_SECS}s, got {half_life_secs}"
            )));
        }

        self.shocks.lock().push(Shock {
            topic_id: topic_id.to_string(),
            magnitude,
            half_life_secs,
            created_at: now,
        });
        tracing::info!(topic = topic_id, magnitude, half_life_secs, "shock injected");
        Ok(())
    }

    /// Live shocks, oldest first.
    pub fn shocks(&self) -> Vec<Shock> {
        self.shocks.lock().clone()
    }

    /// Summed contribution of every shock on `topic_id` at `now`.
    pub fn shock_contribution(&self, topic_id: &str, now: f64) -> f64 {
        self.shocks
            .lock()
            .iter()
            .filter(|s| s.topic_id == topic_id)
            .map(|s| s.contribution_at(now))
            .sum()
    }

    pub fn tick(&self) -> Result<TickReport> {
        self.tick_at(now_secs())
    }

    /// Advance every topic to time `now` (Unix seconds).
    ///
    /// On a non-finite result nothing is committed and the shock ledger is
    /// left as it was.
    pub fn tick_at(&self, now: f64) -> Result<TickReport> {
        let mut last_tick = self.last_tick.lock();
        let elapsed = (now - *last_tick).max(MIN_TICK_ELAPSED_SECS);

        let (live, expired) = {
            let shocks = self.shocks.lock();
            let live: Vec<Shock> = shocks
                .iter()
                .filter(|s| s.contribution_at(now) >= SHOCK_EPSILON)
                .cloned()
                .collect();
            let expired = shocks.len() - live.len();
            (live, expired)
        };

        let mut contributions = vec![0.0; self.graph.len()];
        let mut shock_contributions = BTreeMap::new();
        for shock in &live {
            if let Some(idx) = self.graph.index_of(&shock.topic_id) {
                let c = shock.contribution_at(now);
                contributions[idx] += c;
                *shock_contributions.entry(shock.topic_id.clone()).or_insert(0.0) += c;
            }
        }

        let before = self.graph.read_state();
        let p = self.params;
        let mut next = TrendState {
            scores: Vec::with_capacity(before.scores.len()),
            velocities: Vec::with_capacity(before.scores.len()),
        };

        for (idx, &current) in before.scores.iter().enumerate() {
            let incoming = self.graph.in_edges_at(idx);
            let neighbor = if incoming.is_empty() {
                0.0
            } else {
                incoming
                    .iter()
                    .map(|&(src, w)| w * before.scores[src])
                    .sum::<f64>()
                    / incoming.len() as f64
            };

            let raw = p.alpha * current + p.beta * neighbor + contributions[idx];
            let blended = raw * p.recency_decay + p.baseline * (1.0 - p.recency_decay);
            if !blended.is_finite() {
                return Err(HurlError::NonFiniteScore {
                    topic_id: self.graph.id_at(idx).to_string(),
                });
            }
            let score = blended.clamp(SCORE_MIN, SCORE_MAX);
            next.scores.push(score);
            next.velocities.push((score - current) / elapsed);
        }

        self.graph.commit_state(next);
        {
            // Shocks injected while this tick ran were not in `live`; keep them.
            let mut shocks = self.shocks.lock();
            shocks.retain(|s| s.contribution_at(now) >= SHOCK_EPSILON);
        }
        *last_tick = now;

        tracing::debug!(
            elapsed,
            live = live.len(),
            expired,
            "trend tick"
        );
        Ok(TickReport {
            elapsed_secs: elapsed,
            shock_contributions,
            expired_shocks: expired,
        })
    }

    /// `(topic, score, velocity)` for every topic, from one consistent read.
    pub fn snapshot(&self) -> Vec<TrendPoint> {
        self.graph
            .all()
            .into_iter()
            .map(|t| TrendPoint {
                topic_id: t.id,
                trend_score: t.trend_score,
                velocity: t.velocity,
            })
            .collect()
    }

    /// Start the periodic tick task. Returns `false` if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>, interval: Duration) -> bool {
        let mut runner = self.runner.lock();
        if runner.is_some() {
            return false;
        }

        let token = CancellationToken::new();
        let engine = Arc::clone(self);
        let child = token.clone();
        let period = interval.max(Duration::from_millis(10));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = engine.tick() {
                            tracing::warn!("trend tick failed: {e}");
                        }
                    }
                }
            }
            tracing::debug!("trend loop exited");
        });

        *runner = Some(Runner { token, handle });
        tracing::info!(interval_secs = period.as_secs_f64(), "trend engine started");
        true
    }

    /// Stop the periodic task and wait for it to exit. Returns `false` if it
    /// was not running.
    pub async fn stop(&self) -> bool {
        let runner = self.runner.lock().take();
        let Some(runner) = runner else {
            return false;
        };
        runner.token.cancel();
        if let Err(e) = runner.handle.await {
            tracing::warn!("trend loop ended abnormally: {e}");
        }
        tracing::info!("trend engine stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.runner.lock().is_some()
    }
}
