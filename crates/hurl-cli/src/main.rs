mod config;
mod enhancer;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use hurl_core::{FeedSystem, GenerateParams, Mode};
use hurl_store::PostArchive;

use crate::config::{LlmProvider, Settings};
use crate::enhancer::OllamaEnhancer;
use crate::server::{AppState, app_router};

#[derive(Parser)]
#[command(name = "hurl", about = "Deterministic synthetic social-feed generator")]
struct Cli {
    /// TOML settings file (falls back to HURL_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API with the background trend engine
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Generate a batch of posts and print them as JSON
    Generate {
        #[arg(long, default_value_t = 10)]
        count: usize,

        /// emergent or pure_random
        #[arg(long, default_value = "emergent")]
        mode: Mode,

        /// Comma-separated topic ids
        #[arg(long, value_delimiter = ',')]
        topics: Vec<String>,

        /// Comma-separated persona ids
        #[arg(long, value_delimiter = ',')]
        personas: Vec<String>,

        /// Comma-separated language codes
        #[arg(long, value_delimiter = ',')]
        languages: Vec<String>,

        #[arg(long, default_value_t = 0.3)]
        toxicity_max: f64,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        max_reading_level: Option<u8>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Inject shocks, run trend ticks and print the scores
    Trends {
        /// topic:magnitude[:half_life_secs], repeatable
        #[arg(long = "shock")]
        shocks: Vec<String>,

        #[arg(long, default_value_t = 1)]
        ticks: usize,
    },

    /// List personas
    Personas {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// List topics with their current trend scores
    Topics,

    /// Print archived posts from the SQLite store
    Archive {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(settings, host, port).await,
        Commands::Generate {
            count,
            mode,
            topics,
            personas,
            languages,
            toxicity_max,
            seed,
            max_reading_level,
            pretty,
        } => {
            let params = GenerateParams {
                count,
                mode,
                topics,
                persona_ids: personas,
                languages,
                toxicity_max,
                seed,
                max_reading_level,
                ..GenerateParams::default()
            };
            cmd_generate(&settings, &params, pretty).await
        }
        Commands::Trends { shocks, ticks } => cmd_trends(&settings, &shocks, ticks),
        Commands::Personas { limit } => cmd_personas(&settings, limit),
        Commands::Topics => cmd_topics(&settings),
        Commands::Archive { limit } => cmd_archive(&settings, limit),
    }
}

fn build_system(settings: &Settings) -> Result<FeedSystem> {
    let mut config = settings.system_config();
    if settings.llm_provider == LlmProvider::Ollama {
        let enhancer = OllamaEnhancer::new(
            &settings.llm_url,
            &settings.llm_model,
            settings.enhancement_timeout(),
        )
        .context("failed to build LLM client")?;
        tracing::info!(url = %settings.llm_url, model = %settings.llm_model, "LLM enhancement enabled");
        config.enhancer = Some(Arc::new(enhancer));
    }
    Ok(FeedSystem::new(config))
}

fn open_archive(settings: &Settings) -> Result<Option<PostArchive>> {
    if !settings.persist {
        return Ok(None);
    }
    let archive = PostArchive::open(&settings.db_path)
        .with_context(|| format!("failed to open archive {}", settings.db_path.display()))?;
    Ok(Some(archive))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn cmd_serve(mut settings: Settings, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        settings.host = host;
    }
    if let Some(port) = port {
        settings.port = port;
    }

    let system = Arc::new(build_system(&settings)?);
    let archive = open_archive(&settings)?;
    let addr = format!("{}:{}", settings.host, settings.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on {addr}");
    eprintln!("hurl listening on http://{addr}");

    let state = AppState::new(Arc::clone(&system), archive, settings);
    serve_with_trends(listener, state, shutdown_signal()).await
}

/// Runs the trend engine for exactly as long as the server, on clean and failed exits alike.
async fn serve_with_trends(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let system = Arc::clone(&state.system);
    system.start();
    let served = axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown)
        .await;
    system.stop().await;
    served.context("server error")
}

async fn cmd_generate(settings: &Settings, params: &GenerateParams, pretty: bool) -> Result<()> {
    let system = build_system(settings)?;
    let posts = system
        .generate(params)
        .await
        .context("generation failed")?;

    if let Some(archive) = open_archive(settings)? {
        let added = archive
            .append_batch(&posts)
            .context("failed to archive posts")?;
        tracing::info!(added, "archived posts");
    }

    let json = if pretty {
        serde_json::to_string_pretty(&posts)?
    } else {
        serde_json::to_string(&posts)?
    };
    println!("{json}");
    Ok(())
}

/// `topic:magnitude[:half_life_secs]`; half-life defaults to 300 s.
fn parse_shock(raw: &str) -> Result<(String, f64, f64)> {
    let parts: Vec<&str> = raw.split(':').collect();
    let (topic, magnitude, half_life) = match parts.as_slice() {
        [topic, magnitude] => (*topic, *magnitude, "300"),
        [topic, magnitude, half_life] => (*topic, *magnitude, *half_life),
        _ => bail!("invalid shock '{raw}', expected topic:magnitude[:half_life]"),
    };
    let magnitude: f64 = magnitude
        .parse()
        .with_context(|| format!("invalid shock magnitude in '{raw}'"))?;
    let half_life: f64 = half_life
        .parse()
        .with_context(|| format!("invalid shock half-life in '{raw}'"))?;
    Ok((topic.to_string(), magnitude, half_life))
}

fn cmd_trends(settings: &Settings, shocks: &[String], ticks: usize) -> Result<()> {
    let system = build_system(settings)?;
    for raw in shocks {
        let (topic, magnitude, half_life) = parse_shock(raw)?;
        system
            .inject_shock(&topic, magnitude, half_life)
            .with_context(|| format!("failed to inject shock '{raw}'"))?;
    }
    for _ in 0..ticks {
        system.tick().context("trend tick failed")?;
    }

    let mut points = system.trend_snapshot();
    points.sort_by(|a, b| b.trend_score.total_cmp(&a.trend_score));
    for p in points {
        println!("{:<16} {:>7.3} {:>+8.3}", p.topic_id, p.trend_score, p.velocity);
    }
    Ok(())
}

fn cmd_personas(settings: &Settings, limit: usize) -> Result<()> {
    let system = build_system(settings)?;
    let personas = system.list_personas();
    for p in personas.iter().take(limit) {
        println!("{}  {:<20} {}", p.id, p.handle, p.display_name);
    }
    println!("({} of {})", personas.len().min(limit), personas.len());
    Ok(())
}

fn cmd_topics(settings: &Settings) -> Result<()> {
    let system = build_system(settings)?;
    for t in system.list_topics() {
        println!("{:<16} {:<28} {:.3}", t.id, t.name, t.trend_score);
    }
    Ok(())
}

fn cmd_archive(settings: &Settings, limit: usize) -> Result<()> {
    let archive = PostArchive::open(&settings.db_path)
        .with_context(|| format!("failed to open archive {}", settings.db_path.display()))?;
    let posts = archive.recent(limit).context("failed to read archive")?;
    eprintln!("{} of {} archived posts", posts.len(), archive.count()?);
    println!("{}", serde_json::to_string(&posts)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shock_default_half_life() {
        let (topic, magnitude, half_life) = parse_shock("ai:5").unwrap();
        assert_eq!(topic, "ai");
        assert_eq!(magnitude, 5.0);
        assert_eq!(half_life, 300.0);
    }

    #[test]
    fn test_parse_shock_explicit_half_life() {
        let (_, _, half_life) = parse_shock("gaming:2.5:60").unwrap();
        assert_eq!(half_life, 60.0);
    }

    #[tokio::test]
    async fn test_trends_run_only_while_serving() {
        let system = Arc::new(FeedSystem::new(Settings::default().system_config()));
        let state = AppState::new(Arc::clone(&system), None, Settings::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel();
        let watched = Arc::clone(&system);
        let shutdown = async move {
            let _ = tx.send(watched.is_running());
        };

        assert!(!system.is_running());
        serve_with_trends(listener, state, shutdown).await.unwrap();
        assert!(rx.await.unwrap(), "engine was not running while serving");
        assert!(!system.is_running());
    }

    #[test]
    fn test_parse_shock_rejects_garbage() {
        assert!(parse_shock("ai").is_err());
        assert!(parse_shock("ai:lots").is_err());
        assert!(parse_shock("a:1:2:3").is_err());
    }
}
