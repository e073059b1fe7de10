use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::http::HeaderName;
use cmudict_db::{CmuDict, LoadMode};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commentverse::rate_limit::{RateLimitConfig, RateLimiterLayer};
use commentverse::{AppState, Composer, load_corpus, router};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_CORPUS: &str = "corpus.txt";
const DEFAULT_CMUDICT_PATH: &str = "cmudict.dict";
const DEFAULT_CMUDICT_IMAGE_PATH: &str = "/app/cmudict.dict";
const DEFAULT_RATE_LIMIT_RPS: u32 = 5;
const DEFAULT_RATE_LIMIT_BURST: u32 = 10;
const DEFAULT_RATE_LIMIT_HEADER: &str = "x-forwarded-for";
const DEFAULT_MAX_CORPUS_LINES: usize = 20_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config();
    info!("binding to {}:{}", config.host, config.port);
    info!("using corpus at {}", config.corpus_path.display());
    info!(
        "using cmudict at {} (mode: {:?})",
        config.cmudict_path.display(),
        config.cmudict_mode
    );
    info!(
        "rate limit: {} req/s (burst {}) keyed by {}",
        config.rate_limit.rate_per_sec, config.rate_limit.burst, config.rate_limit.client_header
    );

    let dict_start = Instant::now();
    let dict = CmuDict::load_with_mode(&config.cmudict_path, config.cmudict_mode)?;
    info!(
        "cmudict loaded in {} ms ({} words, {} pronunciations)",
        dict_start.elapsed().as_millis(),
        dict.word_count(),
        dict.pronunciation_count()
    );

    let corpus = load_corpus(&config.corpus_path)
        .with_context(|| format!("loading corpus {}", config.corpus_path.display()))?;
    let state = AppState::new(Arc::new(dict), corpus.as_slice(), config.max_corpus_lines);
    let stats = Composer::with_snapshot(&*state.oracle, &state.snapshot).stats();
    info!(
        "corpus: {} fragments, {} rhyme groups (largest {}), {} syllable candidates",
        stats.fragments, stats.rhyme_groups, stats.largest_rhyme_group, stats.syllable_candidates
    );
    if stats.usable == 0 {
        warn!("no fragment in the startup corpus is usable; only POSTed corpora will work");
    }

    let rate_limiter = RateLimiterLayer::new(config.rate_limit.clone());
    let app = router(state)
        .layer(rate_limiter)
        .layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid listen address")?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Clone)]
struct Config {
    host: String,
    port: u16,
    corpus_path: PathBuf,
    cmudict_path: PathBuf,
    cmudict_mode: LoadMode,
    rate_limit: RateLimitConfig,
    max_corpus_lines: usize,
}

fn load_config() -> Config {
    let mut cli_cmudict: Option<PathBuf> = None;
    let mut cli_cmudict_mode: Option<LoadMode> = None;
    let mut cli_corpus: Option<PathBuf> = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--cmudict" => cli_cmudict = args.next().map(PathBuf::from),
            "--corpus" => cli_corpus = args.next().map(PathBuf::from),
            _ => {
                if let Some(path) = arg.strip_prefix("--cmudict=") {
                    cli_cmudict = Some(PathBuf::from(path));
                } else if let Some(mode) = arg.strip_prefix("--cmudict-mode=") {
                    cli_cmudict_mode = parse_load_mode(mode);
                } else if let Some(path) = arg.strip_prefix("--corpus=") {
                    cli_corpus = Some(PathBuf::from(path));
                }
            }
        }
    }

    let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = env_parse("PORT").unwrap_or(DEFAULT_PORT);
    let corpus_path = cli_corpus
        .or_else(|| env::var("CORPUS_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS));
    let cmudict_path = cli_cmudict
        .or_else(|| env::var("CMUDICT_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(default_cmudict_path);
    let cmudict_mode = cli_cmudict_mode
        .or_else(|| {
            env::var("CMUDICT_LOAD_MODE")
                .ok()
                .as_deref()
                .and_then(parse_load_mode)
        })
        .unwrap_or(LoadMode::Mmap);
    let rate_per_sec = env_parse::<u32>("RATE_LIMIT_RPS")
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RATE_LIMIT_RPS);
    let burst = env_parse::<u32>("RATE_LIMIT_BURST")
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RATE_LIMIT_BURST);
    let client_header = env::var("RATE_LIMIT_HEADER")
        .ok()
        .and_then(|name| HeaderName::try_from(name.trim().to_ascii_lowercase()).ok())
        .unwrap_or_else(|| HeaderName::from_static(DEFAULT_RATE_LIMIT_HEADER));
    let max_corpus_lines = env_parse::<usize>("MAX_CORPUS_LINES")
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_MAX_CORPUS_LINES);

    Config {
        host,
        port,
        corpus_path,
        cmudict_path,
        cmudict_mode,
        rate_limit: RateLimitConfig {
            rate_per_sec,
            burst,
            client_header,
        },
        max_corpus_lines,
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn default_cmudict_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_CMUDICT_PATH);
    if local.exists() {
        return local;
    }
    PathBuf::from(DEFAULT_CMUDICT_IMAGE_PATH)
}

fn parse_load_mode(raw: &str) -> Option<LoadMode> {
    match raw.to_ascii_lowercase().as_str() {
        "mmap" => Some(LoadMode::Mmap),
        "owned" => Some(LoadMode::Owned),
        _ => None,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
