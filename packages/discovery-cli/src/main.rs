//! `edu-discover`: find educational sources for a grade, subject and topic.
//!
//! Exits non-zero only when configuration is unusable. Backend failures
//! surface as an empty result list.

mod cache;
mod config;
mod output;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use edu_discovery::{
    build_backends, BackendKind, BackendSelection, DiscoveryOrchestrator, DiscoveryRequest, ExecutorConfig,
    Grade, SearchExecutor,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "edu-discover")]
#[command(about = "Discover grade-appropriate educational web sources")]
struct Cli {
    /// Grade: a number, "K", or free text such as "Grade 8"
    #[arg(long)]
    grade: String,

    #[arg(long)]
    subject: String,

    #[arg(long)]
    topic: String,

    #[arg(long)]
    subtopic: Option<String>,

    /// Content types: concept_explainer, reasoning, material_visual,
    /// material_equation, practice, video, simulation, printable.
    /// Repeat or comma separate
    #[arg(long = "content-types", value_delimiter = ',')]
    content_types: Vec<String>,

    #[arg(long, default_value_t = 10)]
    max_results: usize,

    #[arg(long, default_value = "us-en")]
    region: String,

    /// Only return results from trusted domains
    #[arg(long)]
    strict: bool,

    /// Print results as a JSON array
    #[arg(long)]
    json: bool,

    /// Backends: bing, duckduckgo, google, tavily. One name is tried first
    /// with the others as fallbacks; several names run exactly those
    /// in order
    #[arg(long, value_delimiter = ',')]
    backend: Vec<String>,

    /// JSON file replacing the built-in domain policy
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Write discovered URLs to this discovery cache file
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// Per-attempt backend timeout
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[arg(long)]
    debug: bool,

    /// Also write logs (without colors) to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// `--backend` wins over `DISCOVERY_METHOD`.
    fn selection(&self, config: &Config) -> Result<BackendSelection> {
        if self.backend.is_empty() {
            return Ok(config.method.clone());
        }
        BackendSelection::parse(&self.backend.join(",")).context("Invalid --backend")
    }

    fn request(&self, preferred: Option<BackendKind>) -> DiscoveryRequest {
        let mut request = DiscoveryRequest::new(
            Grade::parse(self.grade.as_str()),
            self.subject.as_str(),
            self.topic.as_str(),
        )
        .with_content_types(self.content_types.iter().map(|t| t.trim()))
        .with_max_results(self.max_results)
        .with_region(self.region.as_str())
        .strict(self.strict);
        if let Some(subtopic) = &self.subtopic {
            request = request.with_subtopic(subtopic.as_str());
        }
        if let Some(kind) = preferred {
            request = request.with_preferred_backend(kind.name());
        }
        request
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let default_filter = if cli.debug {
        "debug,edu_discovery=debug"
    } else {
        "info,edu_discovery=info"
    };
    let filter = if cli.debug {
        tracing_subscriber::EnvFilter::new(default_filter)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default_filter.into())
    };

    let file_layer = match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = Config::from_env()?;
    let policy = config.policy(cli.policy.as_deref())?;

    let selection = cli.selection(&config)?;
    let backends = build_backends(&selection, &config.credentials)
        .context("Failed to set up search backends")?;

    let mut executor_config = ExecutorConfig::default();
    if let Some(timeout) = cli.timeout_secs.map(Duration::from_secs).or(config.timeout) {
        executor_config = executor_config.with_call_timeout(timeout);
    }
    let executor = SearchExecutor::new(backends, executor_config)?;
    let discovery = DiscoveryOrchestrator::new(policy, executor)?;

    tracing::info!(backends = ?discovery.executor().backend_names(), "Starting discovery");

    let results = discovery.search(&cli.request(selection.preferred())).await?;

    if cli.json {
        println!("{}", output::render_json(&results)?);
    } else {
        println!("{}", output::render_human(&results));
    }

    if let Some(path) = &cli.cache_file {
        let cache = cache::write_results(path, &results)?;
        tracing::info!(path = %path.display(), urls = cache.urls.len(), "Discovery cache written");
    }

    Ok(())
}
