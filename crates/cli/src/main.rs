//! CrewLine CLI entry point.
//!
//! This binary is the composition root for the workspace:
//!
//! 1. **Load configuration** from `.env` and the process environment.
//! 2. **Wire observability**: `tracing-subscriber` to stderr, optionally as
//!    JSON, plus an OTLP exporter when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//! 3. **Construct infrastructure**: the Groq completion provider, injected
//!    into a [`CrewRunner`].
//! 4. **Select mode**:
//!    - default: run one crew on the topic formed by the positional words and
//!      print the result envelope as indented JSON on stdout;
//!    - `--serve`: start the HTTP API until Ctrl-C.
//!
//! A failed crew run is still reported through the envelope and exits `0`.
//! Only startup problems (bad configuration, port in use) exit non-zero.

mod config;
mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use listener::{AppState, ServiceInfo};
use llm::GroqProvider;
use nodes::{CrewKind, CrewOptions, CrewRunner, Verbosity, DEFAULT_TOPIC};
use tracing::{info, warn, Level};

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "crewline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run a sequential crew of LLM agents on a topic", long_about = None)]
struct Cli {
    /// Start the HTTP API instead of running once
    #[arg(long)]
    serve: bool,

    /// Port for the HTTP API
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Crew to run: `full` (content marketing) or `prototype` (analyst)
    #[arg(long, env = "CREW_MODE")]
    mode: Option<CrewKind>,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json_logs: bool,

    /// Log every prompt and task output
    #[arg(short, long)]
    verbose: bool,

    /// Topic words; joined with spaces
    topic: Vec<String>,
}

impl Cli {
    fn topic(&self) -> String {
        let joined = self.topic.join(" ");
        if joined.trim().is_empty() {
            DEFAULT_TOPIC.to_string()
        } else {
            joined
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let telemetry = telemetry::init_tracing(cli.json_logs, level)?;

    let outcome = run(cli).await;
    telemetry.shutdown();
    outcome
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    if config.api_key.is_none() {
        warn!("GROQ_API_KEY is not set; crew runs will fail until it is configured");
    }

    let kind = cli.mode.unwrap_or_default();
    let verbosity = if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Quiet
    };
    let provider = GroqProvider::new(config.groq()).context("failed to build Groq client")?;
    let runner = CrewRunner::new(Arc::new(provider), config.models()?, CrewOptions { verbosity })
        .with_default_kind(kind);

    if cli.serve {
        serve(cli.port, runner, &config).await
    } else {
        run_once(&cli.topic(), &runner).await
    }
}

async fn run_once(topic: &str, runner: &CrewRunner) -> Result<()> {
    info!(%topic, crew = %runner.default_kind(), "starting crew run");
    let envelope = runner.run(topic).await;
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

async fn serve(port: u16, runner: CrewRunner, config: &Config) -> Result<()> {
    let info = ServiceInfo {
        service: "CrewLine API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: config.environment.clone(),
        model: runner.models().for_kind(runner.default_kind()).to_string(),
        llm_configured: config.api_key.is_some(),
    };
    let state = AppState::new(runner, info, config.run_timeout);

    let listener = listener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    listener::serve(listener, state, shutdown_signal()).await?;
    info!("crew API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_joined_into_the_topic() {
        let cli = Cli::try_parse_from(["crewline", "AI", "in", "healthcare"]).unwrap();
        assert_eq!(cli.topic(), "AI in healthcare");
        assert!(!cli.serve);
    }

    #[test]
    fn words_are_kept_verbatim() {
        let cli = Cli::try_parse_from(["crewline", " AI ", "in banking"]).unwrap();
        assert_eq!(cli.topic(), " AI  in banking");
    }

    #[test]
    fn empty_topic_falls_back_to_default() {
        let cli = Cli::try_parse_from(["crewline"]).unwrap();
        assert_eq!(cli.topic(), DEFAULT_TOPIC);
    }

    #[test]
    fn mode_accepts_crew_names() {
        let cli = Cli::try_parse_from(["crewline", "--mode", "prototype", "rust"]).unwrap();
        assert_eq!(cli.mode, Some(CrewKind::Analyst));

        assert!(Cli::try_parse_from(["crewline", "--mode", "turbo"]).is_err());
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from(["crewline", "--serve", "--port", "8080", "--json-logs"]).unwrap();
        assert!(cli.serve);
        assert_eq!(cli.port, 8080);
        assert!(cli.json_logs);
    }
}
