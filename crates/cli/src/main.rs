//! Atelier CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration** — flags and environment variables via `clap`.
//! 2. **Wire observability** — `tracing-subscriber` on stderr plus an optional
//!    OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure** — `GeminiProvider` and
//!    `PollinationsRenderer`, injected into a `PipelineExecutor`.
//! 4. **Dispatch** — `run` (pipeline once, JSON on stdout), `ask` (one
//!    persona), `studio` (styled prompt and image), `serve` (HTTP API) or
//!    `personas` (list the catalog).

mod config;
mod telemetry;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use imaging::PollinationsRenderer;
use llm::GeminiProvider;
use nodes::{PersonaAgent, PipelineExecutor};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::{topic_or_default, Cli, Command, DEFAULT_TOPIC};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _telemetry = telemetry::init(&cli.logging)?;

    match &cli.command {
        Command::Personas => {
            for name in cli.catalog()?.names() {
                println!("{name}");
            }
        }
        Command::Run { topic } => {
            let executor = build_executor(&cli)?;
            let topic = match topic {
                Some(topic) => topic.clone(),
                None => prompt_topic().await?,
            };
            let result = executor.run(&topic).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Ask { persona, input } => {
            let executor = build_executor(&cli)?;
            let entry = executor.consult(persona, input).await?;
            println!("{}", entry.message);
        }
        Command::Studio { topic, style } => {
            let executor = build_executor(&cli)?;
            let sketch = executor.studio(topic, style).await?;
            println!("{}", serde_json::to_string_pretty(&sketch)?);
        }
        Command::Serve { host, port } => {
            let executor = build_executor(&cli)?;
            let tcp = TcpListener::bind((host.as_str(), *port))
                .await
                .with_context(|| format!("Failed to bind {host}:{port}"))?;
            listener::serve(tcp, Arc::new(executor), shutdown_signal())
                .await
                .context("HTTP server failed")?;
            info!("server stopped");
        }
    }

    Ok(())
}

fn build_executor(cli: &Cli) -> Result<PipelineExecutor> {
    let client = GeminiProvider::new(cli.gemini_config()?)?;
    let renderer = PollinationsRenderer::new(cli.renderer_config())?;
    Ok(PipelineExecutor::new(
        PersonaAgent::new(Arc::new(client)),
        Arc::new(renderer),
        Arc::new(cli.catalog()?),
        cli.executor_config(),
    ))
}

/// Asks for a topic on stdin.
async fn prompt_topic() -> Result<String> {
    print!("전시 주제를 입력하세요 (예: 사이버펑크 서울, 기본값: {DEFAULT_TOPIC}): ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read topic from stdin")?;
    Ok(topic_or_default(&line))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for Ctrl-C; shutting down");
    }
}
