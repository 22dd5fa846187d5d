//! meditation-music: meditation music generation with provider fallback.
//!
//! This binary can run in three modes:
//! - CLI mode: one-shot generation written to a local file
//! - Serve mode: HTTP gateway over the generation coordinator
//! - Issue-key mode: prints a new gateway API key

use std::time::Instant;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use meditation_music::cli::Cli;
use meditation_music::config::ServiceConfig;
use meditation_music::gateway::{fingerprint, run_server, ApiKeyRegistry};
use meditation_music::generation::Coordinator;
use meditation_music::types::AudioReference;

const DEFAULT_LOG_FILTER: &str = "meditation_music=info";

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let mut config = ServiceConfig::from_env();
    cli.apply_to(&mut config);
    if let Some(problem) = config.validate() {
        anyhow::bail!("invalid configuration: {}", problem);
    }

    if cli.is_issue_key_mode() {
        run_issue_key(&config);
        Ok(())
    } else if cli.is_serve_mode() {
        run_server(config).await
    } else if cli.is_cli_mode() {
        run_cli_mode(&cli, &config).await
    } else {
        print_usage();
        Ok(())
    }
}

/// Runs one generation and writes the artifact to disk.
async fn run_cli_mode(cli: &Cli, config: &ServiceConfig) -> anyhow::Result<()> {
    let prompt = cli.prompt.as_deref().unwrap_or_default();
    let generation = cli.generation_config();
    let coordinator = Coordinator::from_config(config);

    eprintln!("=== meditation-music ===");
    eprintln!("Prompt: \"{}\"", prompt);
    eprintln!("Duration: {}s", generation.duration_sec);
    eprintln!(
        "Providers: {} (preferred: {}, fallback: {})",
        coordinator.provider_names().join(", "),
        coordinator.preferred_provider(),
        coordinator.fallback_provider()
    );
    eprintln!();

    let start_time = Instant::now();
    let audio = coordinator
        .generate(prompt, &generation)
        .await
        .map_err(meditation_music::MusicError::from)?;
    let generation_time_sec = start_time.elapsed().as_secs_f32();

    eprintln!("Generation complete!");
    eprintln!("  Provider: {}", audio.metadata.provider);
    eprintln!("  Time: {:.2}s", generation_time_sec);
    eprintln!("  Audio duration: {}s", audio.duration_sec);
    if audio.was_clamped() {
        eprintln!(
            "  Note: requested {}s, provider maximum applied",
            audio.metadata.requested_duration_sec
        );
    }
    eprintln!("  Prompt sent: {}", audio.metadata.prompt);
    eprintln!();

    match audio.audio {
        AudioReference::Inline(ref bytes) => {
            let output_path = cli.output_path(audio.format);
            if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            tokio::fs::write(&output_path, bytes)
                .await
                .with_context(|| format!("writing {}", output_path.display()))?;
            eprintln!("Saved to: {}", output_path.display());
        }
        AudioReference::Uri(ref uri) => {
            eprintln!("Audio available at: {}", uri);
        }
    }

    Ok(())
}

/// Issues a new gateway key against the configured key set and prints it.
fn run_issue_key(config: &ServiceConfig) {
    let registry = ApiKeyRegistry::from_keys(&config.api_keys);
    let key = registry.issue();
    println!("{}", key);
    eprintln!("Fingerprint: {}", fingerprint(&key));
    eprintln!("Keys now accepted: {}", registry.len());
    eprintln!("Add the key to MUSIC_API_KEYS to accept it at the gateway.");
}

/// Prints usage information.
fn print_usage() {
    eprintln!("meditation-music: meditation music generation with provider fallback");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  One-shot generation:");
    eprintln!("    meditation-music --prompt \"calming music for deep sleep\" --duration 60 --tempo slow --key \"C minor\"");
    eprintln!();
    eprintln!("  HTTP gateway:");
    eprintln!("    meditation-music --serve --bind 127.0.0.1:8080");
    eprintln!();
    eprintln!("  New gateway key:");
    eprintln!("    meditation-music --issue-key");
    eprintln!();
    eprintln!("Set ELEVENLABS_API_KEY to enable the hosted provider; without it the");
    eprintln!("synthetic tone provider is used.");
    eprintln!();
    eprintln!("Run 'meditation-music --help' for full options.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_usage_doesnt_panic() {
        print_usage();
    }
}
