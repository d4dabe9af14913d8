use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bestiary_core::{
    AdjectiveIndex, AppConfig, BestiaryError, ExitCode, ResultMap, Subject, render_report,
};
use bestiary_scrape::{FetchOrchestrator, ScrapeError, WikiClient, extract_adjective_index};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "bestiary",
    about = "Animal collateral adjectives, illustrated",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting BESTIARY_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Config file to use instead of the standard location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the index, resolve every image and write the report.
    Run {
        /// Read the adjective index from a JSON file instead of fetching it.
        #[arg(long)]
        index: Option<PathBuf>,
        /// Report file.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Image directory.
        #[arg(long)]
        images: Option<PathBuf>,
        #[arg(long)]
        concurrency: Option<usize>,
        /// Also save the resolved image map as JSON.
        #[arg(long)]
        results: Option<PathBuf>,
    },

    /// Fetch the list page and print (or save) the adjective index.
    Extract {
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Resolve images for individual animal names.
    Resolve {
        #[arg(required = true)]
        names: Vec<String>,
        #[arg(long)]
        images: Option<PathBuf>,
    },

    /// Re-render a report from saved index and results.
    Render {
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        results: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
    /// Write a default config file.
    Init {
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let start = Instant::now();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli, start).await {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code(&e) as i32);
    }
}

async fn run(cli: Cli, start: Instant) -> Result<()> {
    let json_output = cli.json || std::env::var("BESTIARY_JSON").as_deref() == Ok("1");

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let mut config = AppConfig::load_from(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    match cli.command {
        Commands::Run {
            index,
            output,
            images,
            concurrency,
            results,
        } => {
            if let Some(output) = output {
                config.output.report_path = output;
            }
            if let Some(images) = images {
                config.output.image_dir = images;
            }
            if let Some(concurrency) = concurrency {
                config.fetch.concurrency = concurrency;
            }
            let started_at = Utc::now();

            let client = Arc::new(WikiClient::from_config(&config)?);
            let index = match index {
                Some(path) => AdjectiveIndex::load_json(&path)
                    .with_context(|| format!("reading index {}", path.display()))?,
                None => fetch_index(&client).await?,
            };
            tracing::info!(adjectives = index.len(), "adjective index ready");

            let orchestrator = FetchOrchestrator::from_config(&config, client.clone());
            let summary = orchestrator.resolve_all(&index).await;

            render_report(&index, &summary.results, &config.output.report_path)?;
            if let Some(path) = &results {
                summary.results.save_json(path)?;
            }
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "report": config.output.report_path,
                        "adjectives": index.len(),
                        "subjects": summary.dispatched,
                        "succeeded": summary.succeeded,
                        "failed": summary.failed,
                        "results": summary.results,
                    },
                    "meta": { "duration_ms": dur, "started_at": started_at.to_rfc3339() }
                }))?;
            } else {
                println!(
                    "Successfully downloaded {} of {} images.",
                    summary.succeeded, summary.dispatched
                );
                println!("Done! Check {}", config.output.report_path.display());
            }
        }

        Commands::Extract { out } => {
            let client = WikiClient::from_config(&config)?;
            let index = fetch_index(&client).await?;
            let dur = start.elapsed().as_millis();

            if let Some(path) = &out {
                index.save_json(path)?;
            }
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "adjectives": index.len(), "index": index },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if let Some(path) = &out {
                println!("Saved {} adjectives to {}", index.len(), path.display());
            } else {
                for (adjective, animals) in index.iter() {
                    println!("{adjective:<20}  {}", animals.join(", "));
                }
            }
        }

        Commands::Resolve { names, images } => {
            if let Some(images) = images {
                config.output.image_dir = images;
            }
            let client = Arc::new(WikiClient::from_config(&config)?);
            let orchestrator = FetchOrchestrator::from_config(&config, client);

            let mut items = Vec::new();
            for name in &names {
                let subject = Subject::new(name.as_str());
                let outcome = orchestrator.strategy().try_resolve_subject(&subject).await;
                match &outcome {
                    Ok(path) if !json_output => println!("✓ {name}: {}", path.display()),
                    Err(reason) if !json_output => println!("✗ {name}: {reason}"),
                    _ => {}
                }
                items.push(serde_json::json!({
                    "name": name,
                    "key": subject.key,
                    "path": outcome.as_ref().ok(),
                    "error": outcome.as_ref().err().map(|r| r.kind()),
                }));
            }

            if json_output {
                let dur = start.elapsed().as_millis();
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": items },
                    "meta": { "duration_ms": dur }
                }))?;
            }
        }

        Commands::Render {
            index,
            results,
            output,
        } => {
            let report_path = output.unwrap_or(config.output.report_path);
            let index = AdjectiveIndex::load_json(&index)
                .with_context(|| format!("reading index {}", index.display()))?;
            let results = ResultMap::load_json(&results)
                .with_context(|| format!("reading results {}", results.display()))?;
            render_report(&index, &results, &report_path)?;

            if json_output {
                let dur = start.elapsed().as_millis();
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "report": report_path, "images": results.success_count() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("Report written to {}", report_path.display());
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Path => {
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":{"path":config_path}}))?;
                } else {
                    println!("{}", config_path.display());
                }
            }
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":config_values(&config)?}))?;
                } else {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
            ConfigAction::Init { force } => {
                if config_path.exists() && !force {
                    eprintln!(
                        "Config already exists at {}. Add --force to overwrite.",
                        config_path.display()
                    );
                    std::process::exit(ExitCode::InvalidArgs as i32);
                }
                AppConfig::default().save_to(&config_path)?;
                println!("✓ Wrote default config to {}", config_path.display());
            }
        },
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn config_values(config: &AppConfig) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(config)?)
}

async fn fetch_index(client: &WikiClient) -> Result<AdjectiveIndex> {
    let html = client
        .fetch_list_page()
        .await
        .context("fetching the animal list page")?;
    let index = extract_adjective_index(&html)?;
    if index.is_empty() {
        anyhow::bail!("no collateral adjective tables found on the list page");
    }
    Ok(index)
}

/// Exit code for the first error in the chain that has a known category.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ScrapeError>() {
            return match e {
                ScrapeError::Io(_) => ExitCode::FileSystemError,
                ScrapeError::Parse(_) => ExitCode::GeneralError,
                _ => ExitCode::NetworkError,
            };
        }
        if let Some(e) = cause.downcast_ref::<BestiaryError>() {
            return match e {
                BestiaryError::ConfigError(_) | BestiaryError::TomlParse(_) => ExitCode::InvalidArgs,
                BestiaryError::Io(_) => ExitCode::FileSystemError,
                _ => ExitCode::GeneralError,
            };
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return ExitCode::FileSystemError;
        }
    }
    ExitCode::GeneralError
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_category() {
        let network = anyhow::Error::new(ScrapeError::NotFound("List".to_string()))
            .context("fetching the animal list page");
        assert_eq!(exit_code(&network), ExitCode::NetworkError);

        let config = anyhow::Error::new(BestiaryError::ConfigError("bad".to_string()))
            .context("loading config");
        assert_eq!(exit_code(&config), ExitCode::InvalidArgs);

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(exit_code(&anyhow::Error::from(BestiaryError::Io(io))), ExitCode::FileSystemError);

        assert_eq!(exit_code(&anyhow::anyhow!("no tables")), ExitCode::GeneralError);
    }
}
