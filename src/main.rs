//! ragdesk - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ragdesk::{
    cli::{Args, Commands, Verbosity},
    config::Config,
    doctor::Doctor,
    generation::{Generator, OllamaClient},
    rag::RagAnswer,
    server::{AppState, HttpServer},
    store::{normalize_limit, DEFAULT_SEARCH_LIMIT},
};

fn init_logging(verbosity: Verbosity) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbosity())?;

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    match args.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(&config).await?;
        }
        Commands::Ask {
            query,
            limit,
            show_context,
        } => {
            ask(&config, &query, limit, show_context).await?;
        }
        Commands::Search { query, limit } => {
            search(&config, &query, limit).await?;
        }
        Commands::Models => {
            list_models(&config).await?;
        }
        Commands::Doctor => {
            run_doctor(&config).await?;
        }
        Commands::Config { save } => {
            show_config(&config, save)?;
        }
    }

    Ok(())
}

async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;
    info!(
        model = %config.ollama.model,
        ollama = %config.ollama.url,
        store = ?config.store.backend,
        "starting ragdesk backend"
    );

    HttpServer::new(config.listen_addr(), state)
        .run(shutdown_signal())
        .await
}

async fn ask(config: &Config, query: &str, limit: i64, show_context: bool) -> Result<()> {
    let state = AppState::from_config(config)?;
    let answer = state.pipeline.answer(query, limit).await?;
    print_answer(&answer, show_context);
    Ok(())
}

fn print_answer(answer: &RagAnswer, show_context: bool) {
    println!("\n{}\n", answer.response.trim());

    if show_context {
        println!("{}", format!("Context ({} passages):", answer.context.len()).bold());
        for (idx, passage) in answer.context.iter().enumerate() {
            println!(
                "  {}. {} {}",
                idx + 1,
                passage.id.cyan(),
                format!("(distance {:.3})", passage.distance).dimmed()
            );
        }
        println!();
    }

    println!("{}", format!("model: {}", answer.model).dimmed());
}

async fn search(config: &Config, query: &str, limit: i64) -> Result<()> {
    let state = AppState::from_config(config)?;
    let limit = normalize_limit(limit, DEFAULT_SEARCH_LIMIT);
    let results = state.store.search(query, limit as i64).await?;

    if results.is_empty() {
        println!("No matching documents.");
        return Ok(());
    }

    for (idx, result) in results.iter().enumerate() {
        let preview: String = result.text.chars().take(120).collect();
        println!(
            "{}. {} {}",
            idx + 1,
            result.id.cyan(),
            format!("(distance {:.3})", result.distance).dimmed()
        );
        println!("   {}", preview.replace('\n', " "));
    }

    Ok(())
}

async fn list_models(config: &Config) -> Result<()> {
    let client = OllamaClient::new(&config.ollama)?;

    println!("\nChecking Ollama models...\n");

    match client.list_models().await {
        Ok(models) => {
            if models.is_empty() {
                println!("No models installed.");
                println!("\nPull a model with:");
                println!("  ollama pull {}", config.ollama.model);
            } else {
                println!("Available models:");
                for model in models {
                    let marker = if model.name == config.ollama.model {
                        "*".green()
                    } else {
                        " ".normal()
                    };
                    println!("  {} {}", marker, model);
                }
            }
            println!();
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            eprintln!("\nIs Ollama running? Start with: ollama serve");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn run_doctor(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;
    let doctor = Doctor::new(config, state.generator, state.store);

    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    std::process::exit(if Doctor::overall_status(&checks) { 0 } else { 1 });
}

fn show_config(config: &Config, save: bool) -> Result<()> {
    println!("{}", config.to_toml()?);

    if save {
        let path = Config::default_path().context("Cannot determine home directory")?;
        config.save(&path)?;
        println!("{} {}", "Saved to".green(), path.display());
    }

    Ok(())
}
