use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vacancy_crawler::{load_config, AppConfig, ScrapeOrchestrator, ScrapeOutcome};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config: AppConfig = match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error ({}): {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let orchestrator = match ScrapeOrchestrator::from_config(&config) {
        Ok(o) => o,
        Err(e) => {
            error!("Failed to initialize fetcher: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Ctrl-C stops further requests; sources report what they already have.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing with partial results...");
                cancel.cancel();
            }
        });
    }

    let outcomes = orchestrator.run(&config.sources, &cancel).await;

    let mut failed = 0;
    for (source, outcome) in &outcomes {
        match outcome {
            ScrapeOutcome::Collected(batch) => {
                info!("{}: {} vacancies ({} skipped)", source, batch.vacancies.len(), batch.skipped);
                for vacancy in &batch.vacancies {
                    let skills: Vec<&str> = vacancy.skills.iter().map(String::as_str).collect();
                    info!("  {} | {} | {} | [{}]", vacancy.title, vacancy.location, vacancy.url, skills.join(", "));
                }
            }
            ScrapeOutcome::Failed { error, partial } => {
                failed += 1;
                warn!("{}: FAILED ({}), {} partial vacancies", source, error, partial.vacancies.len());
            }
        }
    }

    if failed == outcomes.len() && failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
