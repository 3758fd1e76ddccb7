use anyhow::Context;
use clap::Parser;
use scholar_sidekick::adapters::services::docs::GoogleDocsService;
use scholar_sidekick::adapters::services::llm::GoogleService;
use scholar_sidekick::adapters::storage::SqliteStorage;
use scholar_sidekick::api::{self, AppState};
use scholar_sidekick::config::Config;
use scholar_sidekick::extraction::ExtractionService;
use std::sync::Arc;

/// Build every service from configuration
///
/// Sets up the database connection and runs migrations.
fn initialize_app(config: &Config) -> anyhow::Result<AppState> {
    let storage = SqliteStorage::new(&config.database_path)
        .with_context(|| format!("Failed to open database {}", config.database_path))?;
    storage.run_migrations()?;

    let gateway = GoogleService::new(
        config.gemini_api_key.clone(),
        config.generation(),
        config.llm_timeout(),
    )?
    .with_base_url(config.gemini_base_url.as_str());

    let documents =
        GoogleDocsService::new(config.llm_timeout())?.with_base_url(config.docs_base_url.as_str());

    Ok(AppState {
        storage: Arc::new(storage),
        extraction: Arc::new(ExtractionService::new(Arc::new(gateway))),
        documents: Arc::new(documents),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = Config::parse();
    let addr = config.listen_addr()?;
    let state = initialize_app(&config)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Scholar Sidekick listening on http://{}", addr);

    axum::serve(listener, api::router(Arc::new(state))).await?;
    Ok(())
}
