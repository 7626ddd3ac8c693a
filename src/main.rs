use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use triagebook::config::AppConfig;
use triagebook::db;
use triagebook::handlers;
use triagebook::services::ai::ollama::OllamaProvider;
use triagebook::services::ai::openai::OpenAiCompatProvider;
use triagebook::services::ai::LlmProvider;
use triagebook::services::catalog::{self, CatalogSpec};
use triagebook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let spec = CatalogSpec::for_variant(config.flow_variant, &config.clinics);
    if catalog::ensure_catalog(&conn, &spec)? {
        tracing::info!("generated slot catalog for {} clinics", config.clinics.len());
    }
    if config.reset_catalog_on_booking {
        tracing::warn!("RESET_CATALOG_ON_BOOKING is set; existing bookings are wiped whenever a patient reaches booking");
    }

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "ollama" => {
            tracing::info!("using Ollama LLM provider (url: {}, model: {})", config.ollama_url, config.ollama_model);
            Box::new(OllamaProvider::new(config.ollama_url.clone(), config.ollama_model.clone()))
        }
        _ => {
            anyhow::ensure!(!config.gemini_api_key.is_empty(), "GEMINI_API_KEY must be set when LLM_PROVIDER is not ollama");
            tracing::info!("using OpenAI-compatible LLM provider (model: {})", config.gemini_model);
            Box::new(OpenAiCompatProvider::new(
                config.gemini_base_url.clone(),
                config.gemini_api_key.clone(),
                config.gemini_model.clone(),
            ))
        }
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        llm,
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(variant = config.flow_variant.as_str(), "starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
