//! Service entry point: configuration, wiring and the HTTP server.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use advisor_sim::adapters::ai::{AnthropicConfig, AnthropicProvider};
use advisor_sim::adapters::http::simulation::{router, SimulationAppState};
use advisor_sim::adapters::llm::{
    LlmClientTurnGenerator, LlmContextValidator, LlmPerformanceAnalyzer, LlmScenarioGenerator,
};
use advisor_sim::adapters::postgres::PostgresSimulationStore;
use advisor_sim::config::AppConfig;
use advisor_sim::ports::AiProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("advisor_sim=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    // validate() already required the key; the else branch is unreachable
    let Some(api_key) = config.ai.anthropic_api_key.clone() else {
        return Err("ADVISOR_SIM__AI__ANTHROPIC_API_KEY is required".into());
    };
    let provider: Arc<dyn AiProvider> = Arc::new(AnthropicProvider::new(
        AnthropicConfig::new(api_key)
            .with_model(config.ai.model.clone())
            .with_timeout(config.ai.timeout())
            .with_max_retries(config.ai.max_retries),
    )?);

    let state = SimulationAppState::new(
        Arc::new(PostgresSimulationStore::new(pool)),
        Arc::new(LlmScenarioGenerator::new(provider.clone())),
        Arc::new(LlmContextValidator::new(provider.clone())),
        Arc::new(LlmClientTurnGenerator::new(provider.clone())),
        Arc::new(LlmPerformanceAnalyzer::new(provider.clone())),
    );

    let app = router(state).layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    tracing::info!(
        %addr,
        model = %provider.provider_info().model,
        "advisor-sim listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
