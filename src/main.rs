use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use callbook::config::AppConfig;
use callbook::errors::AppError;
use callbook::handlers;
use callbook::services::ai::anthropic::AnthropicProvider;
use callbook::services::ai::ollama::OllamaProvider;
use callbook::services::ai::LlmProvider;
use callbook::services::calendar::google::GoogleCalendarProvider;
use callbook::services::messaging::gmail::GmailProvider;
use callbook::services::sessions::SessionStore;
use callbook::state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "anthropic" => {
            anyhow::ensure!(
                !config.anthropic_api_key.is_empty(),
                "ANTHROPIC_API_KEY must be set when LLM_PROVIDER=anthropic"
            );
            tracing::info!("using Anthropic LLM provider (model: {})", config.anthropic_model);
            Box::new(AnthropicProvider::new(
                config.anthropic_api_key.clone(),
                config.anthropic_model.clone(),
            ))
        }
        "ollama" => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            ))
        }
        other => {
            return Err(AppError::Config(format!("unknown LLM_PROVIDER: {other}")).into());
        }
    };

    if config.google_access_token.is_empty() {
        tracing::warn!("GOOGLE_ACCESS_TOKEN not set, calendar and email calls will fail");
    }
    if config.twilio_auth_token.is_empty() {
        tracing::warn!("TWILIO_AUTH_TOKEN not set, webhook signatures are not checked");
    }

    let calendar = GoogleCalendarProvider::new(
        config.google_access_token.clone(),
        config.calendar_id.clone(),
        config.timezone,
    );
    let email = GmailProvider::new(
        config.google_access_token.clone(),
        config.business_email.clone(),
    );

    let state = Arc::new(AppState {
        sessions: SessionStore::new(config.session_idle_timeout()),
        config: config.clone(),
        llm,
        calendar: Box::new(calendar),
        email: Box::new(email),
    });

    let sweeper = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = sweeper.sessions.evict_expired();
            if evicted > 0 {
                tracing::info!(evicted, remaining = sweeper.sessions.len(), "evicted idle call sessions");
            }
        }
    });

    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(business = %config.business_name, timezone = %config.timezone, "starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
