use std::env;
use std::time::Duration;

use chrono_tz::Tz;

const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub business_name: String,
    pub business_email: String,
    pub timezone: Tz,
    pub llm_provider: String,
    pub anthropic_api_key: String,
    pub anthropic_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub google_access_token: String,
    pub calendar_id: String,
    pub twilio_auth_token: String,
    pub voice: String,
    pub session_idle_minutes: u64,
    pub external_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            business_name: env::var("BUSINESS_NAME").unwrap_or_else(|_| "our office".to_string()),
            business_email: env::var("BUSINESS_EMAIL").unwrap_or_default(),
            timezone: parse_timezone(env::var("BUSINESS_TIMEZONE").ok().as_deref()),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "anthropic".to_string()),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            anthropic_model: env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            google_access_token: env::var("GOOGLE_ACCESS_TOKEN").unwrap_or_default(),
            calendar_id: env::var("GOOGLE_CALENDAR_ID").unwrap_or_else(|_| "primary".to_string()),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            voice: env::var("TTS_VOICE").unwrap_or_else(|_| "Polly.Joanna".to_string()),
            session_idle_minutes: env::var("SESSION_IDLE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            external_timeout_secs: env::var("EXTERNAL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8),
        }
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes * 60)
    }

    pub fn external_timeout(&self) -> Duration {
        Duration::from_secs(self.external_timeout_secs)
    }
}

fn parse_timezone(raw: Option<&str>) -> Tz {
    match raw {
        None => DEFAULT_TIMEZONE,
        Some(name) => name.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!(timezone = name, "unknown BUSINESS_TIMEZONE, using America/New_York");
            DEFAULT_TIMEZONE
        }),
    }
}
