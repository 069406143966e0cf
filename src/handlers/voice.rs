use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Form;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::errors::AppError;
use crate::services::conversation;
use crate::state::AppState;
use crate::twiml::{Gather, VoiceResponse};

const VOICE_PATH: &str = "/voice";
const SPEECH_PATH: &str = "/handle_speech";
const STATUS_PATH: &str = "/call_status";

const GREETING_TIMEOUT_SECS: u32 = 8;
const NOT_CAUGHT: &str = "Sorry, I didn't catch that. Could you tell me how I can help you?";
const NOT_HEARD: &str = "Sorry, I didn't hear anything. Could you repeat that?";

const TERMINAL_STATUSES: &[&str] = &["completed", "busy", "failed", "no-answer", "canceled"];

type Params = HashMap<String, String>;

fn validate_twilio_signature(auth_token: &str, signature: &str, url: &str, params: &Params) -> bool {
    // URL followed by every posted key/value pair, keys sorted
    let mut data = url.to_string();
    let mut sorted: Vec<(&String, &String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in sorted {
        data.push_str(key);
        data.push_str(value);
    }

    let mut mac = match Hmac::<Sha1>::new_from_slice(auth_token.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(data.as_bytes());
    let expected = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    expected == signature
}

/// Rejects requests without a valid `X-Twilio-Signature`. Skipped when no
/// auth token is configured (local development).
fn verify_request(
    state: &AppState,
    headers: &HeaderMap,
    path: &str,
    params: &Params,
) -> Result<(), AppError> {
    let auth_token = &state.config.twilio_auth_token;
    if auth_token.is_empty() {
        return Ok(());
    }

    let signature = headers
        .get("x-twilio-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if signature.is_empty() {
        tracing::warn!(path, "missing X-Twilio-Signature header");
        return Err(AppError::Forbidden("missing signature".to_string()));
    }

    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("https");
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get("host"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let url = format!("{proto}://{host}{path}");

    if !validate_twilio_signature(auth_token, signature, &url, params) {
        tracing::warn!(path, "invalid Twilio signature");
        return Err(AppError::Forbidden("invalid signature".to_string()));
    }
    Ok(())
}

fn call_sid(params: &Params) -> Result<&str, AppError> {
    params
        .get("CallSid")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing CallSid".to_string()))
}

pub async fn voice_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(params): Form<Params>,
) -> Result<VoiceResponse, AppError> {
    verify_request(&state, &headers, VOICE_PATH, &params)?;
    let call_sid = call_sid(&params)?;

    tracing::info!(call_sid, from = params.get("From").map(String::as_str).unwrap_or(""), "incoming call");
    state.sessions.get_or_create(call_sid);

    let greeting = format!(
        "Hi there! Thanks for calling {}. How can I help you today?",
        state.config.business_name
    );

    Ok(VoiceResponse::new(&state.config.voice)
        .gather(
            Gather::speech(SPEECH_PATH)
                .timeout(GREETING_TIMEOUT_SECS)
                .say(&greeting),
        )
        .say(NOT_CAUGHT)
        .redirect(VOICE_PATH))
}

pub async fn handle_speech(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(params): Form<Params>,
) -> Result<VoiceResponse, AppError> {
    verify_request(&state, &headers, SPEECH_PATH, &params)?;
    let call_sid = call_sid(&params)?;
    let speech = params
        .get("SpeechResult")
        .map(|s| s.trim())
        .unwrap_or("");

    tracing::info!(call_sid, speech, "received speech");

    if speech.is_empty() {
        return Ok(VoiceResponse::new(&state.config.voice).gather(
            Gather::speech(SPEECH_PATH)
                .timeout(GREETING_TIMEOUT_SECS)
                .say(NOT_HEARD)
                .on_empty_result(),
        ));
    }

    let session = state.sessions.get_or_create(call_sid);
    let turn = {
        let mut session = session.lock().await;
        let now = Utc::now()
            .with_timezone(&state.config.timezone)
            .naive_local();
        conversation::process_utterance(&state, &mut session, speech, now).await
    };

    if turn.end_call {
        state.sessions.remove(call_sid);
        return Ok(VoiceResponse::new(&state.config.voice)
            .say(&turn.say)
            .hangup());
    }

    Ok(VoiceResponse::new(&state.config.voice)
        .say(&turn.say)
        .gather(Gather::speech(SPEECH_PATH).on_empty_result()))
}

/// Status callback: a call that has finished no longer needs its session.
pub async fn call_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(params): Form<Params>,
) -> Result<VoiceResponse, AppError> {
    verify_request(&state, &headers, STATUS_PATH, &params)?;
    let call_sid = call_sid(&params)?;
    let status = params.get("CallStatus").map(String::as_str).unwrap_or("");

    tracing::info!(call_sid, status, "call status update");

    if TERMINAL_STATUSES.contains(&status) {
        state.sessions.remove(call_sid);
    }

    Ok(VoiceResponse::new(&state.config.voice))
}
