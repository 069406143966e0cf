//! Free-form conversational replies for anything the booking flow does not
//! handle itself.

use std::time::Duration;

use crate::models::ConversationMessage;
use crate::services::ai::{LlmProvider, Message};

pub const FALLBACK_REPLY: &str = "Sorry, I couldn't get a response.";

const SYSTEM_PROMPT: &str = "You are a friendly receptionist on the phone. Respond as if speaking to a real person. Keep responses SHORT (10-15 words max for first response), but use natural spoken language. Be conversational and helpful. Never use lists, markdown, or emoji; everything you write is read aloud.";

const SCHEDULING_HINT: &str = "The caller seems interested in scheduling. If they want an appointment, invite them to say they would like to book one.";

pub fn system_prompt(business_name: &str, scheduling_topic: bool) -> String {
    let mut prompt = format!("{SYSTEM_PROMPT}\n\nYou answer calls for {business_name}.");
    if scheduling_topic {
        prompt.push('\n');
        prompt.push_str(SCHEDULING_HINT);
    }
    prompt
}

/// Asks the model for the next reply given the whole call so far. Never
/// fails: errors, timeouts and empty output all produce `FALLBACK_REPLY`.
pub async fn reply(
    llm: &dyn LlmProvider,
    system_prompt: &str,
    transcript: &[ConversationMessage],
    utterance: &str,
    timeout: Duration,
) -> String {
    let mut messages: Vec<Message> = transcript.iter().map(Message::from).collect();
    messages.push(Message {
        role: "user".to_string(),
        content: utterance.to_string(),
    });

    match tokio::time::timeout(timeout, llm.chat(system_prompt, &messages)).await {
        Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(Ok(_)) => {
            tracing::warn!("language model returned an empty reply");
            FALLBACK_REPLY.to_string()
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "language model call failed");
            FALLBACK_REPLY.to_string()
        }
        Err(_) => {
            tracing::error!(timeout_secs = timeout.as_secs(), "language model call timed out");
            FALLBACK_REPLY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct RecordingLlm {
        seen: Mutex<Vec<Message>>,
        answer: anyhow::Result<String>,
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        async fn chat(&self, _system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
            *self.seen.lock().unwrap() = messages.to_vec();
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    struct SlowLlm;

    #[async_trait]
    impl LlmProvider for SlowLlm {
        async fn chat(&self, _system_prompt: &str, _messages: &[Message]) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test]
    async fn test_reply_sends_full_transcript() {
        let llm = RecordingLlm {
            seen: Mutex::new(Vec::new()),
            answer: Ok(" We open at nine. ".to_string()),
        };
        let transcript = vec![
            ConversationMessage::user("hi"),
            ConversationMessage::assistant("Hello! How can I help?"),
        ];

        let text = reply(&llm, "sys", &transcript, "when do you open", Duration::from_secs(1)).await;

        assert_eq!(text, "We open at nine.");
        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].role, "user");
        assert_eq!(seen[2].content, "when do you open");
    }

    #[tokio::test]
    async fn test_reply_falls_back_on_error() {
        let llm = RecordingLlm {
            seen: Mutex::new(Vec::new()),
            answer: Err(anyhow::anyhow!("boom")),
        };
        let text = reply(&llm, "sys", &[], "hello", Duration::from_secs(1)).await;
        assert_eq!(text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_reply_falls_back_on_empty_text() {
        let llm = RecordingLlm {
            seen: Mutex::new(Vec::new()),
            answer: Ok("   ".to_string()),
        };
        let text = reply(&llm, "sys", &[], "hello", Duration::from_secs(1)).await;
        assert_eq!(text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_reply_falls_back_on_timeout() {
        let text = reply(&SlowLlm, "sys", &[], "hello", Duration::from_millis(20)).await;
        assert_eq!(text, FALLBACK_REPLY);
    }

    #[test]
    fn test_system_prompt_mentions_business() {
        let prompt = system_prompt("Bright Smile Dental", false);
        assert!(prompt.contains("Bright Smile Dental"));
        assert!(!prompt.contains("interested in scheduling"));
        assert!(system_prompt("X", true).contains("interested in scheduling"));
    }
}
