use serde::{Deserialize, Serialize};

use super::AppointmentSlot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    Initial,
    AwaitingTimeSelection,
    AwaitingContactDetails,
    Completed,
}

impl BookingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStep::Initial => "initial",
            BookingStep::AwaitingTimeSelection => "awaiting_time_selection",
            BookingStep::AwaitingContactDetails => "awaiting_contact_details",
            BookingStep::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationMessage {
    pub role: String,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.to_string(),
        }
    }
}

/// Caller details gathered while `AwaitingContactDetails`. Fields fill in
/// across turns; booking needs both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Contact {
    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.email.is_some()
    }
}

/// Everything the agent remembers about one live call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    pub call_sid: String,
    pub transcript: Vec<ConversationMessage>,
    pub step: BookingStep,
    pub candidate_slots: Vec<AppointmentSlot>,
    pub selected_slot: Option<AppointmentSlot>,
    pub contact: Contact,
}

impl CallSession {
    pub fn new(call_sid: &str) -> Self {
        Self {
            call_sid: call_sid.to_string(),
            transcript: Vec::new(),
            step: BookingStep::Initial,
            candidate_slots: Vec::new(),
            selected_slot: None,
            contact: Contact::default(),
        }
    }

    /// Records one caller/agent exchange.
    pub fn record_turn(&mut self, utterance: &str, reply: &str) {
        self.transcript.push(ConversationMessage::user(utterance));
        self.transcript.push(ConversationMessage::assistant(reply));
    }

    /// Drops booking sub-state so a new request starts from `Initial`.
    /// The transcript is kept.
    pub fn reset_booking(&mut self) {
        self.step = BookingStep::Initial;
        self.candidate_slots.clear();
        self.selected_slot = None;
        self.contact = Contact::default();
    }
}
