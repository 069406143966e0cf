use chrono::NaiveDateTime;

use crate::models::{AppointmentSlot, BookingStep, CallIntent, CallSession};
use crate::services::ai::reply;
use crate::services::booking::{finalize_booking, BookingOutcome};
use crate::services::{contact, intent, scheduling};
use crate::state::AppState;

pub const FAREWELL: &str = "Great, glad we're all set! Goodbye!";
pub const NO_OPENINGS: &str = "I'm sorry, I don't see any openings in the next week. Is there anything else I can help you with?";
pub const ASK_CONTACT_AGAIN: &str = "I still need both your name and your email address to book. Could you say something like, my name is Alex, and my email is alex@example.com?";
pub const BOOKING_FAILED: &str = "I'm sorry, there was an issue booking your appointment. Would you like me to transfer you to someone who can help?";

const OPTIONS_SPOKEN: usize = 3;

/// What the agent says back, and whether the call ends after saying it.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub say: String,
    pub end_call: bool,
}

impl Turn {
    fn speak(say: impl Into<String>) -> Self {
        Self {
            say: say.into(),
            end_call: false,
        }
    }

    fn hang_up(say: impl Into<String>) -> Self {
        Self {
            say: say.into(),
            end_call: true,
        }
    }
}

/// Runs one caller utterance through the booking state machine.
///
/// `now` is wall-clock time in the business timezone. Every turn except a
/// hang-up is appended to the transcript. Collaborator failures turn into
/// spoken fallbacks; nothing here returns an error.
pub async fn process_utterance(
    state: &AppState,
    session: &mut CallSession,
    utterance: &str,
    now: NaiveDateTime,
) -> Turn {
    let call_intent = intent::classify(utterance);
    let from = session.step;

    let turn = match (session.step, call_intent) {
        (BookingStep::Initial | BookingStep::Completed, CallIntent::EndCall) => {
            tracing::info!(call_sid = %session.call_sid, step = from.as_str(), "caller ended the conversation");
            return Turn::hang_up(FAREWELL);
        }

        // A new scheduling request after a finished booking starts over.
        (BookingStep::Completed, CallIntent::SchedulingRelated) => {
            session.reset_booking();
            offer_slots(state, session, now).await
        }

        (BookingStep::Initial, CallIntent::SchedulingRelated) => {
            offer_slots(state, session, now).await
        }

        (BookingStep::Initial | BookingStep::Completed, CallIntent::FreeForm) => {
            free_form(state, session, utterance).await
        }

        (BookingStep::AwaitingTimeSelection, _) => select_slot(session, utterance),

        (BookingStep::AwaitingContactDetails, _) => {
            collect_contact(state, session, utterance).await
        }
    };

    session.record_turn(utterance, &turn.say);

    tracing::info!(
        call_sid = %session.call_sid,
        intent = ?call_intent,
        from = from.as_str(),
        to = session.step.as_str(),
        "conversation turn"
    );

    turn
}

async fn offer_slots(state: &AppState, session: &mut CallSession, now: NaiveDateTime) -> Turn {
    let lookup = tokio::time::timeout(
        state.config.external_timeout(),
        scheduling::lookup_open_slots(state.calendar.as_ref(), now),
    )
    .await;

    let slots = lookup.unwrap_or_else(|_| {
        tracing::error!(call_sid = %session.call_sid, "free/busy lookup timed out");
        Vec::new()
    });

    if slots.is_empty() {
        return Turn::speak(NO_OPENINGS);
    }

    let options = spoken_options(&slots);
    session.candidate_slots = slots;
    session.selected_slot = None;
    session.step = BookingStep::AwaitingTimeSelection;

    Turn::speak(format!(
        "I have openings on {options}. Which works best for you?"
    ))
}

fn select_slot(session: &mut CallSession, utterance: &str) -> Turn {
    match scheduling::match_slot(utterance, &session.candidate_slots) {
        Some(slot) => {
            session.selected_slot = Some(slot);
            session.step = BookingStep::AwaitingContactDetails;
            Turn::speak(format!(
                "Great, I'll put you down for {}. Can I get your name and email address?",
                slot.spoken()
            ))
        }
        None => Turn::speak(format!(
            "Sorry, I didn't catch which time works for you. I have {}. Which day would you like?",
            spoken_options(&session.candidate_slots)
        )),
    }
}

async fn collect_contact(state: &AppState, session: &mut CallSession, utterance: &str) -> Turn {
    let extracted = contact::extract(utterance);
    if extracted.name.is_some() {
        session.contact.name = extracted.name;
    }
    if let Some(email) = extracted.email.filter(|e| contact::is_valid_email(e)) {
        session.contact.email = Some(email);
    }

    let (Some(name), Some(email)) = (session.contact.name.clone(), session.contact.email.clone())
    else {
        return Turn::speak(ASK_CONTACT_AGAIN);
    };

    let Some(slot) = session.selected_slot else {
        tracing::error!(call_sid = %session.call_sid, "contact collected without a selected slot");
        session.reset_booking();
        return Turn::speak(
            "Sorry, I lost track of the time we picked. Would you like me to find an appointment again?",
        );
    };

    match finalize_booking(state, &slot, &name, &email).await {
        BookingOutcome::Booked {
            event_id,
            notice_sent,
        } => {
            tracing::info!(call_sid = %session.call_sid, event_id = %event_id, "appointment booked");
            session.step = BookingStep::Completed;
            Turn::speak(confirmation(&name, &email, &slot, notice_sent))
        }
        // Contact is cleared so the reply to the transfer offer is not
        // taken as a silent retry; the caller has to give details again.
        BookingOutcome::CalendarFailed => {
            session.contact = Default::default();
            Turn::speak(BOOKING_FAILED)
        }
    }
}

async fn free_form(state: &AppState, session: &CallSession, utterance: &str) -> Turn {
    let prompt = reply::system_prompt(
        &state.config.business_name,
        intent::mentions_scheduling(utterance),
    );
    let text = reply::reply(
        state.llm.as_ref(),
        &prompt,
        &session.transcript,
        utterance,
        state.config.external_timeout(),
    )
    .await;
    Turn::speak(text)
}

fn confirmation(name: &str, email: &str, slot: &AppointmentSlot, notice_sent: bool) -> String {
    let mut text = format!(
        "You're all set, {name}! Your appointment is booked for {}.",
        slot.spoken()
    );
    if notice_sent {
        text.push_str(&format!(" I've sent a confirmation to {email}."));
    }
    text.push_str(" Is there anything else I can help you with?");
    text
}

/// "A", "A or B", "A, B, or C" from the first few slots.
fn spoken_options(slots: &[AppointmentSlot]) -> String {
    let spoken: Vec<String> = slots
        .iter()
        .take(OPTIONS_SPOKEN)
        .map(AppointmentSlot::spoken)
        .collect();

    match spoken.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{first} or {second}"),
        [rest @ .., last] => format!("{}, or {last}", rest.join(", ")),
    }
}
