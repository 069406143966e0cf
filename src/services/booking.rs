use chrono::Utc;
use tokio::time::Instant;

use crate::models::AppointmentSlot;
use crate::services::calendar::ics::{generate_ics, IcsEvent};
use crate::services::messaging::Attachment;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    Booked { event_id: String, notice_sent: bool },
    CalendarFailed,
}

/// Creates the calendar event and then emails the caller. Only a calendar
/// failure fails the booking; a failed email leaves the appointment in place.
///
/// Both calls share one `external_timeout` deadline, so the whole booking
/// finishes within that bound.
pub async fn finalize_booking(
    state: &AppState,
    slot: &AppointmentSlot,
    name: &str,
    email: &str,
) -> BookingOutcome {
    let business = &state.config.business_name;
    let summary = format!("Appointment with {name}");
    let description = format!("Booked by phone with {business}. Contact: {name} <{email}>");

    let mut attendees = vec![email.to_string()];
    if !state.config.business_email.is_empty() {
        attendees.push(state.config.business_email.clone());
    }

    let deadline = Instant::now() + state.config.external_timeout();

    let created = tokio::time::timeout_at(
        deadline,
        state
            .calendar
            .create_event(slot, &summary, &description, &attendees),
    )
    .await;

    let event_id = match created {
        Ok(Ok(id)) => id,
        Ok(Err(e)) => {
            tracing::error!(error = %e, start = %slot.start, "calendar event creation failed");
            return BookingOutcome::CalendarFailed;
        }
        Err(_) => {
            tracing::error!(start = %slot.start, "calendar event creation timed out");
            return BookingOutcome::CalendarFailed;
        }
    };

    let notice_sent = send_confirmation(state, slot, name, email, &event_id, deadline).await;

    BookingOutcome::Booked {
        event_id,
        notice_sent,
    }
}

async fn send_confirmation(
    state: &AppState,
    slot: &AppointmentSlot,
    name: &str,
    email: &str,
    event_id: &str,
    deadline: Instant,
) -> bool {
    let business = &state.config.business_name;
    let when = slot.spoken();
    let subject = format!("Your appointment with {business}");
    let body = format!(
        "Hi {name},\n\nYour appointment with {business} is confirmed for {when}.\n\
         The calendar invite is attached.\n\nSee you then!"
    );
    let ics = generate_ics(&IcsEvent {
        uid: event_id,
        slot,
        timezone: state.config.timezone,
        summary: &subject,
        description: &format!("Appointment with {business}"),
        stamp: Utc::now().naive_utc(),
    });
    let attachment = Attachment {
        filename: "appointment.ics".to_string(),
        content_type: "text/calendar; method=PUBLISH".to_string(),
        body: ics,
    };

    let sent = tokio::time::timeout_at(
        deadline,
        state
            .email
            .send_email(email, &subject, &body, Some(&attachment)),
    )
    .await;

    match sent {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::error!(error = %e, event_id, "confirmation email failed, booking kept");
            false
        }
        Err(_) => {
            tracing::error!(event_id, "confirmation email timed out, booking kept");
            false
        }
    }
}
