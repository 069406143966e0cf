pub mod google;
pub mod ics;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::models::{AppointmentSlot, BusyInterval};

/// Calendar backing the appointment book. Times are wall-clock in the
/// business timezone.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn query_busy(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> anyhow::Result<Vec<BusyInterval>>;

    /// Creates the appointment event and returns its id.
    async fn create_event(
        &self,
        slot: &AppointmentSlot,
        summary: &str,
        description: &str,
        attendees: &[String],
    ) -> anyhow::Result<String>;
}
