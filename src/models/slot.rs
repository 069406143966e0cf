use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const APPOINTMENT_MINUTES: i64 = 60;
pub const OPENING_HOUR: u32 = 9;
pub const CLOSING_HOUR: u32 = 17;

/// A candidate appointment. Times are wall-clock in the business timezone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppointmentSlot {
    pub start: NaiveDateTime,
}

impl AppointmentSlot {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { start }
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(APPOINTMENT_MINUTES)
    }

    pub fn overlaps(&self, busy: &BusyInterval) -> bool {
        self.start < busy.end && self.end() > busy.start
    }

    /// Lowercase weekday name, e.g. "tuesday".
    pub fn weekday_name(&self) -> String {
        self.start.format("%A").to_string().to_lowercase()
    }

    pub fn day_of_month(&self) -> String {
        self.start.format("%-d").to_string()
    }

    /// How the slot is read out to the caller: "Tuesday, June 17 at 10:00 AM".
    pub fn spoken(&self) -> String {
        self.start.format("%A, %B %-d at %-I:%M %p").to_string()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}
