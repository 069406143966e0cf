use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::models::AppointmentSlot;

pub struct IcsEvent<'a> {
    pub uid: &'a str,
    pub slot: &'a AppointmentSlot,
    pub timezone: Tz,
    pub summary: &'a str,
    pub description: &'a str,
    pub stamp: NaiveDateTime,
}

/// Renders a single-event iCalendar document. Times are emitted in UTC so
/// the file needs no VTIMEZONE block.
pub fn generate_ics(event: &IcsEvent<'_>) -> String {
    let dtstart = to_utc_stamp(event.timezone, event.slot.start);
    let dtend = to_utc_stamp(event.timezone, event.slot.end());
    let dtstamp = event.stamp.format("%Y%m%dT%H%M%SZ").to_string();
    let uid = format!("{}@callbook", event.uid);
    let summary = escape_text(event.summary);
    let description = escape_text(event.description);

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Callbook//Voice Receptionist//EN\r\n\
         METHOD:PUBLISH\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

fn to_utc_stamp(tz: Tz, local: NaiveDateTime) -> String {
    let utc = tz
        .from_local_datetime(&local)
        .earliest()
        .map(|t| t.with_timezone(&Utc).naive_utc())
        .unwrap_or(local);
    utc.format("%Y%m%dT%H%M%SZ").to_string()
}

fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_generate_ics() {
        let slot = AppointmentSlot::new(dt("2025-03-17 14:00:00"));
        let ics = generate_ics(&IcsEvent {
            uid: "evt-123",
            slot: &slot,
            timezone: chrono_tz::America::New_York,
            summary: "Appointment with Bob's Barbershop",
            description: "Booked by phone",
            stamp: dt("2025-03-10 10:00:00"),
        });

        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(ics.contains("BEGIN:VEVENT"));
        // EDT is UTC-4 in mid-March 2025
        assert!(ics.contains("DTSTART:20250317T180000Z"));
        assert!(ics.contains("DTEND:20250317T190000Z"));
        assert!(ics.contains("DTSTAMP:20250310T100000Z"));
        assert!(ics.contains("SUMMARY:Appointment with Bob's Barbershop"));
        assert!(ics.contains("DESCRIPTION:Booked by phone"));
        assert!(ics.contains("UID:evt-123@callbook"));
        assert!(ics.contains("END:VEVENT"));
        assert!(ics.contains("END:VCALENDAR"));
    }

    #[test]
    fn test_generate_ics_escapes_text() {
        let slot = AppointmentSlot::new(dt("2025-01-06 09:00:00"));
        let ics = generate_ics(&IcsEvent {
            uid: "evt-456",
            slot: &slot,
            timezone: chrono_tz::UTC,
            summary: "Consult; Dana, new client",
            description: "line one\nline two",
            stamp: dt("2025-01-01 00:00:00"),
        });
        assert!(ics.contains("DTSTART:20250106T090000Z"));
        assert!(ics.contains("SUMMARY:Consult\\; Dana\\, new client"));
        assert!(ics.contains("DESCRIPTION:line one\\nline two"));
    }
}
