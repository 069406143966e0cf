use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

use crate::models::slot::{CLOSING_HOUR, OPENING_HOUR};
use crate::models::{AppointmentSlot, BusyInterval};
use crate::services::calendar::CalendarProvider;

pub const DEFAULT_DAYS_AHEAD: u32 = 7;
pub const MAX_SLOTS: usize = 10;

/// One-hour weekday slots between opening and closing time that do not
/// overlap any busy interval, earliest first, capped at `MAX_SLOTS`.
pub fn find_available_slots(
    window_start: NaiveDate,
    days_ahead: u32,
    busy: &[BusyInterval],
) -> Vec<AppointmentSlot> {
    let mut slots = Vec::new();

    for offset in 0..days_ahead {
        let day = window_start + Duration::days(offset as i64);
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }

        for hour in OPENING_HOUR..CLOSING_HOUR {
            let Some(start) = day.and_hms_opt(hour, 0, 0) else {
                continue;
            };
            let slot = AppointmentSlot::new(start);
            if busy.iter().any(|b| slot.overlaps(b)) {
                continue;
            }
            slots.push(slot);
            if slots.len() == MAX_SLOTS {
                return slots;
            }
        }
    }

    slots
}

/// Queries the calendar for the default window starting tomorrow and returns
/// the open slots. A failed busy query yields no slots.
pub async fn lookup_open_slots(
    calendar: &dyn CalendarProvider,
    now: NaiveDateTime,
) -> Vec<AppointmentSlot> {
    let window_start = now.date() + Duration::days(1);
    let window_end = window_start + Duration::days(DEFAULT_DAYS_AHEAD as i64);

    let (Some(start), Some(end)) = (
        window_start.and_hms_opt(0, 0, 0),
        window_end.and_hms_opt(0, 0, 0),
    ) else {
        return Vec::new();
    };

    match calendar.query_busy(start, end).await {
        Ok(busy) => find_available_slots(window_start, DEFAULT_DAYS_AHEAD, &busy),
        Err(e) => {
            tracing::error!(error = %e, "free/busy query failed, reporting no openings");
            Vec::new()
        }
    }
}

/// First candidate, in candidate order, whose weekday name or day-of-month
/// appears in the utterance.
pub fn match_slot(utterance: &str, candidates: &[AppointmentSlot]) -> Option<AppointmentSlot> {
    let text = utterance.to_lowercase();
    candidates
        .iter()
        .find(|slot| text.contains(&slot.weekday_name()) || text.contains(&slot.day_of_month()))
        .copied()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::Timelike;
    use proptest::prelude::*;

    fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn arb_busy() -> impl Strategy<Value = BusyInterval> {
        // start anywhere in a five-week span, lasting a minute to two days
        (0i64..35 * 24 * 60, 1i64..2 * 24 * 60).prop_map(|(start_min, len_min)| {
            let start = epoch().and_hms_opt(0, 0, 0).unwrap() + Duration::minutes(start_min);
            BusyInterval {
                start,
                end: start + Duration::minutes(len_min),
            }
        })
    }

    fn is_free(start: NaiveDateTime, busy: &[BusyInterval]) -> bool {
        let end = start + Duration::minutes(60);
        busy.iter().all(|b| end <= b.start || start >= b.end)
    }

    proptest! {
        #[test]
        fn slots_respect_busy_hours_window_and_order(
            start_offset in 0i64..28,
            days_ahead in 0u32..21,
            busy in prop::collection::vec(arb_busy(), 0..12),
        ) {
            let window_start = epoch() + Duration::days(start_offset);
            let window_end = window_start + Duration::days(days_ahead as i64);
            let slots = find_available_slots(window_start, days_ahead, &busy);

            prop_assert!(slots.len() <= MAX_SLOTS);
            prop_assert!(slots.windows(2).all(|w| w[0].start < w[1].start));

            for slot in &slots {
                prop_assert!(is_free(slot.start, &busy));
                prop_assert_eq!(slot.start.minute(), 0);
                prop_assert!(slot.start.hour() >= OPENING_HOUR);
                prop_assert!(slot.end().hour() <= CLOSING_HOUR);
                prop_assert!(!matches!(slot.start.weekday(), Weekday::Sat | Weekday::Sun));
                prop_assert!(slot.start.date() >= window_start);
                prop_assert!(slot.start.date() < window_end);
            }
        }

        #[test]
        fn every_free_hour_is_offered_up_to_the_cap(
            start_offset in 0i64..28,
            days_ahead in 0u32..21,
            busy in prop::collection::vec(arb_busy(), 0..12),
        ) {
            let window_start = epoch() + Duration::days(start_offset);
            let slots = find_available_slots(window_start, days_ahead, &busy);

            let free_hours = (0..days_ahead as i64)
                .map(|d| window_start + Duration::days(d))
                .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
                .flat_map(|day| {
                    (OPENING_HOUR..CLOSING_HOUR).filter_map(move |h| day.and_hms_opt(h, 0, 0))
                })
                .filter(|start| is_free(*start, &busy))
                .count();
            prop_assert_eq!(slots.len(), free_hours.min(MAX_SLOTS));
        }
    }
}
