//! Keyword intent classification for caller utterances.
//!
//! Matching is plain case-insensitive substring search. Closing phrases are
//! checked before scheduling keywords, so "thanks, can I book?" ends the call.

use crate::models::CallIntent;

const END_PHRASES: &[&str] = &[
    "cool",
    "sounds good",
    "thank you",
    "thanks",
    "that's all",
    "bye",
    "goodbye",
];

const SCHEDULING_KEYWORDS: &[&str] = &["available", "appointment", "book", "schedule"];

const SCHEDULING_TOPIC_KEYWORDS: &[&str] = &[
    "available",
    "availability",
    "appointment",
    "book",
    "booking",
    "schedule",
    "meet",
    "meeting",
    "time",
    "calendar",
];

pub fn classify(utterance: &str) -> CallIntent {
    let text = normalize(utterance);

    if contains_any(&text, END_PHRASES) {
        CallIntent::EndCall
    } else if contains_any(&text, SCHEDULING_KEYWORDS) {
        CallIntent::SchedulingRelated
    } else {
        CallIntent::FreeForm
    }
}

/// Broader topic check used to steer free-form replies toward booking.
pub fn mentions_scheduling(utterance: &str) -> bool {
    contains_any(&normalize(utterance), SCHEDULING_TOPIC_KEYWORDS)
}

fn normalize(utterance: &str) -> String {
    // Speech recognition sometimes returns typographic apostrophes.
    utterance.to_lowercase().replace('\u{2019}', "'")
}

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| text.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_call_phrases() {
        assert_eq!(classify("thanks, bye!"), CallIntent::EndCall);
        assert_eq!(classify("Goodbye"), CallIntent::EndCall);
        assert_eq!(classify("That’s all for today"), CallIntent::EndCall);
    }

    #[test]
    fn test_scheduling_keywords() {
        assert_eq!(
            classify("can I book an appointment"),
            CallIntent::SchedulingRelated
        );
        assert_eq!(
            classify("What times are AVAILABLE next week?"),
            CallIntent::SchedulingRelated
        );
    }

    #[test]
    fn test_free_form() {
        assert_eq!(classify("what are your hours"), CallIntent::FreeForm);
        assert_eq!(classify(""), CallIntent::FreeForm);
    }

    #[test]
    fn test_end_call_checked_before_scheduling() {
        assert_eq!(
            classify("thanks, but can I still book something?"),
            CallIntent::EndCall
        );
    }

    #[test]
    fn test_topic_detection_is_broader() {
        assert!(mentions_scheduling("can we meet on friday"));
        assert!(mentions_scheduling("is there a calendar link"));
        assert_eq!(classify("can we meet on friday"), CallIntent::FreeForm);
        assert!(!mentions_scheduling("where are you located"));
    }
}
