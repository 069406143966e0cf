//! Name and email extraction from transcribed speech.
//!
//! The name rule is deliberately narrow: the single word after "my name is"
//! (or "i'm"), title-cased. Multi-word names come back truncated to the
//! first word.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ExtractedContact;

static RE_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
});

const NAME_PHRASES: &[&str] = &["my name is", "i'm"];

pub fn extract(utterance: &str) -> ExtractedContact {
    ExtractedContact {
        name: extract_name(utterance),
        email: extract_email(utterance),
    }
}

pub fn extract_email(utterance: &str) -> Option<String> {
    RE_EMAIL.find(utterance).map(|m| m.as_str().to_string())
}

pub fn is_valid_email(candidate: &str) -> bool {
    RE_EMAIL
        .find(candidate)
        .map(|m| m.start() == 0 && m.end() == candidate.len())
        .unwrap_or(false)
}

pub fn extract_name(utterance: &str) -> Option<String> {
    let text = utterance.to_lowercase().replace('\u{2019}', "'");

    let rest = NAME_PHRASES
        .iter()
        .find_map(|phrase| text.find(phrase).map(|idx| &text[idx + phrase.len()..]))?;

    let word = rest
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_alphabetic());
    if word.is_empty() || !word.chars().all(is_name_char) {
        return None;
    }

    Some(title_case(word))
}

// Letters, plus the hyphen and apostrophe of names like "o'neil".
fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || c == '-' || c == '\''
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_email() {
        let contact = extract("My name is Dana, email dana@example.com");
        assert_eq!(contact.name.as_deref(), Some("Dana"));
        assert_eq!(contact.email.as_deref(), Some("dana@example.com"));
    }

    #[test]
    fn test_nothing_found() {
        let contact = extract("just calling to ask a question");
        assert_eq!(contact, ExtractedContact::default());
    }

    #[test]
    fn test_im_phrase_title_cases() {
        assert_eq!(extract_name("hi, I'm JORDAN").as_deref(), Some("Jordan"));
        assert_eq!(extract_name("I’m riley.").as_deref(), Some("Riley"));
    }

    #[test]
    fn test_my_name_is_preferred_over_im() {
        assert_eq!(
            extract_name("I'm calling to book, my name is sam").as_deref(),
            Some("Sam")
        );
    }

    #[test]
    fn test_multi_word_name_keeps_first_word() {
        assert_eq!(
            extract_name("my name is Mary Jane Watson").as_deref(),
            Some("Mary")
        );
    }

    #[test]
    fn test_email_after_name_phrase_is_not_a_name() {
        let contact = extract("my name is dana@example.com");
        assert_eq!(contact.name, None);
        assert_eq!(contact.email.as_deref(), Some("dana@example.com"));
        assert_eq!(extract_name("I'm r2d2"), None);
        assert_eq!(extract_name("my name is o'neil").as_deref(), Some("O'neil"));
    }

    #[test]
    fn test_phrase_at_end_yields_no_name() {
        assert_eq!(extract_name("my name is"), None);
    }

    #[test]
    fn test_email_trailing_period_excluded() {
        assert_eq!(
            extract_email("reach me at first.last+tag@mail.example.org.").as_deref(),
            Some("first.last+tag@mail.example.org")
        );
    }

    #[test]
    fn test_email_requires_tld() {
        assert_eq!(extract_email("dana@localhost"), None);
        assert_eq!(extract_email("dana@example.c"), None);
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("dana@example.com"));
        assert!(!is_valid_email("dana@example.com and more"));
        assert!(!is_valid_email("not an email"));
    }
}
