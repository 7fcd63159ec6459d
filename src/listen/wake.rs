//! Wake-phrase, goodbye, cancel, and ignore word matching.
//!
//! Plain substring scanning against the ASR transcript — there is no neural
//! classifier here, only the fixed phrase lists in [`crate::persona`].

use crate::persona::{CANCEL_WORDS, GOODBYE_WORDS, IGNORE_WORDS, WAKE_WORDS};

/// If `text` contains a wake phrase, return the phrase and the byte offset
/// just after it (skipping one separating space, if present).
pub fn find_wake_phrase(text: &str) -> Option<(&'static str, usize)> {
    for &phrase in WAKE_WORDS {
        if let Some(pos) = text.find(phrase) {
            let mut after = pos + phrase.len();
            if text[after..].starts_with(' ') {
                after += 1;
            }
            return Some((phrase, after));
        }
    }
    None
}

pub fn is_goodbye(text: &str) -> bool {
    GOODBYE_WORDS.iter().any(|w| text == *w)
}

pub fn is_cancel(text: &str) -> bool {
    CANCEL_WORDS.iter().any(|w| text == *w)
}

pub fn is_ignored(text: &str) -> bool {
    IGNORE_WORDS.iter().any(|w| text == *w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_wake_phrase_with_remainder() {
        let (phrase, pos) = find_wake_phrase("hey friday what time is it").unwrap();
        assert_eq!(phrase, "hey friday");
        assert_eq!(&"hey friday what time is it"[pos..], "what time is it");
    }

    #[test]
    fn wake_phrase_at_end_has_empty_remainder() {
        let (_, pos) = find_wake_phrase("hey friday").unwrap();
        assert_eq!(pos, "hey friday".len());
    }

    #[test]
    fn no_wake_phrase_present() {
        assert!(find_wake_phrase("what is the weather").is_none());
    }

    #[test]
    fn goodbye_and_cancel_and_ignore_lists() {
        assert!(is_goodbye("goodbye"));
        assert!(!is_goodbye("goodbye sir"));
        assert!(is_cancel("stop"));
        assert!(is_ignored(""));
        assert!(is_ignored("the"));
    }
}
