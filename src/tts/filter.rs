//! Strip markup artefacts from LLM replies before they are spoken.

const END_OF_TURN_MARKER: &str = "<end_of_turn>";
const STRIPPED_PUNCTUATION: &[char] = &['*', '#', '`', '_'];

/// Remove the end-of-turn marker, a handful of punctuation characters that
/// read oddly when spoken, and any emoji codepoints.
pub fn sanitize_for_speech(text: &str) -> String {
    let without_marker = text.replace(END_OF_TURN_MARKER, "");
    without_marker
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c) && !is_emoji(*c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_emoji(c: char) -> bool {
    matches!(c as u32,
        0x1F300..=0x1FAFF | 0x2600..=0x27BF | 0x1F1E6..=0x1F1FF | 0x2190..=0x21FF
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_end_of_turn_marker() {
        assert_eq!(sanitize_for_speech("hello<end_of_turn>"), "hello");
    }

    #[test]
    fn strips_markup_punctuation() {
        assert_eq!(sanitize_for_speech("**bold** text"), "bold text");
    }

    #[test]
    fn strips_emoji() {
        assert_eq!(sanitize_for_speech("done \u{1F600}"), "done");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(sanitize_for_speech("hello sir"), "hello sir");
    }
}
