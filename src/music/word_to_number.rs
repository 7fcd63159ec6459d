//! Spoken-number parsing for voice volume control.
//!
//! Mirrors the original system's `parseNumericalWord`/`wordToNumber`: no
//! numerals ever reach this function, only words the recognizer already
//! transcribed, so everything is matched against fixed word lists rather
//! than parsed as digits.

const UNITS: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

const TEENS: [&str; 10] = [
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// Resolve a single word to its numeric value, 0 for anything unrecognized
/// (which also covers the literal word "zero").
fn parse_numerical_word(token: &str) -> u32 {
    if let Some(i) = UNITS.iter().position(|u| *u == token) {
        return i as u32;
    }
    if let Some(i) = TEENS.iter().position(|t| *t == token) {
        return 10 + i as u32;
    }
    if let Some(i) = TENS.iter().position(|t| !t.is_empty() && *t == token) {
        return (i as u32) * 10;
    }
    0
}

/// Parse a spoken number phrase such as "sixty nine thousand three hundred
/// twenty seven" or "zero point one eight nine" into its numeric value.
///
/// The integer part accumulates through "hundred" multiplication and
/// thousand/million/billion/trillion magnitude jumps; the fractional part
/// (after "point") is read digit-word by digit-word.
pub fn word_to_number(phrase: &str) -> f64 {
    let words: Vec<&str> = phrase.split_whitespace().collect();

    let mut result: f64 = 0.0;
    let mut temp: u32 = 0;
    for &word in &words {
        if word == "point" {
            break;
        }
        match word {
            "hundred" => temp = temp.saturating_mul(100),
            "thousand" => {
                result += temp as f64 * 1_000.0;
                temp = 0;
            }
            "million" => {
                result += temp as f64 * 1_000_000.0;
                temp = 0;
            }
            "billion" => {
                result += temp as f64 * 1_000_000_000.0;
                temp = 0;
            }
            "trillion" => {
                result += temp as f64 * 1_000_000_000_000.0;
                temp = 0;
            }
            _ => temp += parse_numerical_word(word),
        }
    }
    result += temp as f64;

    if let Some(point_idx) = words.iter().position(|w| *w == "point") {
        let frac_words = &words[point_idx + 1..];
        if !frac_words.is_empty() {
            let mut frac_value: f64 = 0.0;
            for &w in frac_words {
                frac_value = frac_value * 10.0 + parse_numerical_word(w) as f64;
            }
            result += frac_value / 10f64.powi(frac_words.len() as i32);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_words() {
        assert_eq!(word_to_number("zero"), 0.0);
        assert_eq!(word_to_number("eighteen"), 18.0);
        assert_eq!(word_to_number("twelve"), 12.0);
    }

    #[test]
    fn hundreds() {
        assert_eq!(word_to_number("seven hundred fifty six"), 756.0);
        assert_eq!(word_to_number("one hundred"), 100.0);
    }

    #[test]
    fn thousands_and_magnitudes() {
        assert_eq!(word_to_number("four thousand twenty five"), 4025.0);
        assert_eq!(
            word_to_number("sixty nine thousand three hundred twenty seven"),
            69327.0
        );
        assert_eq!(word_to_number("one million eighteen"), 1_000_018.0);
    }

    #[test]
    fn fractional_parts() {
        assert!((word_to_number("three point one four one five nine") - 3.14159).abs() < 1e-9);
        assert!((word_to_number("zero point one eight nine") - 0.189).abs() < 1e-9);
        assert!((word_to_number("zero point zero zero one four five") - 0.00145).abs() < 1e-9);
    }

    #[test]
    fn unrecognized_words_contribute_nothing() {
        assert_eq!(word_to_number(""), 0.0);
        assert_eq!(word_to_number("please turn it up"), 0.0);
    }
}
