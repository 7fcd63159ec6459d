//! Fixed identity and scripted phrases for the assistant.
//!
//! These are constants, not configuration, because they define the
//! assistant's voice rather than a deployment-specific setting. An operator
//! who wants a different name or persona recompiles with different
//! constants here, mirroring how the upstream project gates the persona
//! behind a compile-time define rather than a config key.

use chrono::Timelike;

pub const APPLICATION_NAME: &str = "friday-core";
pub const AI_NAME: &str = "friday";

pub const AI_DESCRIPTION: &str = "Friday, a second-generation, female-voiced, snarky yet kind AI that assists with tasks, problem-solving, and info retrieval. Address the user as \"sir\" or \"boss\" occasionally and don't mention being an AI model. You're being talked to over an automatic speech recognition interface and played back using text to speech. Keep responses brief, around 30 words, unless asked for a longer explanation. You are a general purpose assistant.";

pub const WAKE_WORDS: &[&str] = &[
    "hello friday",
    "okay friday",
    "alright friday",
    "hey friday",
    "hi friday",
    "good evening friday",
    "good day friday",
    "good morning friday",
];

pub const WAKE_RESPONSES: &[&str] = &[
    "Hello Sir.",
    "At your service Sir.",
    "Yes Sir?",
    "How may I assist you Sir?",
    "Listening Sir.",
];

pub const GOODBYE_WORDS: &[&str] = &["good bye", "goodbye", "good night", "bye", "quit", "exit"];

pub const GOODBYE_RESPONSE: &str = "Goodbye sir";

pub const IGNORE_WORDS: &[&str] = &["", "the", "cancel", "never mind", "nevermind", "ignore"];

pub const CANCEL_WORDS: &[&str] = &[
    "stop",
    "stop it",
    "cancel",
    "hold on",
    "wait",
    "never mind",
    "abort",
    "pause",
    "enough",
    "disregard",
    "no thanks",
    "forget it",
    "leave it",
    "drop it",
    "stand by",
    "cease",
    "interrupt",
    "say no more",
    "shut up",
    "silence",
    "zip it",
    "enough already",
    "that's enough",
    "stop right there",
];

pub const APOLOGY_UNAVAILABLE: &str = "I'm sorry but I'm currently unavailable boss.";

/// Pick a greeting string appropriate for the current local hour.
pub fn time_of_day_greeting(now: chrono::DateTime<chrono::Local>) -> &'static str {
    match now.hour() {
        3..=11 => "Good morning boss.",
        12..=17 => "Good day Sir.",
        _ => "Good evening Sir.",
    }
}

/// Deterministically vary the wake acknowledgement without relying on a
/// random number generator (the state machine already has a monotonically
/// increasing wake counter it can feed in here).
pub fn wake_response(counter: usize) -> &'static str {
    WAKE_RESPONSES[counter % WAKE_RESPONSES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wake_response_cycles() {
        assert_eq!(wake_response(0), WAKE_RESPONSES[0]);
        assert_eq!(wake_response(WAKE_RESPONSES.len()), WAKE_RESPONSES[0]);
    }

    #[test]
    fn greeting_buckets() {
        use chrono::TimeZone;
        let morning = chrono::Local.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        assert_eq!(time_of_day_greeting(morning), "Good morning boss.");
        let evening = chrono::Local.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(time_of_day_greeting(evening), "Good evening Sir.");
    }
}
