//! Command table compiler and matcher.
//!
//! Expands the declarative action/device configuration into a flat,
//! immutable list of `(wildcard, extraction, template, topic)` tuples and
//! matches recognized speech against it.
//!
//! Matching is first-hit-wins in compilation order, which follows
//! type → sub-action → action-word → device/alias nesting. Put more
//! specific phrasing earlier in the configuration file if two action words
//! could otherwise both match the same utterance.

pub(crate) mod glob;

use chrono::Local;

use crate::config::command_config::CommandConfig;
use crate::error::AssistantError;

const DEVICE_PLACEHOLDER: &str = "%device_name%";
const VALUE_PLACEHOLDER: &str = "%value%";
const DATETIME_PLACEHOLDER: &str = "%datetime%";

/// One compiled, matchable command.
#[derive(Debug, Clone)]
pub struct CompiledCommand {
    /// Full utterance pattern with the device slot filled and the value
    /// slot replaced by a trailing `*`.
    pub wildcard_pattern: String,
    /// Same shape, but the value slot is the literal prefix up to which the
    /// spoken value is extracted.
    pub extraction_prefix: String,
    /// `actionCommand` with the device slot filled; `%value%` and
    /// `%datetime%` are resolved at dispatch time.
    pub command_template: String,
    pub topic: String,
}

/// The full, immutable product of compiling a [`CommandConfig`].
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    commands: Vec<CompiledCommand>,
}

impl CommandTable {
    pub fn compile(config: &CommandConfig) -> Result<Self, AssistantError> {
        let mut commands = Vec::new();

        for action_type in &config.types {
            let devices: Vec<&crate::config::command_config::CommandDevice> = config
                .devices
                .iter()
                .filter(|d| d.action_type == action_type.name)
                .collect();

            for sub_action in &action_type.sub_actions {
                for action_word in &sub_action.action_words {
                    for device in &devices {
                        let mut names = Vec::with_capacity(1 + device.aliases.len());
                        names.push(device.name.as_str());
                        names.extend(device.aliases.iter().map(|a| a.as_str()));

                        for device_name in names {
                            let wildcard_pattern = format!(
                                "{}*",
                                substitute(action_word, Some(device_name), Some("*"))
                            );
                            let extraction_prefix =
                                prefix_before_value(action_word, device_name);
                            let command_template =
                                substitute(&sub_action.action_command, Some(&device.name), None);

                            commands.push(CompiledCommand {
                                wildcard_pattern,
                                extraction_prefix,
                                command_template,
                                topic: device.topic.clone(),
                            });

                            if commands.len() > crate::config::command_config::MAX_COMMANDS {
                                return Err(AssistantError::Config(format!(
                                    "compiled command table exceeds {} entries",
                                    crate::config::command_config::MAX_COMMANDS
                                )));
                            }
                        }
                    }
                }
            }
        }

        Ok(Self { commands })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Find the first command whose wildcard pattern matches `text`, and
    /// return the dispatch-ready `(topic, payload)` pair.
    pub fn match_text(&self, text: &str) -> Option<(String, String)> {
        for cmd in &self.commands {
            if glob::glob_match(&cmd.wildcard_pattern, text) {
                let value = extract_value(&cmd.extraction_prefix, text);
                let payload = substitute(&cmd.command_template, None, Some(&value));
                return Some((cmd.topic.clone(), payload));
            }
        }
        None
    }
}

/// Replace `%device_name%`, `%value%`, and `%datetime%` placeholders.
/// `%datetime%` is always expanded with the current local time — the
/// authoritative behavior is to expand it at dispatch time, not when the
/// table is compiled, so every invocation gets a fresh timestamp.
fn substitute(template: &str, device_name: Option<&str>, value: Option<&str>) -> String {
    let mut out = template.to_string();
    if let Some(name) = device_name {
        out = out.replace(DEVICE_PLACEHOLDER, name);
    }
    if let Some(v) = value {
        out = out.replace(VALUE_PLACEHOLDER, v);
    }
    if out.contains(DATETIME_PLACEHOLDER) {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        out = out.replace(DATETIME_PLACEHOLDER, &stamp);
    }
    out
}

/// The literal text that precedes the value placeholder once the device
/// slot is filled in, used to find where the spoken value begins.
fn prefix_before_value(action_word: &str, device_name: &str) -> String {
    let filled = action_word.replace(DEVICE_PLACEHOLDER, device_name);
    match filled.find(VALUE_PLACEHOLDER) {
        Some(idx) => filled[..idx].to_string(),
        None => filled,
    }
}

/// Extract whatever follows `prefix` in `text`, trimmed of a single leading
/// separating space.
fn extract_value(prefix: &str, text: &str) -> String {
    match text.strip_prefix(prefix) {
        Some(rest) => rest.trim_start().to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::command_config::CommandConfig;

    fn sample_config() -> CommandConfig {
        serde_json::from_str(
            r#"{
                "types": [
                    {
                        "name": "thermostat",
                        "subActions": [
                            {
                                "name": "set",
                                "actionWords": ["set %device_name% to %value%"],
                                "actionCommand": "{\"action\":\"set\",\"value\":\"%value%\"}"
                            }
                        ]
                    }
                ],
                "devices": [
                    {"type": "thermostat", "name": "light", "aliases": ["lamp"], "topic": "home/light"}
                ],
                "audioDevices": []
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn matches_canonical_name_and_alias() {
        let table = CommandTable::compile(&sample_config()).unwrap();
        assert_eq!(table.len(), 2);

        let (topic, payload) = table.match_text("set light to seven").unwrap();
        assert_eq!(topic, "home/light");
        assert!(payload.contains("seven"));

        let (topic, payload) = table.match_text("set lamp to seven").unwrap();
        assert_eq!(topic, "home/light");
        assert!(payload.contains("seven"));
    }

    #[test]
    fn no_match_returns_none() {
        let table = CommandTable::compile(&sample_config()).unwrap();
        assert!(table.match_text("what is the weather").is_none());
    }

    #[test]
    fn datetime_placeholder_expands() {
        let expanded = substitute("backup_%datetime%", None, None);
        assert!(expanded.starts_with("backup_"));
        assert_ne!(expanded, "backup_%datetime%");
    }
}
