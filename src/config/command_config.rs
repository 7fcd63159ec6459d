//! JSON schema for the command-action configuration file.
//!
//! Shape: `{"types":[...], "devices":[...], "audioDevices":[...]}`, mirroring
//! the original system's `commands_config_nuevo.json` but translated from
//! fixed-size C arrays to `Vec`s with explicit bound checks applied at load
//! time instead of relying on array capacity.

use serde::Deserialize;

use crate::error::AssistantError;

pub const MAX_ACTIONS: usize = 10;
pub const MAX_SUBACTIONS: usize = 10;
pub const MAX_DEVICES_PER_ACTION: usize = 10;
pub const MAX_WORDS: usize = 10;
pub const MAX_AUDIO_DEVICES: usize = 5;
pub const MAX_COMMANDS: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    #[serde(default)]
    pub types: Vec<ActionType>,
    #[serde(default)]
    pub devices: Vec<CommandDevice>,
    #[serde(rename = "audioDevices", default)]
    pub audio_devices: Vec<AudioDevice>,
}

/// A category of action, e.g. "lighting", "thermostat".
#[derive(Debug, Clone, Deserialize)]
pub struct ActionType {
    pub name: String,
    #[serde(rename = "subActions", default)]
    pub sub_actions: Vec<SubAction>,
}

/// A verb within an action type, e.g. "set", "toggle".
#[derive(Debug, Clone, Deserialize)]
pub struct SubAction {
    pub name: String,
    #[serde(rename = "actionWords", default)]
    pub action_words: Vec<String>,
    #[serde(rename = "actionCommand")]
    pub action_command: String,
}

/// A controllable device belonging to one of the action types above.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandDevice {
    #[serde(rename = "type")]
    pub action_type: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub unit: Option<String>,
    pub topic: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioDeviceKind {
    Capture,
    Playback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioDevice {
    #[serde(rename = "type")]
    pub kind: AudioDeviceKind,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub device: String,
}

impl CommandConfig {
    /// Load and validate a command configuration from disk.
    ///
    /// Bound violations are fatal configuration errors: the original system
    /// treats its equivalent fixed-array overflow the same way.
    pub fn load(path: &std::path::Path) -> Result<Self, AssistantError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AssistantError::Config(format!("{}: {e}", path.display())))?;
        let config: CommandConfig = serde_json::from_str(&text)
            .map_err(|e| AssistantError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AssistantError> {
        if self.types.len() > MAX_ACTIONS {
            return Err(AssistantError::Config(format!(
                "too many action types: {} (max {MAX_ACTIONS})",
                self.types.len()
            )));
        }
        for t in &self.types {
            if t.sub_actions.len() > MAX_SUBACTIONS {
                return Err(AssistantError::Config(format!(
                    "action type '{}' has too many sub-actions: {} (max {MAX_SUBACTIONS})",
                    t.name,
                    t.sub_actions.len()
                )));
            }
            for sub in &t.sub_actions {
                if sub.action_words.len() > MAX_WORDS {
                    return Err(AssistantError::Config(format!(
                        "sub-action '{}' has too many action words: {} (max {MAX_WORDS})",
                        sub.name,
                        sub.action_words.len()
                    )));
                }
            }
            let devices_of_type = self
                .devices
                .iter()
                .filter(|d| d.action_type == t.name)
                .count();
            if devices_of_type > MAX_DEVICES_PER_ACTION {
                return Err(AssistantError::Config(format!(
                    "action type '{}' has too many devices: {} (max {MAX_DEVICES_PER_ACTION})",
                    t.name, devices_of_type
                )));
            }
        }
        for d in &self.devices {
            if d.aliases.len() > MAX_WORDS {
                return Err(AssistantError::Config(format!(
                    "device '{}' has too many aliases: {} (max {MAX_WORDS})",
                    d.name,
                    d.aliases.len()
                )));
            }
            if !self.types.iter().any(|t| t.name == d.action_type) {
                return Err(AssistantError::Config(format!(
                    "device '{}' references undefined action type '{}'",
                    d.name, d.action_type
                )));
            }
        }
        if self.audio_devices.len() > MAX_AUDIO_DEVICES {
            return Err(AssistantError::Config(format!(
                "too many audio devices: {} (max {MAX_AUDIO_DEVICES})",
                self.audio_devices.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
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
                {"type": "thermostat", "name": "thermostat", "aliases": ["temperature"], "topic": "home/thermostat"}
            ],
            "audioDevices": [
                {"type": "capture", "name": "headset", "aliases": [], "device": "hw:1,0"}
            ]
        }"#
    }

    #[test]
    fn parses_and_validates_sample() {
        let config: CommandConfig = serde_json::from_str(sample_json()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.types.len(), 1);
        assert_eq!(config.devices[0].aliases, vec!["temperature".to_string()]);
    }

    #[test]
    fn rejects_unknown_device_type() {
        let mut config: CommandConfig = serde_json::from_str(sample_json()).unwrap();
        config.devices[0].action_type = "nonexistent".to_string();
        assert!(config.validate().is_err());
    }
}
