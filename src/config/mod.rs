//! Application configuration: CLI flags, command-config JSON, and the
//! cross-platform data directory.

pub mod command_config;
pub mod paths;

use std::path::PathBuf;

use crate::error::AssistantError;

const DEFAULT_CONFIG_FILE: &str = "commands_config.json";
const DEFAULT_MQTT_HOST: &str = "127.0.0.1";
const DEFAULT_MQTT_PORT: u16 = 1883;
const DEFAULT_MUSIC_DIR: &str = "Music";

/// Resolved settings the rest of the program runs with, combining CLI flags
/// with fixed defaults. There is no environment-variable override layer —
/// the original system takes device selection purely from flags, and this
/// keeps that contract.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub capture_device: Option<String>,
    pub playback_device: Option<String>,
    pub log_file: Option<PathBuf>,
    pub command_config_path: PathBuf,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub music_dir: PathBuf,
    pub llm_cloud_base_url: String,
    pub llm_local_base_url: String,
    pub llm_api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            capture_device: None,
            playback_device: None,
            log_file: None,
            command_config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            mqtt_host: DEFAULT_MQTT_HOST.to_string(),
            mqtt_port: DEFAULT_MQTT_PORT,
            music_dir: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DEFAULT_MUSIC_DIR),
            llm_cloud_base_url: "https://api.openai.com".to_string(),
            llm_local_base_url: "http://127.0.0.1:8080".to_string(),
            llm_api_key: std::env::var("OPENAI_API_KEY").ok(),
        }
    }
}

const USAGE: &str = "\
Usage: friday-core [-c|--capture <device>] [-d|--playback <device>] [-l|--logfile <path>] [-h|--help]

  -c, --capture <device>    microphone / capture device name
  -d, --playback <device>   speaker / playback device name
  -l, --logfile <path>      write logs to a file instead of stderr
  -h, --help                print this message and exit
";

/// Hand-rolled flag parser, matching the original system's `getopt_long`
/// flag set. No CLI-parsing crate is in the dependency stack for this
/// concern, and a handful of flags doesn't warrant introducing one.
pub fn parse_args<I: IntoIterator<Item = String>>(
    args: I,
) -> Result<AppConfig, AssistantError> {
    let mut config = AppConfig::default();
    let mut it = args.into_iter();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-c" | "--capture" => {
                config.capture_device = Some(require_value(&mut it, &arg)?);
            }
            "-d" | "--playback" => {
                config.playback_device = Some(require_value(&mut it, &arg)?);
            }
            "-l" | "--logfile" => {
                config.log_file = Some(PathBuf::from(require_value(&mut it, &arg)?));
            }
            "-h" | "--help" => {
                print!("{USAGE}");
                std::process::exit(0);
            }
            other => {
                eprint!("{USAGE}");
                return Err(AssistantError::Config(format!("unknown flag: {other}")));
            }
        }
    }

    Ok(config)
}

fn require_value<I: Iterator<Item = String>>(
    it: &mut I,
    flag: &str,
) -> Result<String, AssistantError> {
    it.next()
        .ok_or_else(|| AssistantError::Config(format!("{flag} requires a value")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let config = parse_args(
            ["-c", "hw:1,0", "-d", "hw:0,0"]
                .into_iter()
                .map(String::from),
        )
        .unwrap();
        assert_eq!(config.capture_device.as_deref(), Some("hw:1,0"));
        assert_eq!(config.playback_device.as_deref(), Some("hw:0,0"));
    }

    #[test]
    fn parses_long_flags_and_logfile() {
        let config = parse_args(
            ["--logfile", "/tmp/friday.log"]
                .into_iter()
                .map(String::from),
        )
        .unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/friday.log")));
    }

    #[test]
    fn unknown_flag_errors() {
        assert!(parse_args(["--bogus"].into_iter().map(String::from)).is_err());
    }

    #[test]
    fn missing_value_errors() {
        assert!(parse_args(["-c"].into_iter().map(String::from)).is_err());
    }
}
