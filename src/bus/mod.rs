//! MQTT message bus: device-command ingestion and `hud` state publishing.
//!
//! Grounded on `mosquitto_comms.c`/`.h`: a small `deviceType` enum gates
//! inbound `{device, action, value}` JSON onto a callback per device, and a
//! debounced state string goes out to the `hud` topic whenever the
//! listening state machine's state actually changes.

pub mod router;

use std::sync::Mutex;
use std::time::Duration;

use rumqttc::{AsyncClient, MqttOptions, QoS};
use serde::Deserialize;
use tracing::info;

use crate::error::AssistantError;

pub const HUD_TOPIC: &str = "hud";

/// Mirrors the original `deviceType` enum. Order matters: it must line up
/// with [`DEVICE_TYPE_STRINGS`] index-for-index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    AudioPlaybackDevice,
    AudioCaptureDevice,
    TextToSpeech,
    Date,
    Time,
    Music,
    VoiceAmplifier,
    Shutdown,
    Viewing,
    Volume,
    LocalLlmSwitch,
    CloudLlmSwitch,
}

/// Mirrors the original `deviceTypeStrings[]`, in enum order.
const DEVICE_TYPE_STRINGS: &[&str] = &[
    "audio playback device",
    "audio capture device",
    "text to speech",
    "date",
    "time",
    "music",
    "voice amplifier",
    "shutdown alpha bravo charlie",
    "viewing",
    "volume",
    "local llm",
    "cloud llm",
];

const DEVICE_KINDS: &[DeviceKind] = &[
    DeviceKind::AudioPlaybackDevice,
    DeviceKind::AudioCaptureDevice,
    DeviceKind::TextToSpeech,
    DeviceKind::Date,
    DeviceKind::Time,
    DeviceKind::Music,
    DeviceKind::VoiceAmplifier,
    DeviceKind::Shutdown,
    DeviceKind::Viewing,
    DeviceKind::Volume,
    DeviceKind::LocalLlmSwitch,
    DeviceKind::CloudLlmSwitch,
];

impl DeviceKind {
    pub fn as_str(self) -> &'static str {
        DEVICE_TYPE_STRINGS[DEVICE_KINDS.iter().position(|k| *k == self).unwrap()]
    }

    pub fn from_str(s: &str) -> Option<Self> {
        DEVICE_TYPE_STRINGS
            .iter()
            .position(|candidate| *candidate == s)
            .map(|i| DEVICE_KINDS[i])
    }
}

/// Inbound bus command: `{"device": "...", "action": "...", "value": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub device: String,
    pub action: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Thin wrapper over `rumqttc::AsyncClient` adding hud-state debouncing.
pub struct BusClient {
    client: AsyncClient,
    last_hud_state: Mutex<Option<String>>,
}

impl BusClient {
    /// Connect and subscribe to the single inbound command topic. Connection
    /// failure is a fatal, startup-time error per the bus's place in the
    /// error taxonomy.
    pub async fn connect(
        host: &str,
        port: u16,
        command_topic: &str,
    ) -> Result<(Self, rumqttc::EventLoop), AssistantError> {
        let mut opts = MqttOptions::new("friday-core", host, port);
        opts.set_keep_alive(Duration::from_secs(30));

        let (client, eventloop) = AsyncClient::new(opts, 64);
        client
            .subscribe(command_topic, QoS::AtMostOnce)
            .await
            .map_err(|e| AssistantError::Bus(format!("subscribe to {command_topic} failed: {e}")))?;

        info!(host, port, command_topic, "connected to message bus");

        Ok((
            Self { client, last_hud_state: Mutex::new(None) },
            eventloop,
        ))
    }

    pub async fn publish(&self, topic: &str, payload: String) -> Result<(), AssistantError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| AssistantError::Bus(format!("publish to {topic} failed: {e}")))
    }

    /// Publish `state` to the `hud` topic, but only when it differs from the
    /// last state actually published.
    pub async fn publish_ai_state(&self, ai_name: &str, state: &str) {
        {
            let mut last = self.last_hud_state.lock().unwrap();
            if last.as_deref() == Some(state) {
                return;
            }
            *last = Some(state.to_string());
        }
        let payload = serde_json::json!({ "device": "ai", "name": ai_name, "state": state }).to_string();
        let _ = self.publish(HUD_TOPIC, payload).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_kind_strings_round_trip_in_order() {
        for (kind, expected) in DEVICE_KINDS.iter().zip(DEVICE_TYPE_STRINGS.iter()) {
            assert_eq!(kind.as_str(), *expected);
            assert_eq!(DeviceKind::from_str(expected), Some(*kind));
        }
    }

    #[test]
    fn unknown_device_string_is_none() {
        assert!(DeviceKind::from_str("teleporter").is_none());
    }

    #[test]
    fn inbound_message_parses_with_optional_value() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"device":"music","action":"play","value":"jazz"}"#).unwrap();
        assert_eq!(msg.device, "music");
        assert_eq!(msg.value.as_deref(), Some("jazz"));

        let msg: InboundMessage = serde_json::from_str(r#"{"device":"shutdown alpha bravo charlie","action":"now"}"#).unwrap();
        assert!(msg.value.is_none());
    }
}
