//! Inbound bus device callbacks.
//!
//! One async task polls the MQTT event loop and dispatches each parsed
//! [`InboundMessage`] straight to the handler for its device, mirroring the
//! original `parseJsonCommandandExecute` callback table. All handlers are
//! quick: TTS/vision/music/LLM-target handles are cheap, shareable, and
//! thread-safe, so nothing here needs to hand work off to the state
//! machine thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Local, Timelike};
use rumqttc::{Event, EventLoop, Packet};
use tracing::{error, info, warn};

use crate::llm::LlmTarget;
use crate::music::word_to_number::word_to_number;
use crate::music::MusicController;
use crate::persona::AI_NAME;
use crate::tts::queue::TtsControl;
use crate::vision::VisionSlot;

use super::{BusClient, DeviceKind, InboundMessage};

/// Best-effort, last-requested device name a capture/playback reopen can
/// consult. Live hot-swapping the open `cpal::Stream` from this task is not
/// attempted: the stream is owned by the state-machine/TTS-worker threads,
/// and replacing it here would need to cross a `!Send` boundary for no
/// benefit over picking it up the next time that owner reopens on error.
#[derive(Default)]
pub struct DeviceRequests {
    pub capture: Mutex<Option<String>>,
    pub playback: Mutex<Option<String>>,
}

/// Toggle-able mic-to-speaker passthrough, grounded on `mic_passthrough.c`'s
/// `voiceAmplificationThread`: plain raw passthrough, no gain applied there
/// either, just raised output level from routing through a louder sink.
pub struct VoiceAmplifier {
    running: Arc<AtomicBool>,
    handle: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl Default for VoiceAmplifier {
    fn default() -> Self {
        Self { running: Arc::new(AtomicBool::new(false)), handle: Mutex::new(None) }
    }
}

impl VoiceAmplifier {
    pub fn enable(&self) {
        let mut guard = self.handle.lock().unwrap();
        if guard.is_some() {
            return;
        }
        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let handle = std::thread::Builder::new()
            .name("voice-amplifier".into())
            .spawn(move || passthrough_loop(running))
            .expect("failed to spawn voice amplifier thread");
        *guard = Some(handle);
    }

    pub fn disable(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

fn passthrough_loop(running: Arc<AtomicBool>) {
    use crate::audio::{audio_ring_buffer, start_capture};

    let (producer, mut consumer) = audio_ring_buffer(Some(16_000));
    let stream = match start_capture(producer, None) {
        Ok(s) => s,
        Err(e) => {
            error!("voice amplifier: failed to open capture device: {e}");
            return;
        }
    };
    let player = match crate::tts::playback::AudioPlayer::new(None) {
        Ok(p) => p,
        Err(e) => {
            error!("voice amplifier: failed to open playback device: {e}");
            return;
        }
    };
    let sink = player.sink_handle();
    info!("voice amplifier enabled");

    while running.load(Ordering::SeqCst) {
        let chunk = consumer.drain_all();
        if !chunk.is_empty() {
            sink.append(rodio::buffer::SamplesBuffer::new(1, 16_000, chunk));
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }

    drop(stream);
    info!("voice amplifier disabled");
}

/// Handles shared between the listening state machine and this router.
pub struct RouterContext {
    pub tts: TtsControl,
    pub vision: Arc<VisionSlot>,
    pub music: Arc<MusicController>,
    pub llm_target: Arc<Mutex<LlmTarget>>,
    pub device_requests: Arc<DeviceRequests>,
    pub voice_amplifier: Arc<VoiceAmplifier>,
}

/// Spawn the task that polls the MQTT event loop and dispatches inbound
/// messages for the lifetime of the process.
pub fn spawn(mut eventloop: EventLoop, ctx: RouterContext) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    match serde_json::from_slice::<InboundMessage>(&publish.payload) {
                        Ok(msg) => handle_inbound(msg, &ctx),
                        Err(e) => warn!("malformed bus message: {e}"),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("bus connection error: {e}");
                }
            }
        }
    });
}

fn handle_inbound(msg: InboundMessage, ctx: &RouterContext) {
    let Some(device) = DeviceKind::from_str(&msg.device) else {
        warn!(device = %msg.device, "unknown bus device, ignoring");
        return;
    };

    match device {
        DeviceKind::AudioPlaybackDevice => {
            if let Some(name) = msg.value {
                info!(device = %name, "playback device change requested");
                *ctx.device_requests.playback.lock().unwrap() = Some(name.clone());
                ctx.tts.enqueue(format!("Switching playback to {name} on next reopen."));
            }
        }
        DeviceKind::AudioCaptureDevice => {
            if let Some(name) = msg.value {
                info!(device = %name, "capture device change requested");
                *ctx.device_requests.capture.lock().unwrap() = Some(name.clone());
                ctx.tts.enqueue(format!("Switching capture to {name} on next reopen."));
            }
        }
        DeviceKind::TextToSpeech => {
            if let Some(text) = msg.value {
                ctx.tts.enqueue(text);
            }
        }
        DeviceKind::Date => ctx.tts.enqueue(date_announcement()),
        DeviceKind::Time => ctx.tts.enqueue(time_announcement()),
        DeviceKind::Music => handle_music(msg, ctx),
        DeviceKind::VoiceAmplifier => match msg.action.as_str() {
            "enable" => ctx.voice_amplifier.enable(),
            "disable" => ctx.voice_amplifier.disable(),
            other => warn!(action = other, "unknown voice amplifier action"),
        },
        DeviceKind::Shutdown => handle_shutdown(ctx),
        DeviceKind::Viewing => {
            if let Some(path) = msg.value {
                crate::vision::handle_viewing_message(&ctx.vision, &path);
            }
        }
        DeviceKind::Volume => {
            if let Some(value) = msg.value {
                let parsed = word_to_number(&value.to_lowercase()) as f32;
                ctx.music.set_volume(parsed);
            }
        }
        DeviceKind::LocalLlmSwitch => {
            *ctx.llm_target.lock().unwrap() = LlmTarget::Local;
            ctx.tts.enqueue("Switched to local AI.");
        }
        DeviceKind::CloudLlmSwitch => {
            *ctx.llm_target.lock().unwrap() = LlmTarget::Cloud;
            ctx.tts.enqueue("Switched to cloud AI.");
        }
    }
}

fn handle_music(msg: InboundMessage, ctx: &RouterContext) {
    match msg.action.as_str() {
        "play" => ctx.music.play(msg.value.as_deref().unwrap_or("")),
        "stop" => ctx.music.stop(),
        "next" => ctx.music.next(),
        "previous" => ctx.music.previous(),
        other => warn!(action = other, "unknown music action"),
    }
}

fn handle_shutdown(ctx: &RouterContext) {
    ctx.tts.enqueue("Emergency shutdown initiated.");
    warn!("shutdown device triggered");
    #[cfg(target_os = "linux")]
    {
        if let Err(e) = std::process::Command::new("shutdown").args(["-h", "now"]).spawn() {
            error!("failed to invoke shutdown: {e}");
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        warn!("shutdown device is only wired up on Linux; ignoring on this platform");
    }
}

/// Rotates through a handful of personality-flavored phrasings the same way
/// the original's `rand() % 3` did, just seeded off the current second
/// instead of pulling in a dependency on a random number generator.
fn date_announcement() -> String {
    let now = Local::now();
    let variants = [
        format!("Today is {}.", now.format("%A, %B %-d")),
        format!("It's {} today, boss.", now.format("%B %-d, %Y")),
        format!("The date is {}.", now.format("%Y-%m-%d")),
    ];
    variants[(now.second() as usize) % variants.len()].clone()
}

fn time_announcement() -> String {
    let now = Local::now();
    let variants = [
        format!("It's {}.", now.format("%-I:%M %p")),
        format!("The time is {} sir.", now.format("%-I:%M %p")),
        format!("Right now it's {}.", now.format("%H:%M")),
        format!("{} on the clock.", now.format("%-I:%M %p")),
    ];
    variants[(now.second() as usize) % variants.len()].clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_and_time_announcements_are_non_empty() {
        assert!(!date_announcement().is_empty());
        assert!(!time_announcement().is_empty());
    }
}
