//! friday-core entry point.
//!
//! Wires audio capture, the listening state machine, TTS playback, the MQTT
//! message bus, and the LLM adapter into one running process. Mirrors the
//! original `main()`'s startup order: config → logging → command table →
//! background calibration → sinks → bus → LLM client → TTS worker → state
//! machine loop.

mod audio;
mod bus;
mod config;
mod dispatch;
mod error;
mod listen;
mod llm;
mod music;
mod persona;
mod stt;
mod tts;
mod vad;
mod vision;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use audio::{audio_ring_buffer, start_capture};
use bus::router::{DeviceRequests, RouterContext, VoiceAmplifier};
use bus::BusClient;
use config::command_config::CommandConfig;
use config::paths::get_data_dir;
use config::AppConfig;
use dispatch::CommandTable;
use llm::{ConversationHistory, LlmClient, LlmTarget};
use music::MusicController;
use persona::{AI_DESCRIPTION, AI_NAME, APPLICATION_NAME};
use stt::stream::StreamingStt;
use tts::playback::AudioPlayer;
use tts::queue;
use vision::VisionSlot;

/// Conversation turns kept in history before the oldest roll off, the
/// system prompt excepted.
const MAX_CONVERSATION_TURNS: usize = 20;

fn init_logging(config: &AppConfig, data_dir: &std::path::Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let log_dir = config
        .log_file
        .as_ref()
        .map(|p| p.parent().unwrap_or_else(|| std::path::Path::new(".")).to_path_buf())
        .unwrap_or_else(|| data_dir.to_path_buf());
    let log_name = config
        .log_file
        .as_ref()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("friday-core.log")
        .to_string();

    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, log_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(non_blocking)
            .with_ansi(false)
            .init();
        return Some(guard);
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    None
}

#[tokio::main]
async fn main() {
    let config = match config::parse_args(std::env::args().skip(1)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let data_dir = get_data_dir();
    let _log_guard = init_logging(&config, &data_dir);
    info!("{AI_NAME} starting up");

    let command_config = match CommandConfig::load(&config.command_config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to load command configuration: {e}");
            std::process::exit(1);
        }
    };
    let commands = match CommandTable::compile(&command_config) {
        Ok(t) => t,
        Err(e) => {
            error!("failed to compile command table: {e}");
            std::process::exit(1);
        }
    };
    info!(commands = commands.len(), "command table compiled");

    let (producer, consumer) = audio_ring_buffer(None);
    let _capture_stream = match start_capture(producer, config.capture_device.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to open capture device: {e}");
            std::process::exit(1);
        }
    };

    let tts_player = match AudioPlayer::new(config.playback_device.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            error!("failed to open playback device: {e}");
            std::process::exit(1);
        }
    };

    let (bus_client, eventloop) =
        match BusClient::connect(&config.mqtt_host, config.mqtt_port, APPLICATION_NAME).await {
            Ok(pair) => pair,
            Err(e) => {
                error!("failed to connect to message bus: {e}");
                std::process::exit(1);
            }
        };
    let bus_client = Arc::new(bus_client);

    let llm_client = LlmClient::new(
        config.llm_cloud_base_url.clone(),
        config.llm_local_base_url.clone(),
        config.llm_api_key.clone(),
    );
    let llm_target = Arc::new(Mutex::new(LlmTarget::Cloud));
    let history = ConversationHistory::new(AI_DESCRIPTION, Some(MAX_CONVERSATION_TURNS));

    let tts_adapter = match tts::create_tts_engine("kokoro", &data_dir, None, None, None) {
        Ok(engine) => engine,
        Err(e) => {
            warn!("local Kokoro TTS unavailable ({e}), falling back to Edge cloud TTS");
            match tts::create_tts_engine("edge", &data_dir, None, None, None) {
                Ok(engine) => engine,
                Err(e) => {
                    error!("no TTS backend available: {e}");
                    std::process::exit(1);
                }
            }
        }
    };

    let rt_handle = tokio::runtime::Handle::current();
    let tts = queue::spawn(tts_adapter, tts_player, rt_handle.clone());

    let stt_adapter = match stt::create_stt_engine("whisper-local", &data_dir, None, None, None) {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("no STT backend available: {e}");
            std::process::exit(1);
        }
    };
    let streaming_stt = StreamingStt::new(stt_adapter);

    let vision = Arc::new(VisionSlot::new());
    let music = Arc::new(MusicController::new(config.music_dir.clone(), config.playback_device.clone()));
    let device_requests = Arc::new(DeviceRequests::default());
    let voice_amplifier = Arc::new(VoiceAmplifier::default());
    let quit = Arc::new(AtomicBool::new(false));

    let router_ctx = RouterContext {
        tts: tts.clone(),
        vision: Arc::clone(&vision),
        music: Arc::clone(&music),
        llm_target: Arc::clone(&llm_target),
        device_requests: Arc::clone(&device_requests),
        voice_amplifier: Arc::clone(&voice_amplifier),
    };
    bus::router::spawn(eventloop, router_ctx);

    {
        let quit = Arc::clone(&quit);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                quit.store(true, Ordering::SeqCst);
            }
        });
    }

    info!("{}", persona::time_of_day_greeting(chrono::Local::now()));

    let state_machine = listen::ListeningStateMachine::new(
        consumer,
        streaming_stt,
        tts,
        commands,
        llm_client,
        llm_target,
        history,
        vision,
        bus_client,
        quit,
        rt_handle,
    );

    // The state machine blocks its thread on audio capture and calls back
    // into async adapters via `Handle::block_on`. Running it as a blocking
    // task keeps that `block_on` off a thread the runtime is using to poll
    // other futures, which `Handle::block_on` forbids.
    tokio::task::spawn_blocking(move || state_machine.run())
        .await
        .expect("listening state machine panicked");

    info!("{AI_NAME} shutting down");
}
