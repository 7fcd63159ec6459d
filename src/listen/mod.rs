//! The listening state machine.
//!
//! Grounded on the original `main()` loop's `switch (recState)`: five
//! states driven by RMS-based voice activity over a fixed-size capture
//! window, layered with ASR partial/final results, wake/goodbye/cancel
//! phrase matching, command dispatch, and LLM fallback. This is the single
//! consumer of the audio ring buffer and therefore intentionally runs on
//! one thread with no internal locking of its own — everything it talks to
//! (`TtsControl`, `BusClient`, `VisionSlot`, `MusicController`) is already
//! safe to call from here while other threads use the same handles.

pub mod wake;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{info, warn};

use crate::audio::AudioConsumer;
use crate::bus::BusClient;
use crate::dispatch::CommandTable;
use crate::llm::{ChatMessage, ConversationHistory, LlmClient, LlmTarget};
use crate::persona::{self, AI_NAME, APOLOGY_UNAVAILABLE, GOODBYE_RESPONSE};
use crate::stt::stream::StreamingStt;
use crate::tts::filter::sanitize_for_speech;
use crate::tts::queue::{PlaybackState, TtsControl};
use crate::vad::energy::{is_speech, rms};
use crate::vision::VisionSlot;

use wake::{find_wake_phrase, is_cancel, is_goodbye, is_ignored};

/// One capture iteration's worth of audio, in seconds. Matches the
/// original's `DEFAULT_CAPTURE_SECONDS`.
const DEFAULT_CAPTURE_SECONDS: f64 = 0.5;

/// Consecutive silent/unchanged iterations before an utterance is
/// considered finished. Matches `DEFAULT_COMMAND_TIMEOUT`.
const DEFAULT_COMMAND_TIMEOUT_ITERS: u32 = 2;

/// Background noise is sampled for this many seconds at startup, matching
/// `BACKGROUND_CAPTURE_SECONDS`.
const BACKGROUND_CAPTURE_SECONDS: f64 = 6.0;

const SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Silence,
    WakeWordListen,
    CommandRecording,
    ProcessCommand,
    VisionReady,
}

impl State {
    fn as_str(self) -> &'static str {
        match self {
            State::Silence => "SILENCE",
            State::WakeWordListen => "WAKEWORD_LISTEN",
            State::CommandRecording => "COMMAND_RECORDING",
            State::ProcessCommand => "PROCESS_COMMAND",
            State::VisionReady => "VISION_AI_READY",
        }
    }
}

/// Everything the state machine needs handed in at construction. Built by
/// `main` once every subsystem (capture, TTS worker, bus, LLM client) is up.
pub struct ListeningStateMachine {
    consumer: AudioConsumer,
    background_rms: f64,
    stt: StreamingStt,
    tts: TtsControl,
    commands: CommandTable,
    llm: LlmClient,
    llm_target: Arc<Mutex<LlmTarget>>,
    history: ConversationHistory,
    vision: Arc<VisionSlot>,
    bus: Arc<BusClient>,
    quit: Arc<AtomicBool>,
    rt: tokio::runtime::Handle,
    wake_counter: usize,
    chunk_samples: usize,
}

impl ListeningStateMachine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        consumer: AudioConsumer,
        stt: StreamingStt,
        tts: TtsControl,
        commands: CommandTable,
        llm: LlmClient,
        llm_target: Arc<Mutex<LlmTarget>>,
        history: ConversationHistory,
        vision: Arc<VisionSlot>,
        bus: Arc<BusClient>,
        quit: Arc<AtomicBool>,
        rt: tokio::runtime::Handle,
    ) -> Self {
        let chunk_samples = (DEFAULT_CAPTURE_SECONDS * SAMPLE_RATE as f64) as usize;
        Self {
            consumer,
            background_rms: 0.0,
            stt,
            tts,
            commands,
            llm,
            llm_target,
            history,
            vision,
            bus,
            quit,
            rt,
            wake_counter: 0,
            chunk_samples,
        }
    }

    /// Run until the `quit` flag is set (by a goodbye phrase or external
    /// signal). Blocks the calling thread for the remainder of the process.
    pub fn run(mut self) {
        self.calibrate_background_rms();

        let mut state = State::Silence;
        let mut silence_next_state = State::WakeWordListen;
        let mut command_timeout: u32 = 0;
        let mut pending_command_text = String::new();

        while !self.quit.load(Ordering::SeqCst) {
            if self.vision.is_ready() {
                state = State::VisionReady;
            }

            self.publish_state(state);

            match state {
                State::Silence => {
                    self.tts.resume();
                    let chunk = self.capture_chunk();
                    if is_speech(&chunk, self.background_rms) {
                        state = silence_next_state;
                        self.accept_and_log_partial(&chunk);
                    }
                }
                State::WakeWordListen => {
                    self.tts.pause();
                    let (speaking, no_change) = self.capture_and_track(&mut command_timeout);
                    let _ = (speaking, no_change);

                    if command_timeout >= DEFAULT_COMMAND_TIMEOUT_ITERS {
                        command_timeout = 0;
                        let final_text = self.final_result();
                        self.on_wakeword_listen_timeout(
                            &final_text,
                            &mut state,
                            &mut silence_next_state,
                            &mut pending_command_text,
                            &mut command_timeout,
                        );
                    }
                }
                State::CommandRecording => {
                    if self.tts.state() == PlaybackState::Paused {
                        self.tts.discard();
                    }
                    let (_speaking, _no_change) = self.capture_and_track(&mut command_timeout);

                    if command_timeout >= DEFAULT_COMMAND_TIMEOUT_ITERS {
                        command_timeout = 0;
                        pending_command_text = self.final_result();
                        state = State::ProcessCommand;
                    }
                }
                State::ProcessCommand => {
                    let text = std::mem::take(&mut pending_command_text);
                    self.process_command(&text, &mut state, &mut silence_next_state);
                }
                State::VisionReady => {
                    self.tts.resume();
                    self.process_vision();
                    state = State::Silence;
                    silence_next_state = State::WakeWordListen;
                }
            }
        }

        self.drain_tts();
        self.tts.shutdown();
    }

    /// Capture one chunk, feed it to the ASR if there's speech, and report
    /// whether this iteration was speech and whether the partial transcript
    /// made progress since the previous iteration — shared by
    /// `WakeWordListen` and `CommandRecording`, which only differ in their
    /// top-of-case TTS handling and what happens on timeout.
    fn capture_and_track(&mut self, command_timeout: &mut u32) -> (bool, bool) {
        let chunk = self.capture_chunk();
        let speaking = is_speech(&chunk, self.background_rms);
        let mut no_change = false;

        if speaking {
            let prev_len = self.stt.last_partial_len();
            self.stt.accept_waveform(&chunk);
            let fut = self.stt.partial_result();
            if let Err(e) = self.rt.block_on(fut) {
                warn!("partial transcription failed: {e}");
            }
            if self.stt.last_partial_len() == prev_len {
                no_change = true;
            }
        }

        if !speaking || no_change {
            *command_timeout += 1;
        } else {
            *command_timeout = 0;
        }

        (speaking, no_change)
    }

    #[allow(clippy::too_many_arguments)]
    fn on_wakeword_listen_timeout(
        &mut self,
        final_text: &str,
        state: &mut State,
        silence_next_state: &mut State,
        pending_command_text: &mut String,
        command_timeout: &mut u32,
    ) {
        if is_goodbye(final_text) {
            if self.tts.state() == PlaybackState::Paused {
                self.tts.discard();
            }
            self.tts.enqueue(GOODBYE_RESPONSE);
            self.drain_tts();
            self.quit.store(true, Ordering::SeqCst);
        }

        if self.tts.state() == PlaybackState::Paused && is_cancel(final_text) {
            self.tts.discard();
            *silence_next_state = State::WakeWordListen;
            *state = State::Silence;
            return;
        }

        if let Some((_, after)) = find_wake_phrase(final_text) {
            if self.tts.state() == PlaybackState::Paused {
                self.tts.discard();
            }
            if after >= final_text.len() {
                self.tts.enqueue(persona::wake_response(self.wake_counter));
                self.wake_counter += 1;
                *command_timeout = 0;
                *silence_next_state = State::CommandRecording;
                *state = State::Silence;
            } else {
                *pending_command_text = final_text[after..].to_string();
                *state = State::ProcessCommand;
            }
            return;
        }

        if self.tts.state() == PlaybackState::Paused {
            self.tts.resume();
        }
        *silence_next_state = State::WakeWordListen;
        *state = State::Silence;
    }

    fn process_command(&mut self, command_text: &str, state: &mut State, silence_next_state: &mut State) {
        if let Some((topic, payload)) = self.commands.match_text(command_text) {
            if self.tts.state() == PlaybackState::Paused {
                self.tts.discard();
            }
            let fut = self.bus.publish(&topic, payload);
            if let Err(e) = self.rt.block_on(fut) {
                warn!("command publish failed: {e}");
            }
        } else if is_ignored(command_text) {
            if self.tts.state() == PlaybackState::Paused {
                self.tts.resume();
            }
        } else {
            self.ask_llm(command_text);
        }

        if is_goodbye(command_text) {
            self.quit.store(true, Ordering::SeqCst);
        }

        *silence_next_state = State::WakeWordListen;
        *state = State::Silence;
    }

    fn ask_llm(&mut self, command_text: &str) {
        self.history.push(ChatMessage::user(command_text));
        let target = *self.llm_target.lock().unwrap();
        let fut = self.llm.complete(target, &self.history);
        match self.rt.block_on(fut) {
            Ok((reply, fell_back)) => {
                if fell_back {
                    self.tts.enqueue("Cloud AI is unreachable, switching to local.");
                }
                if self.tts.state() == PlaybackState::Paused {
                    self.tts.discard();
                }
                self.tts.enqueue(sanitize_for_speech(&reply.content));
                self.history.push(ChatMessage::assistant(reply.content));
            }
            Err(e) => {
                warn!("LLM completion failed: {e}");
                if self.tts.state() == PlaybackState::Paused {
                    self.tts.discard();
                }
                self.tts.enqueue(APOLOGY_UNAVAILABLE);
            }
        }
    }

    fn process_vision(&mut self) {
        let Some(image) = self.vision.take() else { return };
        let prompt = "What am I looking at? Ignore the overlay unless asked about it specifically.";
        self.history.push(ChatMessage::user_with_image(prompt, &image));
        let target = *self.llm_target.lock().unwrap();
        let fut = self.llm.complete(target, &self.history);
        match self.rt.block_on(fut) {
            Ok((reply, _fell_back)) => {
                self.tts.enqueue(sanitize_for_speech(&reply.content));
                self.history.push(ChatMessage::assistant(reply.content));
            }
            Err(e) => {
                warn!("vision LLM completion failed: {e}");
                self.tts.enqueue(APOLOGY_UNAVAILABLE);
            }
        }
    }

    fn accept_and_log_partial(&mut self, chunk: &[f32]) {
        self.stt.accept_waveform(chunk);
        let fut = self.stt.partial_result();
        if let Err(e) = self.rt.block_on(fut) {
            warn!("partial transcription failed: {e}");
        }
    }

    fn final_result(&mut self) -> String {
        let fut = self.stt.final_result();
        match self.rt.block_on(fut) {
            Ok(text) => text,
            Err(e) => {
                warn!("final transcription failed: {e}");
                String::new()
            }
        }
    }

    fn publish_state(&self, state: State) {
        let fut = self.bus.publish_ai_state(AI_NAME, state.as_str());
        self.rt.block_on(fut);
    }

    fn drain_tts(&self) {
        while self.tts.state() != PlaybackState::Idle || self.tts.queue_len() > 0 {
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    /// Block until either `chunk_samples` are available or `quit` is set.
    fn capture_chunk(&mut self) -> Vec<f32> {
        let mut buf = vec![0.0f32; self.chunk_samples];
        loop {
            if self.quit.load(Ordering::SeqCst) {
                return Vec::new();
            }
            if self.consumer.available() >= self.chunk_samples {
                let read = self.consumer.pop_slice(&mut buf);
                buf.truncate(read);
                return buf;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    fn calibrate_background_rms(&mut self) {
        let target_samples = (BACKGROUND_CAPTURE_SECONDS * SAMPLE_RATE as f64) as usize;
        let mut collected = Vec::with_capacity(target_samples);
        info!("calibrating background noise level");
        while collected.len() < target_samples {
            let chunk = self.capture_chunk();
            if chunk.is_empty() {
                break;
            }
            collected.extend_from_slice(&chunk);
        }
        self.background_rms = rms(&collected);
        info!(background_rms = self.background_rms, "background calibration complete");
    }
}
