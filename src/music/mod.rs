//! Music playback action.
//!
//! Grounded on the original `musicCallback`: a recursive, case-insensitive
//! filename search over a configured music directory builds a bounded
//! playlist, and play/next/previous/stop drive a dedicated playback thread.
//! "Stop" only signals the thread; it does not join it, matching the
//! original's asymmetry between "stop" (fire and forget) and "next"/
//! "previous"/a fresh "play" (which do join before respawning).

mod flac;
pub mod word_to_number;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{error, info, warn};

use crate::dispatch::glob::glob_match;

/// Matches the original `MAX_PLAYLIST_LENGTH`.
pub const MAX_PLAYLIST_LENGTH: usize = 100;

struct ControllerState {
    playlist: Vec<PathBuf>,
    cursor: usize,
    stop_flag: Option<Arc<AtomicBool>>,
    worker: Option<JoinHandle<()>>,
    volume: f32,
}

/// Shared handle the bus router calls into for the `music` and `volume`
/// devices.
pub struct MusicController {
    music_dir: PathBuf,
    playback_device: Option<String>,
    state: Mutex<ControllerState>,
}

impl MusicController {
    pub fn new(music_dir: PathBuf, playback_device: Option<String>) -> Self {
        Self {
            music_dir,
            playback_device,
            state: Mutex::new(ControllerState {
                playlist: Vec::new(),
                cursor: 0,
                stop_flag: None,
                worker: None,
                volume: 1.0,
            }),
        }
    }

    /// Search for `value` under the music directory and start playing the
    /// first match. Kills and joins whatever was already playing first.
    pub fn play(&self, value: &str) {
        let mut state = self.state.lock().unwrap();
        stop_and_join(&mut state);
        state.playlist.clear();
        state.cursor = 0;

        let trimmed = value.trim();
        if trimmed.is_empty() {
            warn!("music play requested with no search value");
            return;
        }

        let pattern = format!("*{}*.flac", trimmed.replace(' ', "*"));
        let mut found = Vec::new();
        search_directory(&self.music_dir, &pattern, &mut found);
        found.sort();
        info!(count = found.len(), pattern = %pattern, "music search complete");
        state.playlist = found;

        if state.playlist.is_empty() {
            info!("No music matching that description was found.");
            return;
        }
        self.spawn_track(&mut state);
    }

    /// Signal the playback thread to stop. Does not join it; a subsequent
    /// play/next/previous will.
    pub fn stop(&self) {
        let state = self.state.lock().unwrap();
        if let Some(flag) = state.stop_flag.as_ref() {
            flag.store(true, Ordering::SeqCst);
        }
    }

    pub fn next(&self) {
        let mut state = self.state.lock().unwrap();
        if state.playlist.is_empty() {
            return;
        }
        stop_and_join(&mut state);
        state.cursor = (state.cursor + 1) % state.playlist.len();
        self.spawn_track(&mut state);
    }

    pub fn previous(&self) {
        let mut state = self.state.lock().unwrap();
        if state.playlist.is_empty() {
            return;
        }
        stop_and_join(&mut state);
        state.cursor = if state.cursor == 0 { state.playlist.len() - 1 } else { state.cursor - 1 };
        self.spawn_track(&mut state);
    }

    /// Set the music playback gain. Out-of-range values (outside `[0, 2]`)
    /// are silently ignored, matching the assistant's general tolerance for
    /// unparsed voice input.
    pub fn set_volume(&self, value: f32) {
        if !(0.0..=2.0).contains(&value) {
            warn!(value, "volume out of range, ignoring");
            return;
        }
        self.state.lock().unwrap().volume = value;
    }

    fn spawn_track(&self, state: &mut ControllerState) {
        let path = state.playlist[state.cursor].clone();
        let stop_flag = Arc::new(AtomicBool::new(false));
        state.stop_flag = Some(Arc::clone(&stop_flag));
        let device = self.playback_device.clone();
        let volume = state.volume;
        let handle = std::thread::Builder::new()
            .name("music-playback".into())
            .spawn(move || play_track(path, device, volume, stop_flag))
            .expect("failed to spawn music playback thread");
        state.worker = Some(handle);
    }
}

fn stop_and_join(state: &mut ControllerState) {
    if let Some(flag) = state.stop_flag.take() {
        flag.store(true, Ordering::SeqCst);
    }
    if let Some(handle) = state.worker.take() {
        let _ = handle.join();
    }
}

fn play_track(path: PathBuf, device: Option<String>, volume: f32, stop_flag: Arc<AtomicBool>) {
    info!(path = %path.display(), "playing track");
    let track = match flac::decode_flac_to_mono(&path) {
        Ok(t) => t,
        Err(e) => {
            error!("failed to decode {}: {e}", path.display());
            return;
        }
    };
    let player = match crate::tts::playback::AudioPlayer::new(device.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            error!("failed to open playback device for music: {e}");
            return;
        }
    };
    let sink = player.sink_handle();
    sink.set_volume(volume);
    sink.append(rodio::buffer::SamplesBuffer::new(1, track.sample_rate, track.samples));

    while !sink.empty() {
        if stop_flag.load(Ordering::SeqCst) {
            sink.stop();
            return;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
}

/// Recursively walk `root`, appending regular files whose name matches
/// `pattern` (case-insensitive, `*`-glob) up to [`MAX_PLAYLIST_LENGTH`].
fn search_directory(root: &Path, pattern: &str, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        if out.len() >= MAX_PLAYLIST_LENGTH {
            warn!("Playlist is full.");
            return;
        }
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else { continue };
        if file_type.is_dir() {
            search_directory(&path, pattern, out);
        } else if file_type.is_file() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if glob_match(&pattern.to_lowercase(), &name.to_lowercase()) {
                    out.push(path);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn finds_matching_flac_files_case_insensitively_and_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("album");
        fs::create_dir(&sub).unwrap();
        File::create(dir.path().join("Bohemian Rhapsody.flac")).unwrap();
        File::create(sub.join("bohemian reprise.FLAC")).unwrap();
        File::create(dir.path().join("unrelated.mp3")).unwrap();

        let pattern = format!("*{}*.flac", "bohemian".replace(' ', "*"));
        let mut found = Vec::new();
        search_directory(dir.path(), &pattern, &mut found);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn playlist_search_respects_max_length() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..(MAX_PLAYLIST_LENGTH + 5) {
            File::create(dir.path().join(format!("track{i}.flac"))).unwrap();
        }
        let mut found = Vec::new();
        search_directory(dir.path(), "*track*.flac", &mut found);
        assert_eq!(found.len(), MAX_PLAYLIST_LENGTH);
    }

    #[test]
    fn next_and_previous_are_noop_on_empty_playlist() {
        let controller = MusicController::new(PathBuf::from("/nonexistent"), None);
        controller.next();
        controller.previous();
        assert_eq!(controller.state.lock().unwrap().cursor, 0);
    }

    #[test]
    fn volume_out_of_range_is_ignored() {
        let controller = MusicController::new(PathBuf::from("/nonexistent"), None);
        controller.set_volume(1.5);
        assert_eq!(controller.state.lock().unwrap().volume, 1.5);
        controller.set_volume(3.0);
        assert_eq!(controller.state.lock().unwrap().volume, 1.5);
        controller.set_volume(-0.1);
        assert_eq!(controller.state.lock().unwrap().volume, 1.5);
    }
}
