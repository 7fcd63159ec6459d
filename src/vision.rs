//! Single-slot image buffer fed by the bus `viewing` device.
//!
//! Mirrors `viewingCallback` in the original system: a filesystem path
//! arrives over the bus, the file is read and base64-encoded, and a ready
//! flag is raised for the listening state machine to pick up on its next
//! iteration.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::{error, info};

use crate::error::AssistantError;

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Shared slot the bus thread writes into and the state machine drains.
#[derive(Default)]
pub struct VisionSlot {
    image: Mutex<Option<String>>,
    ready: AtomicBool,
}

impl VisionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `path`, base64-encode it, and raise the ready flag. Replaces any
    /// previously pending image.
    pub fn ingest(&self, path: &Path) -> Result<(), AssistantError> {
        let bytes = fs::read(path)
            .map_err(|e| AssistantError::Bus(format!("failed to read {}: {e}", path.display())))?;
        let encoded = base64_encode(&bytes);
        info!(bytes = encoded.len(), path = %path.display(), "vision image ingested");
        *self.image.lock().unwrap() = Some(encoded);
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Take the pending image and clear the ready flag. Returns `None` if
    /// nothing was pending (the flag should not have been set in that case).
    pub fn take(&self) -> Option<String> {
        self.ready.store(false, Ordering::SeqCst);
        self.image.lock().unwrap().take()
    }
}

/// Handle a bus `viewing` device message by delegating to [`VisionSlot`].
pub fn handle_viewing_message(slot: &VisionSlot, path_str: &str) {
    let path = Path::new(path_str);
    if let Err(e) = slot.ingest(path) {
        error!("vision ingest failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn ingest_then_take_clears_slot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();
        let slot = VisionSlot::new();
        slot.ingest(file.path()).unwrap();
        assert!(slot.is_ready());
        let encoded = slot.take().unwrap();
        assert_eq!(encoded, base64_encode(b"hello"));
        assert!(!slot.is_ready());
        assert!(slot.take().is_none());
    }

    #[test]
    fn missing_file_is_recoverable_error() {
        let slot = VisionSlot::new();
        assert!(slot.ingest(Path::new("/no/such/file")).is_err());
        assert!(!slot.is_ready());
    }
}
