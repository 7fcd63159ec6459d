//! Partial/final streaming on top of the batch `SttAdapter`.
//!
//! The original system's recognizer accepts audio incrementally and can be
//! asked for a cheap partial transcript or a final, fully-reprocessed one at
//! any point. None of this codebase's adapters (whisper.cpp, cloud REST
//! APIs) expose that incrementally, so this wrapper accumulates the raw
//! samples fed to it and re-transcribes the whole buffer on each partial
//! request. It is less efficient than a true streaming recognizer but
//! preserves the contract the listening state machine depends on: a partial
//! result whose length can be compared across iterations to detect
//! progress, and a final result once silence/timeout ends the utterance.
pub struct StreamingStt {
    engine: super::SttAdapter,
    buffer: Vec<f32>,
    last_partial: String,
}

impl StreamingStt {
    pub fn new(engine: super::SttAdapter) -> Self {
        Self {
            engine,
            buffer: Vec::new(),
            last_partial: String::new(),
        }
    }

    /// Feed more audio into the utterance buffer.
    pub fn accept_waveform(&mut self, chunk: &[f32]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Length of the last partial transcript, used by the caller to detect
    /// whether the recognizer made progress since the previous iteration.
    pub fn last_partial_len(&self) -> usize {
        self.last_partial.len()
    }

    /// Re-transcribe the accumulated buffer and return the partial result.
    pub async fn partial_result(&mut self) -> anyhow::Result<String> {
        let text = self.engine.transcribe(&self.buffer).await?;
        self.last_partial = text.clone();
        Ok(text)
    }

    /// Transcribe the accumulated buffer one last time and reset.
    pub async fn final_result(&mut self) -> anyhow::Result<String> {
        let text = self.engine.transcribe(&self.buffer).await?;
        self.reset();
        Ok(text)
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_partial.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::cloud::CustomApiStt;
    use crate::stt::SttAdapter;

    #[test]
    fn reset_clears_buffer_and_partial() {
        let adapter = SttAdapter::Custom(CustomApiStt::new("http://localhost", None));
        let mut stream = StreamingStt::new(adapter);
        stream.accept_waveform(&[0.0; 16]);
        stream.last_partial = "hello".to_string();
        stream.reset();
        assert!(stream.buffer.is_empty());
        assert_eq!(stream.last_partial_len(), 0);
    }
}
