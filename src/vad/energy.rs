//! RMS-based voice activity detection.

/// Root-mean-square of a chunk of samples already normalized to `[-1, 1]`.
///
/// The original system normalizes raw `int16` samples by dividing by 32768
/// before computing RMS; capture sinks in this codebase hand back `f32`
/// samples already in that range, so no further scaling is applied here.
pub fn rms(chunk: &[f32]) -> f64 {
    if chunk.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = chunk.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / chunk.len() as f64).sqrt()
}

/// Speech is present when `rms >= background + offset`.
pub const TALKING_THRESHOLD_OFFSET: f64 = 0.015;

pub fn is_speech(chunk: &[f32], background_rms: f64) -> bool {
    rms(chunk) >= background_rms + TALKING_THRESHOLD_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_has_zero_rms() {
        let silence = vec![0.0f32; 1024];
        assert_eq!(rms(&silence), 0.0);
    }

    #[test]
    fn rms_in_unit_range() {
        let chunk: Vec<f32> = (0..1024).map(|i| (i % 7) as f32 / 10.0 - 0.3).collect();
        let r = rms(&chunk);
        assert!((0.0..=1.0).contains(&r));
    }

    #[test]
    fn exactly_at_threshold_counts_as_speech() {
        let background = 0.1;
        let target = background + TALKING_THRESHOLD_OFFSET;
        let sample = target as f32;
        let chunk = vec![sample; 100];
        assert!(is_speech(&chunk, background));
    }

    #[test]
    fn below_threshold_is_silence() {
        let chunk = vec![0.01f32; 100];
        assert!(!is_speech(&chunk, 0.1));
    }
}
