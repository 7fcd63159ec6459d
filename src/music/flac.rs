//! FLAC to f32 PCM decoding via Symphonia.
//!
//! Same shape as the TTS cloud adapters' mp3 decode step, just reading from
//! a file on disk instead of an in-memory response body and keeping the
//! native sample rate instead of resampling.

use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded mono PCM track, ready to hand to rodio.
pub struct DecodedTrack {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

pub fn decode_flac_to_mono(path: &Path) -> anyhow::Result<DecodedTrack> {
    let file = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("flac");

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| anyhow::anyhow!("FLAC probe failed for {}: {e}", path.display()))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| anyhow::anyhow!("no audio track in {}", path.display()))?;
    let track_id = track.id;
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| anyhow::anyhow!("FLAC decoder init failed: {e}"))?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(anyhow::anyhow!("FLAC decode error: {e}")),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("FLAC packet decode error (skipping): {e}");
                continue;
            }
        };
        let spec = *decoded.spec();
        sample_rate = spec.rate;
        let duration = decoded.capacity();
        let mut sample_buf = SampleBuffer::<f32>::new(duration as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        let chunk = sample_buf.samples();

        if channels <= 1 {
            samples.extend_from_slice(chunk);
        } else {
            for frame in chunk.chunks(channels) {
                samples.push(frame.iter().sum::<f32>() / channels as f32);
            }
        }
    }

    Ok(DecodedTrack { samples, sample_rate })
}
