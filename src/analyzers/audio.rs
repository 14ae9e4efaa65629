// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Audio probing before transcription

use std::io::Cursor;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Leading bytes handed to the probe; enough for the frame and Xing/VBRI headers
pub const PROBE_BYTES: usize = 64 * 1024;

/// What a quick container probe could tell about a recording
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AudioProbe {
    pub codec: Option<String>,
    pub duration_secs: Option<f64>,
}

/// Probe MP3 bytes. Returns `None` when symphonia cannot recognize the stream.
pub fn probe_audio(data: Vec<u8>) -> Option<AudioProbe> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .ok()?;

    let mut probe = AudioProbe::default();
    if let Some(track) = probed.format.default_track() {
        let params = &track.codec_params;
        probe.codec = symphonia::default::get_codecs()
            .get_codec(params.codec)
            .map(|d| d.short_name.to_string());
        if let (Some(n_frames), Some(sample_rate)) = (params.n_frames, params.sample_rate) {
            probe.duration_secs = Some(n_frames as f64 / sample_rate as f64);
        }
    }

    Some(probe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_not_audio() {
        assert!(probe_audio(vec![0u8; 64]).is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(probe_audio(Vec::new()).is_none());
    }
}
