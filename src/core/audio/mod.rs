//! Audio post-processing and transcoding.
//!
//! The filter/transcode engine is an external collaborator. This module
//! describes what to run ([`FilterChain`]) and the seam to run it through
//! ([`AudioPostProcessor`]); [`FfmpegPostProcessor`] is the production
//! implementation.

mod ffmpeg;

pub use ffmpeg::{DEFAULT_MP3_BITRATE, FfmpegPostProcessor};

use std::fmt::Write as _;

use async_trait::async_trait;
use bytes::Bytes;

use crate::core::tts::AudioFormat;
use crate::errors::AppResult;

// =============================================================================
// Filters
// =============================================================================

/// One stage of the post-processing chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioFilter {
    /// EBU R128 loudness normalization
    LoudnessNormalize {
        integrated_lufs: f32,
        true_peak_db: f32,
        loudness_range: f32,
    },
    /// Dynamic range compression
    Compress {
        threshold_db: f32,
        ratio: f32,
        attack_ms: f32,
        release_ms: f32,
    },
    /// Sibilance reduction
    DeEss { intensity: f32 },
    FadeIn { seconds: f32 },
    /// Fade ending at the end of the clip
    FadeOut { seconds: f32 },
}

impl AudioFilter {
    /// Render as an ffmpeg filter; `duration` is the clip length in seconds
    pub fn render(&self, duration: f32) -> String {
        match *self {
            Self::LoudnessNormalize {
                integrated_lufs,
                true_peak_db,
                loudness_range,
            } => format!("loudnorm=I={integrated_lufs}:TP={true_peak_db}:LRA={loudness_range}"),
            Self::Compress {
                threshold_db,
                ratio,
                attack_ms,
                release_ms,
            } => format!(
                "acompressor=threshold={threshold_db}dB:ratio={ratio}:attack={attack_ms}:release={release_ms}"
            ),
            Self::DeEss { intensity } => format!("deesser=i={intensity}"),
            Self::FadeIn { seconds } => format!("afade=t=in:st=0:d={seconds}"),
            Self::FadeOut { seconds } => {
                let seconds = seconds.min(duration.max(0.0));
                let start = (duration - seconds).max(0.0);
                format!("afade=t=out:st={start:.3}:d={seconds:.3}")
            }
        }
    }
}

/// Ordered list of filters applied in one pass
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    filters: Vec<AudioFilter>,
}

impl Default for FilterChain {
    /// Loudness normalization, compression, de-essing, fade-in, fade-out
    fn default() -> Self {
        Self::new(vec![
            AudioFilter::LoudnessNormalize {
                integrated_lufs: -16.0,
                true_peak_db: -1.5,
                loudness_range: 11.0,
            },
            AudioFilter::Compress {
                threshold_db: -18.0,
                ratio: 3.0,
                attack_ms: 20.0,
                release_ms: 250.0,
            },
            AudioFilter::DeEss { intensity: 0.4 },
            AudioFilter::FadeIn { seconds: 0.05 },
            AudioFilter::FadeOut { seconds: 0.15 },
        ])
    }
}

impl FilterChain {
    pub fn new(filters: Vec<AudioFilter>) -> Self {
        Self { filters }
    }

    pub fn filters(&self) -> &[AudioFilter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Comma-separated filter graph for a clip of `duration` seconds
    pub fn to_filter_graph(&self, duration: f32) -> String {
        let mut graph = String::new();
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                graph.push(',');
            }
            let _ = write!(graph, "{}", filter.render(duration));
        }
        graph
    }
}

// =============================================================================
// Collaborator seam
// =============================================================================

/// Filter and transcode engine.
///
/// Inputs are WAV bytes. Failures map to `PostProcessFailed` and
/// `TranscodeFailed` respectively.
#[async_trait]
pub trait AudioPostProcessor: Send + Sync {
    async fn apply(&self, chain: &FilterChain, input: Bytes) -> AppResult<Bytes>;

    async fn transcode(&self, input: Bytes, format: AudioFormat, bitrate: &str)
    -> AppResult<Bytes>;
}
