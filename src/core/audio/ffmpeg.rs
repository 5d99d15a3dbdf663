//! `ffmpeg` backed post-processor

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::task;
use tracing::debug;

use super::{AudioPostProcessor, FilterChain};
use crate::core::tts::AudioFormat;
use crate::errors::{AppError, AppResult};
use crate::utils::scratch::ScratchFile;

pub const DEFAULT_MP3_BITRATE: &str = "192k";

/// Runs filter graphs and transcodes through the `ffmpeg` binary.
///
/// Each call writes its input to the scratch directory, runs ffmpeg on a
/// blocking thread and reads the output back. Scratch files are removed when
/// the call returns.
#[derive(Debug, Clone)]
pub struct FfmpegPostProcessor {
    bin: PathBuf,
    scratch_dir: PathBuf,
}

impl FfmpegPostProcessor {
    pub fn new(bin: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    async fn run(
        &self,
        input: Bytes,
        output_ext: &'static str,
        args: Vec<String>,
    ) -> Result<Bytes, String> {
        let bin = self.bin.clone();
        let dir = self.scratch_dir.clone();

        task::spawn_blocking(move || run_blocking(&bin, &dir, &input, output_ext, &args))
            .await
            .map_err(|e| format!("ffmpeg task panicked: {e}"))?
    }
}

#[async_trait]
impl AudioPostProcessor for FfmpegPostProcessor {
    async fn apply(&self, chain: &FilterChain, input: Bytes) -> AppResult<Bytes> {
        if chain.is_empty() {
            return Ok(input);
        }

        let duration = wav_duration_seconds(&input).map_err(AppError::PostProcessFailed)?;
        let graph = chain.to_filter_graph(duration);
        debug!(duration, graph = %graph, "Applying filter chain");

        self.run(input, "wav", vec!["-af".to_string(), graph])
            .await
            .map_err(AppError::PostProcessFailed)
    }

    async fn transcode(
        &self,
        input: Bytes,
        format: AudioFormat,
        bitrate: &str,
    ) -> AppResult<Bytes> {
        match format {
            AudioFormat::Wav => Ok(input),
            AudioFormat::Mp3 => {
                debug!(bitrate = %bitrate, "Transcoding to mp3");
                self.run(input, "mp3", vec!["-b:a".to_string(), bitrate.to_string()])
                    .await
                    .map_err(AppError::TranscodeFailed)
            }
        }
    }
}

fn run_blocking(
    bin: &Path,
    dir: &Path,
    input: &[u8],
    output_ext: &str,
    args: &[String],
) -> Result<Bytes, String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("cannot create {}: {e}", dir.display()))?;

    let in_file = ScratchFile::new(dir, "wav");
    let out_file = ScratchFile::new(dir, output_ext);
    std::fs::write(in_file.path(), input).map_err(|e| format!("cannot write input: {e}"))?;

    let output = Command::new(bin)
        .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
        .arg(in_file.path())
        .args(args)
        .arg(out_file.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| format!("cannot run {}: {e}", bin.display()))?;

    if !output.status.success() {
        return Err(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    std::fs::read(out_file.path())
        .map(Bytes::from)
        .map_err(|e| format!("cannot read output: {e}"))
}

/// Clip length from the WAV header
fn wav_duration_seconds(wav: &[u8]) -> Result<f32, String> {
    let reader =
        hound::WavReader::new(Cursor::new(wav)).map_err(|e| format!("input is not WAV: {e}"))?;
    let sample_rate = reader.spec().sample_rate;
    if sample_rate == 0 {
        return Err("WAV header has a zero sample rate".to_string());
    }
    Ok(reader.duration() as f32 / sample_rate as f32)
}
