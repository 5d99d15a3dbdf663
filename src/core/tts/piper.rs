//! Local synthesis through the `piper` command line engine

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::task;
use tracing::debug;

use crate::core::params::SynthesisParameters;
use crate::core::voices::ResolvedVoice;
use crate::errors::{AppError, AppResult};
use crate::utils::scratch::ScratchFile;

/// Turns normalized text into WAV bytes with a resolved voice
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice: &ResolvedVoice,
        params: &SynthesisParameters,
    ) -> AppResult<Bytes>;
}

/// Runs the piper binary on a blocking thread, text on stdin, WAV to a
/// scratch file that is read back and removed.
#[derive(Debug, Clone)]
pub struct PiperSynthesizer {
    bin: PathBuf,
    scratch_dir: PathBuf,
}

impl PiperSynthesizer {
    pub fn new(bin: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Command line for one synthesis run
    pub fn command(
        &self,
        voice: &ResolvedVoice,
        params: &SynthesisParameters,
        output: &Path,
    ) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--model")
            .arg(&voice.model_path)
            .arg("--config")
            .arg(&voice.config_path)
            .arg("--length_scale")
            .arg(format!("{:.3}", params.length_scale))
            .arg("--noise_scale")
            .arg(format!("{:.3}", params.noise_scale))
            .arg("--sentence_silence")
            .arg(format!("{:.3}", params.sentence_silence))
            .arg("--output_file")
            .arg(output);
        cmd
    }
}

#[async_trait]
impl Synthesizer for PiperSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: &ResolvedVoice,
        params: &SynthesisParameters,
    ) -> AppResult<Bytes> {
        let this = self.clone();
        let text = text.to_string();
        let voice = voice.clone();
        let params = *params;

        task::spawn_blocking(move || this.run_blocking(&text, &voice, &params))
            .await
            .map_err(|e| AppError::SynthesisFailed(format!("piper task panicked: {e}")))?
            .map_err(AppError::SynthesisFailed)
    }
}

impl PiperSynthesizer {
    fn run_blocking(
        &self,
        text: &str,
        voice: &ResolvedVoice,
        params: &SynthesisParameters,
    ) -> Result<Bytes, String> {
        std::fs::create_dir_all(&self.scratch_dir)
            .map_err(|e| format!("cannot create {}: {e}", self.scratch_dir.display()))?;
        let out_file = ScratchFile::new(&self.scratch_dir, "wav");

        let mut cmd = self.command(voice, params, out_file.path());
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        debug!(command = ?cmd, "Running piper");
        let mut child = cmd
            .spawn()
            .map_err(|e| format!("cannot run {}: {e}", self.bin.display()))?;
        // A failed write usually means piper already exited; its status says why
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(text.as_bytes()),
            None => Ok(()),
        };
        let output = child
            .wait_with_output()
            .map_err(|e| format!("piper did not finish: {e}"))?;

        if !output.status.success() {
            return Err(format!(
                "piper exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        written.map_err(|e| format!("cannot write text to piper: {e}"))?;

        let wav = std::fs::read(out_file.path())
            .map_err(|e| format!("piper produced no output: {e}"))?;
        if wav.is_empty() {
            return Err("piper produced an empty file".to_string());
        }
        Ok(Bytes::from(wav))
    }
}
