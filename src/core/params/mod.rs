//! Synthesis parameter resolution.
//!
//! Final parameters are built in layers, each one overwriting or adjusting the
//! previous:
//!
//! 1. request scalar overrides, falling back to the configured defaults
//! 2. the user's stored preset (when it names a known preset)
//! 3. the explicit request preset (unknown names are rejected)
//! 4. markup deltas from the normalizer
//! 5. bounded jitter, then clamping of noise and silence to `[0, 1]`

mod jitter;
mod presets;

pub use jitter::{JitterSource, NoJitter, RandomJitter, SequenceJitter};
pub use presets::{PRESETS, Preset, find_preset, preset_names};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::markup::MarkupAdjustment;
use crate::errors::{AppError, AppResult};

/// Maximum absolute jitter applied to noise scale and sentence silence
pub const JITTER_AMPLITUDE: f32 = 0.03;

/// Bounds for the markup rate factor before it scales `length_scale`
pub const MIN_RATE_SCALE: f32 = 0.8;
pub const MAX_RATE_SCALE: f32 = 1.2;

/// Scalars handed to the synthesis engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisParameters {
    pub length_scale: f32,
    pub noise_scale: f32,
    pub sentence_silence: f32,
}

impl Default for SynthesisParameters {
    fn default() -> Self {
        Self {
            length_scale: 1.0,
            noise_scale: 0.667,
            sentence_silence: 0.2,
        }
    }
}

impl From<&Preset> for SynthesisParameters {
    fn from(preset: &Preset) -> Self {
        Self {
            length_scale: preset.length_scale,
            noise_scale: preset.noise_scale,
            sentence_silence: preset.sentence_silence,
        }
    }
}

/// Per-request scalar overrides; `None` keeps the default
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarOverrides {
    pub length_scale: Option<f32>,
    pub noise_scale: Option<f32>,
    pub sentence_silence: Option<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct ParameterResolver {
    defaults: SynthesisParameters,
    jitter_amplitude: f32,
}

impl Default for ParameterResolver {
    fn default() -> Self {
        Self::new(SynthesisParameters::default())
    }
}

impl ParameterResolver {
    pub fn new(defaults: SynthesisParameters) -> Self {
        Self {
            defaults,
            jitter_amplitude: JITTER_AMPLITUDE,
        }
    }

    pub fn defaults(&self) -> SynthesisParameters {
        self.defaults
    }

    /// Run every layer, including jitter and clamping
    pub fn resolve(
        &self,
        overrides: &ScalarOverrides,
        explicit_preset: Option<&str>,
        stored_preset: Option<&str>,
        adjustment: &MarkupAdjustment,
        jitter: &mut dyn JitterSource,
    ) -> AppResult<SynthesisParameters> {
        let params =
            self.resolve_without_jitter(overrides, explicit_preset, stored_preset, adjustment)?;
        let params = self.apply_jitter(params, jitter);

        debug!(
            length_scale = params.length_scale,
            noise_scale = params.noise_scale,
            sentence_silence = params.sentence_silence,
            "Resolved synthesis parameters"
        );

        Ok(params)
    }

    /// Layers 1 through 4. Values are not clamped yet.
    pub fn resolve_without_jitter(
        &self,
        overrides: &ScalarOverrides,
        explicit_preset: Option<&str>,
        stored_preset: Option<&str>,
        adjustment: &MarkupAdjustment,
    ) -> AppResult<SynthesisParameters> {
        let mut params = SynthesisParameters {
            length_scale: overrides
                .length_scale
                .unwrap_or(self.defaults.length_scale),
            noise_scale: overrides.noise_scale.unwrap_or(self.defaults.noise_scale),
            sentence_silence: overrides
                .sentence_silence
                .unwrap_or(self.defaults.sentence_silence),
        };

        if let Some(name) = non_empty(stored_preset) {
            match find_preset(name) {
                Some(preset) => params = preset.into(),
                None => warn!(preset = %name, "Ignoring unknown stored preset"),
            }
        }

        if let Some(name) = non_empty(explicit_preset) {
            let preset = find_preset(name).ok_or_else(|| {
                AppError::InvalidPreset(format!(
                    "{name} (available: {})",
                    preset_names().join(", ")
                ))
            })?;
            params = preset.into();
        }

        params.length_scale *= adjustment
            .rate_scale_factor
            .clamp(MIN_RATE_SCALE, MAX_RATE_SCALE);
        params.noise_scale += adjustment.noise_boost;
        params.sentence_silence += adjustment.extra_silence_seconds;

        Ok(params)
    }

    /// Layer 5: independent offsets on noise and silence, then clamp both to `[0, 1]`
    pub fn apply_jitter(
        &self,
        params: SynthesisParameters,
        jitter: &mut dyn JitterSource,
    ) -> SynthesisParameters {
        let noise_offset = jitter.offset(self.jitter_amplitude);
        let silence_offset = jitter.offset(self.jitter_amplitude);

        SynthesisParameters {
            length_scale: params.length_scale,
            noise_scale: (params.noise_scale + noise_offset).clamp(0.0, 1.0),
            sentence_silence: (params.sentence_silence + silence_offset).clamp(0.0, 1.0),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
