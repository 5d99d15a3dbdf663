//! Fixed registry of named synthesis profiles.

use serde::Serialize;

/// A named, fixed triple of synthesis scalars
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub length_scale: f32,
    pub noise_scale: f32,
    pub sentence_silence: f32,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "neutral",
        length_scale: 1.0,
        noise_scale: 0.667,
        sentence_silence: 0.2,
    },
    Preset {
        name: "calm",
        length_scale: 1.12,
        noise_scale: 0.55,
        sentence_silence: 0.35,
    },
    Preset {
        name: "narrator",
        length_scale: 1.05,
        noise_scale: 0.6,
        sentence_silence: 0.3,
    },
    Preset {
        name: "energetic",
        length_scale: 0.9,
        noise_scale: 0.8,
        sentence_silence: 0.12,
    },
    Preset {
        name: "expressive",
        length_scale: 1.0,
        noise_scale: 0.85,
        sentence_silence: 0.25,
    },
];

/// Look up a preset by name (case-insensitive, surrounding whitespace ignored)
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    let name = name.trim();
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Names of every registered preset
pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}
