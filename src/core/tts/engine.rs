//! Engine kinds and where each one runs.

use std::collections::HashMap;

use serde::{Serialize, Serializer};
use url::Url;

use crate::errors::{AppError, AppResult};

// =============================================================================
// Engine
// =============================================================================

/// Synthesis engines the router knows about.
///
/// `Piper` runs in-process through the local pipeline; the expressive engines
/// are separate HTTP services reached through the proxy path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Engine {
    #[default]
    Piper,
    Xtts,
    Bark,
    StyleTts2,
}

impl Engine {
    pub const ALL: [Engine; 4] = [Self::Piper, Self::Xtts, Self::Bark, Self::StyleTts2];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Piper => "piper",
            Self::Xtts => "xtts",
            Self::Bark => "bark",
            Self::StyleTts2 => "styletts2",
        }
    }

    /// Parse an engine name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "piper" => Some(Self::Piper),
            "xtts" | "xtts2" | "xtts-v2" => Some(Self::Xtts),
            "bark" => Some(Self::Bark),
            "styletts2" | "styletts" | "style-tts2" | "style_tts2" => Some(Self::StyleTts2),
            _ => None,
        }
    }

    /// Parse an optional request field; absent or blank means `piper`
    pub fn from_request(name: Option<&str>) -> AppResult<Self> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            None => Ok(Self::default()),
            Some(name) => Self::from_name(name).ok_or_else(|| {
                AppError::InvalidRequest(format!(
                    "Unsupported engine: {name}. Supported engines: {}",
                    Self::ALL.map(|e| e.as_str()).join(", ")
                ))
            }),
        }
    }

    /// Whether the engine runs through the local pipeline
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Piper)
    }

    /// Environment variable holding the engine endpoint, for remote engines
    pub fn endpoint_env_var(&self) -> Option<&'static str> {
        match self {
            Self::Piper => None,
            Self::Xtts => Some("XTTS_URL"),
            Self::Bark => Some("BARK_URL"),
            Self::StyleTts2 => Some("STYLETTS2_URL"),
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Engine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Where a request for an engine is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineTarget {
    Local,
    Remote(Url),
}

/// Maps every engine to its target. Remote engines without an endpoint are
/// unconfigured.
#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    remotes: HashMap<Engine, Url>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `endpoint` for a remote engine. Local engines ignore it.
    pub fn with_remote(mut self, engine: Engine, endpoint: Url) -> Self {
        if !engine.is_local() {
            self.remotes.insert(engine, endpoint);
        }
        self
    }

    pub fn target(&self, engine: Engine) -> AppResult<EngineTarget> {
        if engine.is_local() {
            return Ok(EngineTarget::Local);
        }
        self.remotes
            .get(&engine)
            .cloned()
            .map(EngineTarget::Remote)
            .ok_or_else(|| AppError::EngineNotConfigured(engine.as_str().to_string()))
    }

    pub fn is_available(&self, engine: Engine) -> bool {
        self.target(engine).is_ok()
    }

    /// Engines that can currently serve requests, in declaration order
    pub fn available(&self) -> Vec<Engine> {
        Engine::ALL
            .into_iter()
            .filter(|engine| self.is_available(*engine))
            .collect()
    }
}
