//! HTTP request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `api` - Health check endpoints
//! - `speak` - Text-to-speech synthesis
//! - `voices` - Installed voices, presets and engines
//! - `prefs` - Per-user preset preference
//! - `pronunciations` - Pronunciation dictionary management

pub mod api;
pub mod prefs;
pub mod pronunciations;
pub mod speak;
pub mod voices;
