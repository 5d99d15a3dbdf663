//! Voice asset management: local model/config pairs, downloaded on demand.

mod assets;
mod download;

pub use assets::{
    CONFIG_EXTENSION, InstalledVoice, MODEL_EXTENSION, ResolvedVoice, VoiceAssetResolver,
};
pub use download::Downloader;

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
///
/// Surrounding whitespace is trimmed first; an empty key becomes `_`. Keys made
/// only of dots (`.`, `..`) have every dot replaced so the result always names
/// a subdirectory of the asset root. The function is idempotent.
pub fn sanitize_voice_key(key: &str) -> String {
    let sanitized: String = key
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "_".to_string()
    } else if sanitized.chars().all(|c| c == '.') {
        "_".repeat(sanitized.len())
    } else {
        sanitized
    }
}
