//! URL validation for asset sources and remote engine endpoints
//!
//! Asset URLs are user-supplied and end up as file names on disk, so they are
//! checked before any request is made:
//! - Scheme must be HTTP or HTTPS
//! - A host must be present
//! - Asset URLs must end in a non-empty path segment (the file name)

use thiserror::Error;
use url::Url;

use crate::core::voices::sanitize_voice_key;

/// Errors that can occur during URL validation
#[derive(Debug, Error, PartialEq)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("URL scheme must be HTTP or HTTPS, got: {0}")]
    UnsupportedScheme(String),

    #[error("URL must have a host")]
    MissingHost,

    #[error("URL has no file name: {0}")]
    MissingFileName(String),
}

/// Validate a remote engine endpoint
pub fn validate_endpoint_url(raw: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(raw.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

/// Validate an asset download URL and return it with its sanitized file name
pub fn validate_asset_url(raw: &str) -> Result<(Url, String), UrlValidationError> {
    let url = validate_endpoint_url(raw)?;
    let file_name = url_basename(&url)
        .ok_or_else(|| UrlValidationError::MissingFileName(url.to_string()))?;
    Ok((url, file_name))
}

/// Last path segment of the URL, sanitized for use as a file name
pub fn url_basename(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;

    let decoded = percent_decode(segment);
    let name = sanitize_voice_key(&decoded);
    // Never let a URL name a parent or current directory
    if name.chars().all(|c| c == '.' || c == '_') {
        return None;
    }
    Some(name)
}

fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_accepts_http_and_https() {
        assert!(validate_endpoint_url("http://xtts:8000/generate").is_ok());
        assert!(validate_endpoint_url("https://tts.example.com/generate").is_ok());
    }

    #[test]
    fn test_endpoint_rejects_other_schemes() {
        assert_eq!(
            validate_endpoint_url("ftp://example.com/voice.onnx"),
            Err(UrlValidationError::UnsupportedScheme("ftp".to_string()))
        );
        assert!(matches!(
            validate_endpoint_url("file:///etc/passwd"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            validate_endpoint_url("not a url"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_asset_url_file_name() {
        let (_, name) = validate_asset_url(
            "https://huggingface.co/rhasspy/piper-voices/resolve/main/es/es_ES-davefx-medium.onnx",
        )
        .unwrap();
        assert_eq!(name, "es_ES-davefx-medium.onnx");

        let (_, name) =
            validate_asset_url("https://example.com/voices/es_ES.onnx.json?download=true")
                .unwrap();
        assert_eq!(name, "es_ES.onnx.json");
    }

    #[test]
    fn test_asset_url_name_is_sanitized() {
        let (_, name) = validate_asset_url("https://example.com/voz%20espa%C3%B1ola.onnx").unwrap();
        assert_eq!(name, "voz_espa_ola.onnx");
    }

    #[test]
    fn test_asset_url_without_file_name() {
        assert!(matches!(
            validate_asset_url("https://example.com/"),
            Err(UrlValidationError::MissingFileName(_))
        ));
        assert!(matches!(
            validate_asset_url("https://example.com/voices/.."),
            Err(UrlValidationError::MissingFileName(_))
        ));
    }
}
