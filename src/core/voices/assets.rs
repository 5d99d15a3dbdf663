//! Voice asset cache - local model/config pairs keyed by voice

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::download::Downloader;
use super::sanitize_voice_key;
use crate::errors::{AppError, AppResult};
use crate::utils::atomic_file::is_partial;
use crate::utils::url_validation::validate_asset_url;

pub const MODEL_EXTENSION: &str = "onnx";
pub const CONFIG_EXTENSION: &str = "json";

/// Absolute paths of a usable voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVoice {
    pub key: String,
    pub model_path: PathBuf,
    pub config_path: PathBuf,
}

/// Voice listing entry: file names relative to the voice directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledVoice {
    pub key: String,
    pub model: String,
    pub config: String,
}

/// Files found in a voice directory, by slot
#[derive(Debug, Default)]
struct VoiceFiles {
    model: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl VoiceFiles {
    fn is_complete(&self) -> bool {
        self.model.is_some() && self.config.is_some()
    }
}

pub struct VoiceAssetResolver {
    root: PathBuf,
    downloader: Downloader,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl VoiceAssetResolver {
    pub fn new(root: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        Self {
            root: root.into(),
            downloader: Downloader::new(client),
            locks: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the assets of `voice_key` (sanitized)
    pub fn voice_dir(&self, voice_key: &str) -> PathBuf {
        self.root.join(sanitize_voice_key(voice_key))
    }

    /// Ensure a model and its config exist locally, downloading what is missing.
    ///
    /// A voice that is already complete on disk never touches the network.
    pub async fn resolve(
        &self,
        voice_key: &str,
        model_url: Option<&str>,
        config_url: Option<&str>,
    ) -> AppResult<ResolvedVoice> {
        let key = sanitize_voice_key(voice_key);
        let dir = self.root.join(&key);

        let files = scan_voice_dir(&dir).await?;
        if files.is_complete() {
            return finish(key, &dir, files);
        }

        // One resolution per key at a time; others wait and then rescan
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.fetch_missing(key.clone(), &dir, model_url, config_url)
                .await
        };

        // Forget the lock once nobody else is waiting on it
        drop(lock);
        self.locks
            .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    /// Rescan under the key lock and download whichever slot is still empty.
    /// The voice directory is created by the downloader, so a key without
    /// sources leaves nothing on disk.
    async fn fetch_missing(
        &self,
        key: String,
        dir: &Path,
        model_url: Option<&str>,
        config_url: Option<&str>,
    ) -> AppResult<ResolvedVoice> {
        let mut files = scan_voice_dir(dir).await?;

        if files.model.is_none() {
            if let Some(url) = non_blank(model_url) {
                files.model = Some(self.fetch_into(dir, url).await?);
            }
        }
        if files.config.is_none() {
            if let Some(url) = non_blank(config_url) {
                files.config = Some(self.fetch_into(dir, url).await?);
            }
        }

        finish(key, dir, files)
    }

    /// Every voice directory that holds both a model and a config, by key
    pub async fn list_installed(&self) -> AppResult<Vec<InstalledVoice>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "cannot list {}: {e}",
                    self.root.display()
                )));
            }
        };

        let mut voices = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::Storage(format!("cannot list {}: {e}", self.root.display())))?
        {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let files = scan_voice_dir(&path).await?;
            if let (Some(model), Some(config)) = (files.model, files.config) {
                voices.push(InstalledVoice {
                    key: entry.file_name().to_string_lossy().into_owned(),
                    model: file_name(&model),
                    config: file_name(&config),
                });
            }
        }

        voices.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(voices)
    }

    /// Download `url` to `<dir>/<basename>` unless that file already exists
    async fn fetch_into(&self, dir: &Path, url: &str) -> AppResult<PathBuf> {
        let (url, file_name) = validate_asset_url(url).map_err(|e| AppError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let dest = dir.join(file_name);
        if fs::try_exists(&dest).await.unwrap_or(false) {
            debug!(path = %dest.display(), "Asset already present, skipping download");
            return Ok(dest);
        }

        self.downloader.download(&url, &dest).await?;
        info!(path = %dest.display(), "Voice asset downloaded");
        Ok(dest)
    }
}

/// Turn the scanned slots into a voice, or name the missing file.
///
/// A `<model>.onnx.json` sidecar needs no special case: the scan already
/// classifies it as the config.
fn finish(key: String, dir: &Path, files: VoiceFiles) -> AppResult<ResolvedVoice> {
    let model_path = files.model.ok_or_else(|| {
        AppError::AssetNotFound(format!(
            "no .{MODEL_EXTENSION} model for voice '{key}' in {} and no model URL given",
            dir.display()
        ))
    })?;

    let config_path = files.config.ok_or_else(|| {
        AppError::AssetNotFound(format!(
            "no .{CONFIG_EXTENSION} config for voice '{key}' in {} and no config URL given",
            dir.display()
        ))
    })?;

    Ok(ResolvedVoice {
        key,
        model_path,
        config_path,
    })
}

/// Classify the files of a voice directory; lexicographically first wins
async fn scan_voice_dir(dir: &Path) -> AppResult<VoiceFiles> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(VoiceFiles::default()),
        Err(e) => {
            return Err(AppError::AssetNotFound(format!(
                "cannot read {}: {e}",
                dir.display()
            )));
        }
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::AssetNotFound(format!("cannot read {}: {e}", dir.display())))?
    {
        let path = entry.path();
        if path.is_file() && !is_partial(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = VoiceFiles::default();
    for path in paths {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if ext.eq_ignore_ascii_case(MODEL_EXTENSION) {
            files.model.get_or_insert(path);
        } else if ext.eq_ignore_ascii_case(CONFIG_EXTENSION) {
            files.config.get_or_insert(path);
        }
    }
    Ok(files)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(root: &Path) -> VoiceAssetResolver {
        VoiceAssetResolver::new(root, reqwest::Client::new())
    }

    fn populate(root: &Path, key: &str, files: &[&str]) {
        let dir = root.join(key);
        std::fs::create_dir_all(&dir).unwrap();
        for name in files {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
    }

    #[tokio::test]
    async fn test_existing_asset_issues_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        populate(dir.path(), "es_ES", &["es_ES.onnx", "es_ES.onnx.json"]);

        let model_url = format!("{}/es_ES.onnx", server.uri());
        let config_url = format!("{}/es_ES.onnx.json", server.uri());
        let voice = resolver(dir.path())
            .resolve("es_ES", Some(&model_url), Some(&config_url))
            .await
            .unwrap();

        assert_eq!(voice.key, "es_ES");
        assert_eq!(voice.model_path, dir.path().join("es_ES/es_ES.onnx"));
        assert_eq!(voice.config_path, dir.path().join("es_ES/es_ES.onnx.json"));
    }

    #[tokio::test]
    async fn test_lexicographic_tie_break() {
        let dir = tempdir().unwrap();
        populate(
            dir.path(),
            "multi",
            &["b.onnx", "a.onnx", "z.json", "c.json", "notes.txt"],
        );

        let voice = resolver(dir.path())
            .resolve("multi", None, None)
            .await
            .unwrap();
        assert_eq!(voice.model_path.file_name().unwrap(), "a.onnx");
        assert_eq!(voice.config_path.file_name().unwrap(), "c.json");
    }

    #[tokio::test]
    async fn test_downloads_missing_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/voices/es_ES-davefx-medium.onnx"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"model".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/voices/es_ES-davefx-medium.onnx.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let resolver = resolver(dir.path());
        let model_url = format!("{}/voices/es_ES-davefx-medium.onnx", server.uri());
        let config_url = format!("{}/voices/es_ES-davefx-medium.onnx.json", server.uri());

        let voice = resolver
            .resolve("es ES", Some(&model_url), Some(&config_url))
            .await
            .unwrap();

        assert_eq!(voice.key, "es_ES");
        assert_eq!(std::fs::read(&voice.model_path).unwrap(), b"model");
        assert_eq!(std::fs::read(&voice.config_path).unwrap(), b"{}");

        // Second resolution is served from disk
        resolver
            .resolve("es ES", Some(&model_url), Some(&config_url))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_model() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let model_url = format!("{}/voice.onnx", server.uri());

        let result = resolver(dir.path())
            .resolve("broken", Some(&model_url), None)
            .await;

        assert!(matches!(result, Err(AppError::DownloadFailed { .. })));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("broken"))
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
    }

    #[tokio::test]
    async fn test_missing_model_without_url() {
        let dir = tempdir().unwrap();
        let result = resolver(dir.path()).resolve("ghost", None, None).await;
        assert!(matches!(result, Err(AppError::AssetNotFound(_))));
    }

    #[tokio::test]
    async fn test_sidecar_config_is_found_by_scan() {
        let dir = tempdir().unwrap();
        populate(dir.path(), "side", &["voice.onnx", "voice.onnx.json"]);

        let voice = resolver(dir.path())
            .resolve("side", None, None)
            .await
            .unwrap();
        assert_eq!(voice.config_path, dir.path().join("side/voice.onnx.json"));
    }

    #[tokio::test]
    async fn test_missing_config_is_asset_not_found() {
        let dir = tempdir().unwrap();
        populate(dir.path(), "side", &["voice.onnx"]);

        match resolver(dir.path()).resolve("side", None, None).await {
            Err(AppError::AssetNotFound(reason)) => assert!(reason.contains("config")),
            other => panic!("Expected AssetNotFound, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dot_keys_stay_inside_the_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/evil.onnx"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"model".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cfg.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let base = tempdir().unwrap();
        let root = base.path().join("models");
        std::fs::create_dir_all(&root).unwrap();
        // Would be picked up if the key resolved to the parent directory
        std::fs::write(base.path().join("stray.json"), b"{}").unwrap();

        let resolver = resolver(&root);
        let model_url = format!("{}/evil.onnx", server.uri());
        let config_url = format!("{}/cfg.json", server.uri());

        for key in ["..", "."] {
            let voice = resolver
                .resolve(key, Some(&model_url), Some(&config_url))
                .await
                .unwrap();
            let dir = voice.model_path.parent().unwrap();
            assert_eq!(dir.parent().unwrap(), root.as_path());
            assert_ne!(dir, root.as_path());
            assert_eq!(voice.config_path.parent().unwrap(), dir);
            assert_eq!(resolver.voice_dir(key), dir);
        }

        assert!(!base.path().join("evil.onnx").exists());
        assert!(!root.join("evil.onnx").exists());
        assert!(!base.path().join("cfg.json").exists());
    }

    #[tokio::test]
    async fn test_unknown_voice_leaves_no_trace() {
        let dir = tempdir().unwrap();
        let resolver = resolver(dir.path());

        let result = resolver.resolve("ghost", None, None).await;

        assert!(matches!(result, Err(AppError::AssetNotFound(_))));
        assert!(!dir.path().join("ghost").exists());
        assert!(resolver.locks.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_asset_url_is_download_failure() {
        let dir = tempdir().unwrap();
        let result = resolver(dir.path())
            .resolve("v", Some("ftp://example.com/v.onnx"), None)
            .await;
        assert!(matches!(result, Err(AppError::DownloadFailed { .. })));
    }

    #[tokio::test]
    async fn test_list_installed_skips_incomplete_voices() {
        let dir = tempdir().unwrap();
        populate(dir.path(), "b_voice", &["b.onnx", "b.onnx.json"]);
        populate(dir.path(), "a_voice", &["a.onnx", "a.json"]);
        populate(dir.path(), "partial", &["p.onnx"]);
        populate(
            dir.path(),
            "in_flight",
            &["i.onnx", "i.onnx.json.0123abcd.part"],
        );

        let voices = resolver(dir.path()).list_installed().await.unwrap();
        let keys: Vec<_> = voices.iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, vec!["a_voice", "b_voice"]);
        assert_eq!(voices[0].model, "a.onnx");
        assert_eq!(voices[0].config, "a.json");
    }

    #[tokio::test]
    async fn test_list_installed_without_root() {
        let dir = tempdir().unwrap();
        let voices = resolver(&dir.path().join("missing"))
            .list_installed()
            .await
            .unwrap();
        assert!(voices.is_empty());
    }
}
