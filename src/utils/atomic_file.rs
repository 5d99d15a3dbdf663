//! Write-then-rename helpers.
//!
//! Content is written to a uniquely named sibling of the destination and then
//! renamed over it, so readers either see the previous file or the complete
//! new one, never a partial write.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Suffix carried by in-flight temporary files
pub const PARTIAL_SUFFIX: &str = "part";

/// Unique temporary path next to `dest`: `<dest>.<uuid>.part`
pub fn temp_sibling(dest: &Path) -> PathBuf {
    let mut name: OsString = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("file"));
    name.push(format!(".{}.{PARTIAL_SUFFIX}", uuid::Uuid::new_v4().simple()));
    dest.with_file_name(name)
}

/// Whether `path` looks like a temporary file produced by [`temp_sibling`]
pub fn is_partial(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == PARTIAL_SUFFIX)
}

/// Atomically replace `dest` with `contents`
pub async fn write_atomic(dest: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let tmp = temp_sibling(dest);
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp, dest).await
}
