//! Short-lived files handed to external tools.

use std::path::{Path, PathBuf};

use tracing::debug;

/// A uniquely named file under a scratch directory, removed on drop
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Reserve `<dir>/<uuid>.<extension>`; the file itself is not created
    pub fn new(dir: &Path, extension: &str) -> Self {
        let name = format!("{}.{extension}", uuid::Uuid::new_v4().simple());
        Self {
            path: dir.join(name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if std::fs::remove_file(&self.path).is_ok() {
            debug!(path = %self.path.display(), "Removed scratch file");
        }
    }
}
