// Per-task scratch directory. Owning the TempDir gives guaranteed
// best-effort removal on every exit path, including early failures during
// compilation; nothing outside one task ever sees the directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::language::Language;

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create(language: Language) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", language.tag()))
            .tempdir()?;
        Ok(Workspace { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the submitted code under the language's source file name and
    /// return its path.
    pub fn write_source(&self, language: Language, code: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(language.source_file());
        fs::write(&path, code)?;
        Ok(path)
    }
}
