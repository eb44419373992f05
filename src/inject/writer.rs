//! Persistence port for generated modules.

use std::{
    fs,
    path::PathBuf,
    sync::Mutex,
};

use anyhow::{Context, Result};

pub trait ModuleWriter {
    /// Persist `source` and return the path it can be required by.
    fn write(&self, source: &str) -> Result<PathBuf>;
}

/// Writes each module into its own freshly created temporary directory.
///
/// Directories are not removed; the build reads the file after the writer
/// returns and cleanup is left to the OS.
#[derive(Debug, Clone)]
pub struct TempDirWriter {
    file_name: String,
}

impl TempDirWriter {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

impl Default for TempDirWriter {
    fn default() -> Self {
        Self::new("formatters.js")
    }
}

impl ModuleWriter for TempDirWriter {
    fn write(&self, source: &str) -> Result<PathBuf> {
        let dir = tempfile::Builder::new()
            .prefix("intlpack-")
            .tempdir()
            .context("Failed to create temporary directory")?
            .keep();
        let file = dir.join(&self.file_name);
        fs::write(&file, source)
            .with_context(|| format!("Failed to write generated module {}", file.display()))?;
        Ok(file)
    }
}

/// Keeps generated modules in memory. Paths are synthetic and never exist
/// on disk.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    written: Mutex<Vec<(PathBuf, String)>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self) -> Vec<(PathBuf, String)> {
        self.written
            .lock()
            .map(|written| written.clone())
            .unwrap_or_default()
    }
}

impl ModuleWriter for MemoryWriter {
    fn write(&self, source: &str) -> Result<PathBuf> {
        let mut written = self
            .written
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory writer lock poisoned"))?;
        let path = PathBuf::from(format!("/memory/{}/formatters.js", written.len()));
        written.push((path.clone(), source.to_string()));
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_writer_uses_unique_directories() {
        let writer = TempDirWriter::default();
        let first = writer.write("a").unwrap();
        let second = writer.write("a").unwrap();

        assert_ne!(first.parent(), second.parent());
        assert_eq!(first.file_name().unwrap(), "formatters.js");
        assert_eq!(fs::read_to_string(&first).unwrap(), "a");

        fs::remove_dir_all(first.parent().unwrap()).unwrap();
        fs::remove_dir_all(second.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_memory_writer_records_sources() {
        let writer = MemoryWriter::new();
        let path = writer.write("module.exports = 1;").unwrap();

        assert_eq!(
            writer.written(),
            vec![(path, "module.exports = 1;".to_string())]
        );
    }
}
