use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ExportError, ExportResult};

/// Destination for rendered vector records.
/// A record is committed whole, a failed write leaves no partial record behind.
pub trait VectorSink {
    fn write_record(&mut self, file_name: &str, contents: &str) -> ExportResult<()>;
}

/// Writes each record as a file inside one directory
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    /// Creates the directory (and parents) if needed
    pub fn new<P: AsRef<Path>>(root: P) -> ExportResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| ExportError::Destination { path: root.clone(), source })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl VectorSink for DirSink {
    fn write_record(&mut self, file_name: &str, contents: &str) -> ExportResult<()> {
        let path = self.root.join(file_name);
        let tmp = self.root.join(format!(".{}.tmp", file_name));

        if let Err(source) = fs::write(&tmp, contents) {
            let _ = fs::remove_file(&tmp);
            return Err(ExportError::Write { path, source });
        }
        fs::rename(&tmp, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            ExportError::Write { path: path.clone(), source }
        })?;

        tracing::debug!("wrote {}", path.display());
        Ok(())
    }
}

/// Keeps records in memory, keyed by file name
#[derive(Debug, Default)]
pub struct MemorySink {
    records: BTreeMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.records.get(file_name).map(String::as_str)
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl VectorSink for MemorySink {
    fn write_record(&mut self, file_name: &str, contents: &str) -> ExportResult<()> {
        self.records.insert(file_name.to_string(), contents.to_string());
        Ok(())
    }
}

impl<S: VectorSink + ?Sized> VectorSink for &mut S {
    fn write_record(&mut self, file_name: &str, contents: &str) -> ExportResult<()> {
        (**self).write_record(file_name, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dir_sink_creates_destination() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("sim").join("vectors");
        let mut sink = DirSink::new(&root).unwrap();
        sink.write_record("a.hex", "000\n").unwrap();

        assert_eq!(fs::read_to_string(root.join("a.hex")).unwrap(), "000\n");
        // Only the committed record remains
        let names: Vec<String> = fs::read_dir(&root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.hex".to_string()]);
    }

    #[test]
    fn test_dir_sink_overwrites() {
        let tmp = TempDir::new().unwrap();
        let mut sink = DirSink::new(tmp.path()).unwrap();
        sink.write_record("a.hex", "old\n").unwrap();
        sink.write_record("a.hex", "new\n").unwrap();
        assert_eq!(fs::read_to_string(tmp.path().join("a.hex")).unwrap(), "new\n");
    }

    #[test]
    fn test_dir_sink_destination_failure() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, "x").unwrap();
        // A regular file where a directory is needed
        let err = DirSink::new(blocker.join("vectors")).err().unwrap();
        assert!(matches!(err, ExportError::Destination { .. }), "{}", err);
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        sink.write_record("b.mem", "1\n").unwrap();
        sink.write_record("a.hex", "2\n").unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.file_names().collect::<Vec<_>>(), vec!["a.hex", "b.mem"]);
        assert_eq!(sink.get("b.mem"), Some("1\n"));
    }
}
