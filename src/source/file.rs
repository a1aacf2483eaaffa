//! File-based data source.
//!
//! Watches a JSON file that a bedside gateway rewrites with the latest
//! batch of patient snapshots.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{parse_batch, DataSource, RawBatch};

/// Identity of one version of the watched file.
///
/// Gateways often rewrite the file within the filesystem's timestamp
/// granularity, or restore an older copy, so a change is any difference in
/// modification time or length rather than a strictly newer mtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> std::io::Result<Self> {
        let meta = fs::metadata(path)?;
        Ok(Self {
            modified: meta.modified()?,
            len: meta.len(),
        })
    }
}

/// A data source that reads snapshot batches from a JSON file.
///
/// A batch is returned once per version of the file. An empty file is
/// treated as a write in progress and retried on the next poll. Read and
/// parse failures are kept in [`DataSource::error`] until a later version
/// parses.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    seen: Option<FileStamp>,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            seen: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn set_error(&mut self, error: Option<String>) {
        if error == self.last_error {
            return;
        }
        match &error {
            Some(e) => tracing::debug!("{}: {}", self.description, e),
            None => tracing::info!("{}: readable again", self.description),
        }
        self.last_error = error;
    }

    fn load(&mut self, stamp: FileStamp) -> Option<RawBatch> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                self.set_error(Some(format!("Read error: {}", e)));
                return None;
            }
        };

        if content.trim().is_empty() {
            return None;
        }

        // A failed version is not retried until the file changes again.
        self.seen = Some(stamp);
        match parse_batch(&content) {
            Ok(batch) => {
                self.set_error(None);
                Some(batch)
            }
            Err(e) => {
                self.set_error(Some(format!("Parse error: {}", e)));
                None
            }
        }
    }
}

impl DataSource for FileSource {
    fn poll(&mut self) -> Option<RawBatch> {
        match FileStamp::of(&self.path) {
            Ok(stamp) if self.seen == Some(stamp) => None,
            Ok(stamp) => self.load(stamp),
            Err(e) => {
                // Keep the last batch's state; the gateway may be mid-rename.
                self.set_error(Some(format!("Read error: {}", e)));
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn batch_json(first_temperature: f64) -> String {
        format!(
            r#"[
                {{"id": 1, "temperature": {first_temperature}, "heart_rate": 72, "blood_pressure": "120/80", "oxygen": 98, "humidity": 45}},
                {{"id": 2, "temperature": 38.1, "heart_rate": 88, "blood_pressure": "135/85", "oxygen": 96, "humidity": 50}}
            ]"#
        )
    }

    fn rewrite(path: &Path, content: &str, modified: SystemTime) {
        fs::write(path, content).unwrap();
        let file = OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(modified).unwrap();
    }

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/vitals.json");
        assert_eq!(source.path(), Path::new("/tmp/vitals.json"));
        assert_eq!(source.description(), "file: /tmp/vitals.json");
        assert!(source.error().is_none());
    }

    #[test]
    fn test_file_source_poll_reads_each_version_once() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", batch_json(36.6)).unwrap();

        let mut source = FileSource::new(file.path());

        let batch = source.poll().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1]["id"], 2);

        assert!(source.poll().is_none());
    }

    #[test]
    fn test_file_source_detects_same_length_rewrite_with_older_mtime() {
        let file = NamedTempFile::new().unwrap();
        let now = SystemTime::now();
        rewrite(file.path(), &batch_json(36.6), now);

        let mut source = FileSource::new(file.path());
        assert_eq!(source.poll().unwrap()[0]["temperature"], 36.6);

        // Same byte length, timestamp moved backwards (restored copy).
        rewrite(file.path(), &batch_json(37.9), now - Duration::from_secs(60));
        assert_eq!(source.poll().unwrap()[0]["temperature"], 37.9);
    }

    #[test]
    fn test_file_source_empty_file_is_retried() {
        let file = NamedTempFile::new().unwrap();
        let mut source = FileSource::new(file.path());

        assert!(source.poll().is_none());
        assert!(source.error().is_none());

        rewrite(file.path(), &batch_json(36.6), SystemTime::now());
        assert_eq!(source.poll().unwrap().len(), 2);
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FileSource::new("/nonexistent/path/vitals.json");

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Read error"));
    }

    #[test]
    fn test_file_source_parse_error_clears_on_next_good_version() {
        let file = NamedTempFile::new().unwrap();
        let now = SystemTime::now();
        rewrite(file.path(), "not valid json", now);

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Parse error"));

        // The broken version is not re-read.
        assert!(source.poll().is_none());

        rewrite(file.path(), &batch_json(36.6), now + Duration::from_secs(1));
        assert_eq!(source.poll().unwrap().len(), 2);
        assert!(source.error().is_none());
    }
}
