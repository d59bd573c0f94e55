//! Log writer module
//!
//! Chooses where each log stream goes: a file opened for appending, or the
//! standard stream the stream defaults to.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Writer for access log lines, stdout when no file is configured
pub fn access_writer(path: Option<&str>) -> io::Result<BoxMakeWriter> {
    match path {
        Some(p) => Ok(BoxMakeWriter::new(Mutex::new(open_log_file(p)?))),
        None => Ok(BoxMakeWriter::new(io::stdout)),
    }
}

/// Writer for diagnostics, stderr when no file is configured
pub fn error_writer(path: Option<&str>) -> io::Result<BoxMakeWriter> {
    match path {
        Some(p) => Ok(BoxMakeWriter::new(Mutex::new(open_log_file(p)?))),
        None => Ok(BoxMakeWriter::new(io::stderr)),
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/nested/access.log");
        let path = path.to_str().unwrap();

        assert!(access_writer(Some(path)).is_ok());
        assert!(Path::new(path).exists());
    }

    #[test]
    fn test_unwritable_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let path = blocker.join("error.log");

        assert!(error_writer(path.to_str()).is_err());
    }
}
