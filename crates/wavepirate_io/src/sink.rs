//! Output files for extracted records.
//!
//! Every record becomes `<dir>/<base_name>_<sequence>.wav`. The SHA-256 of
//! each file is computed while it is written.

use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;
use wavepirate_core::SinkFactory;

const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Name of the output file for record `sequence` of source `base_name`.
pub fn output_file_name(base_name: &str, sequence: u32) -> String {
    format!("{}_{}.wav", base_name, sequence)
}

/// A finalized output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub sequence: u32,
    pub path: PathBuf,
    pub size: u64,
    /// Lowercase hex SHA-256 of the file contents.
    pub sha256: String,
}

/// One open output file.
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
    hasher: Sha256,
    written: u64,
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Writes records of one source into a directory.
pub struct DirectorySinks {
    output_dir: PathBuf,
    base_name: String,
    overwrite: bool,
    written: Vec<WrittenFile>,
}

impl DirectorySinks {
    /// Creates a sink factory writing into `output_dir`.
    ///
    /// # Arguments
    ///
    /// * `output_dir` - Directory for the extracted files; created, including
    ///   missing parents, if it does not exist
    /// * `base_name` - Prefix of every output name, normally the source's
    ///   file name
    ///
    /// # Returns
    ///
    /// A factory that refuses to replace existing files (see
    /// [`DirectorySinks::overwrite`]), or an error if:
    /// - The directory cannot be created (permission denied, read-only
    ///   filesystem)
    /// - A non-directory file already occupies `output_dir`
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut sinks = DirectorySinks::new(Path::new("recovered"), "disk.img")?;
    /// // Records land in recovered/disk.img_1.wav, recovered/disk.img_2.wav, ...
    /// ```
    pub fn new(output_dir: &Path, base_name: impl Into<String>) -> io::Result<Self> {
        fs::create_dir_all(output_dir)?;

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            base_name: base_name.into(),
            overwrite: false,
            written: Vec::new(),
        })
    }

    /// Replace existing files instead of refusing to create them.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn output_path(&self, sequence: u32) -> PathBuf {
        self.output_dir
            .join(output_file_name(&self.base_name, sequence))
    }

    /// Files finalized so far, in sequence order.
    pub fn written(&self) -> &[WrittenFile] {
        &self.written
    }

    pub fn into_written(self) -> Vec<WrittenFile> {
        self.written
    }
}

impl SinkFactory for DirectorySinks {
    type Sink = FileSink;

    fn create(&mut self, sequence: u32) -> io::Result<Self::Sink> {
        let path = self.output_path(sequence);

        let mut options = OpenOptions::new();
        options.write(true);
        if self.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let file = options.open(&path).map_err(|e| {
            io::Error::new(e.kind(), format!("{}: {}", path.display(), e))
        })?;

        Ok(FileSink {
            path,
            writer: BufWriter::with_capacity(WRITE_BUFFER_SIZE, file),
            hasher: Sha256::new(),
            written: 0,
        })
    }

    fn finish(&mut self, sequence: u32, sink: Self::Sink) -> io::Result<()> {
        let FileSink {
            path,
            writer,
            hasher,
            written,
        } = sink;

        if let Err(e) = persist(writer) {
            remove_partial(&path);
            return Err(e);
        }

        self.written.push(WrittenFile {
            sequence,
            path,
            size: written,
            sha256: hex::encode(hasher.finalize()),
        });
        Ok(())
    }

    fn abandon(&mut self, _sequence: u32, sink: Self::Sink) {
        let path = sink.path;
        drop(sink.writer);
        remove_partial(&path);
    }
}

/// Flushes the buffer and forces the file to stable storage.
fn persist(writer: BufWriter<File>) -> io::Result<()> {
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("Failed to remove partial output {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("disk.img", 1), "disk.img_1.wav");
        assert_eq!(output_file_name("dump", 42), "dump_42.wav");
    }

    #[test]
    fn test_finish_records_size_and_digest() {
        let dir = tempdir().unwrap();
        let mut sinks = DirectorySinks::new(dir.path(), "dump").unwrap();

        let mut sink = sinks.create(1).unwrap();
        sink.write_all(b"abc").unwrap();
        sinks.finish(1, sink).unwrap();

        let file = &sinks.written()[0];
        assert_eq!(file.path, dir.path().join("dump_1.wav"));
        assert_eq!(file.size, 3);
        assert_eq!(
            file.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(fs::read(&file.path).unwrap(), b"abc");
    }

    #[test]
    fn test_existing_file_is_not_replaced() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("dump_1.wav"), b"evidence").unwrap();
        let mut sinks = DirectorySinks::new(dir.path(), "dump").unwrap();

        let err = sinks.create(1).err().unwrap();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(dir.path().join("dump_1.wav")).unwrap(), b"evidence");
    }

    #[test]
    fn test_overwrite_replaces_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("dump_1.wav"), b"old contents").unwrap();
        let mut sinks = DirectorySinks::new(dir.path(), "dump")
            .unwrap()
            .overwrite(true);

        let mut sink = sinks.create(1).unwrap();
        sink.write_all(b"new").unwrap();
        sinks.finish(1, sink).unwrap();

        assert_eq!(fs::read(dir.path().join("dump_1.wav")).unwrap(), b"new");
    }

    #[test]
    fn test_abandon_removes_partial_file() {
        let dir = tempdir().unwrap();
        let mut sinks = DirectorySinks::new(dir.path(), "dump").unwrap();

        let mut sink = sinks.create(1).unwrap();
        sink.write_all(b"partial").unwrap();
        sinks.abandon(1, sink);

        assert!(!dir.path().join("dump_1.wav").exists());
        assert!(sinks.written().is_empty());
    }

    #[test]
    fn test_new_creates_nested_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let sinks = DirectorySinks::new(&nested, "dump").unwrap();

        assert!(nested.is_dir());
        assert_eq!(sinks.output_path(3), nested.join("dump_3.wav"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_finish_removes_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("dump_1.wav");
        // Every write to /dev/full fails with ENOSPC once the buffer is flushed.
        std::os::unix::fs::symlink("/dev/full", &target).unwrap();
        let mut sinks = DirectorySinks::new(dir.path(), "dump")
            .unwrap()
            .overwrite(true);

        let mut sink = sinks.create(1).unwrap();
        sink.write_all(b"never persisted").unwrap();
        let err = sinks.finish(1, sink).unwrap_err();

        assert_eq!(err.raw_os_error(), Some(28));
        assert!(fs::symlink_metadata(&target).is_err());
        assert!(sinks.written().is_empty());
    }
}
