//! Read-only source files.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::path::Path;

/// A carving source opened read-only for one forward pass.
///
/// Works for regular image files as well as block devices; the size is taken
/// from the file metadata and is only used for progress reporting.
///
/// # Example
///
/// ```ignore
/// use std::io::Read;
/// use wavepirate_io::SourceFile;
///
/// let mut source = SourceFile::open("disk.img")?;
/// let mut head = [0u8; 12];
/// source.read_exact(&mut head)?;
/// ```
pub struct SourceFile {
    file: File,
    size: u64,
}

impl SourceFile {
    /// Opens a carving source for reading.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a disk image, raw dump or block device
    ///
    /// # Returns
    ///
    /// A reader positioned at offset zero, or an error if:
    /// - The path does not exist
    /// - Permission is denied (block devices usually need root)
    /// - The file metadata cannot be read
    ///
    /// On Linux the kernel is advised that the file will be read once,
    /// sequentially. Advice failures are ignored.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(false).open(path)?;

        #[cfg(target_os = "linux")]
        {
            use rustix::fs::{Advice, fadvise};

            let _ = fadvise(&file, 0, None, Advice::Sequential);
            let _ = fadvise(&file, 0, None, Advice::NoReuse);
        }

        let size = file.metadata()?.len();

        Ok(Self { file, size })
    }

    /// Length in bytes as reported by the filesystem; zero for most devices.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Read for SourceFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// File name of a source path, used as the prefix of output names.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string())
}
