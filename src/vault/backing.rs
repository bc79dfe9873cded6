//! Where a vault's encrypted bytes live.
//!
//! A `Backing` hands out a reader over the current ciphertext and a
//! `Sink` that only replaces it once `commit` is called, so a failed
//! save never leaves a half-written vault behind.

use std::fs::{self, File};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::errors::{Result, VaultError};

/// Storage for one vault's ciphertext.
pub trait Backing: Send {
    /// Whether there is anything to read yet.
    fn exists(&self) -> bool;

    /// Open the current ciphertext for reading.
    fn source(&self) -> Result<Box<dyn Read + Send>>;

    /// Start writing a replacement ciphertext.
    fn sink(&self) -> Result<Box<dyn Sink>>;

    /// Human-readable location, used in logs and errors.
    fn describe(&self) -> String;
}

/// A pending write; dropped without `commit`, it leaves the old data intact.
pub trait Sink: Write + Send {
    fn commit(self: Box<Self>) -> Result<()>;
}

// ---------------------------------------------------------------------------
// File backing
// ---------------------------------------------------------------------------

/// A vault stored in a single file.
#[derive(Debug, Clone)]
pub struct FileBacking {
    path: PathBuf,
}

impl FileBacking {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let parent = self.path.parent().unwrap_or(Path::new("."));
        parent.join(format!(
            ".{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy()
        ))
    }
}

impl Backing for FileBacking {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn source(&self) -> Result<Box<dyn Read + Send>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(VaultError::VaultNotFound(self.path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn sink(&self) -> Result<Box<dyn Sink>> {
        let tmp_path = self.tmp_path();

        // Owner-only from the start.
        #[cfg(unix)]
        let file = {
            use std::os::unix::fs::OpenOptionsExt;
            fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&tmp_path)?
        };

        #[cfg(not(unix))]
        let file = File::create(&tmp_path)?;

        Ok(Box::new(FileSink {
            file: Some(file),
            tmp_path,
            path: self.path.clone(),
            committed: false,
        }))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

struct FileSink {
    file: Option<File>,
    tmp_path: PathBuf,
    path: PathBuf,
    /// Set once the rename went through; until then `Drop` removes the temp file.
    committed: bool,
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.as_mut() {
            Some(f) => f.write(buf),
            None => Err(io::Error::other("sink already committed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }
}

impl Sink for FileSink {
    fn commit(mut self: Box<Self>) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        // Same directory, so the rename is atomic.
        fs::rename(&self.tmp_path, &self.path)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}

// ---------------------------------------------------------------------------
// Memory backing
// ---------------------------------------------------------------------------

/// A vault held in a shared in-memory buffer.
///
/// Clones share the same buffer, which makes it handy for handing the
/// same "file" to two stores.
#[derive(Debug, Clone, Default)]
pub struct MemoryBacking {
    data: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryBacking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            data: Arc::new(Mutex::new(Some(bytes))),
        }
    }

    /// A copy of the committed ciphertext, if any.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.data.lock().ok().and_then(|d| d.clone())
    }
}

impl Backing for MemoryBacking {
    fn exists(&self) -> bool {
        self.bytes().is_some()
    }

    fn source(&self) -> Result<Box<dyn Read + Send>> {
        match self.bytes() {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes))),
            None => Err(VaultError::VaultNotFound(PathBuf::from(self.describe()))),
        }
    }

    fn sink(&self) -> Result<Box<dyn Sink>> {
        Ok(Box::new(MemorySink {
            buf: Vec::new(),
            target: Arc::clone(&self.data),
        }))
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

struct MemorySink {
    buf: Vec<u8>,
    target: Arc<Mutex<Option<Vec<u8>>>>,
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for MemorySink {
    fn commit(self: Box<Self>) -> Result<()> {
        let MemorySink { buf, target } = *self;
        let mut target = target
            .lock()
            .map_err(|_| VaultError::Io(io::Error::other("memory backing lock poisoned")))?;
        *target = Some(buf);
        Ok(())
    }
}
