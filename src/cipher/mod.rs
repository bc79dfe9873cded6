//! Cipher transforms and the pipeline that pushes vault records through them.
//!
//! The vault never encrypts anything itself: it serializes its records
//! to plaintext lines and pipes them through a `CipherTransform`.
//!
//! - `external`: spawns a process (openssl by default) and streams
//!   through its stdin/stdout.
//! - `sealed`: in-process Argon2id + AES-256-GCM envelope.
//! - `pipeline`: `decode` / `encode` between ciphertext and records.

pub mod external;
pub mod pipeline;
pub mod sealed;

use std::io::{self, Read, Write};

use crate::errors::VaultError;

pub use external::ExternalCipher;
pub use pipeline::{decode, encode};
pub use sealed::SealedCipher;

/// Which way data flows through a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// Something that can encrypt or decrypt a byte stream under a master secret.
pub trait CipherTransform: Send + Sync {
    /// Read all of `input`, write the transformed bytes to `output`.
    ///
    /// Returns only once every byte has been consumed and produced and,
    /// for process-backed transforms, once the process has exited.
    fn transform(
        &self,
        direction: Direction,
        master: &str,
        input: &mut (dyn Read + Send),
        output: &mut (dyn Write + Send),
    ) -> crate::errors::Result<()>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// The transforms a vault can be configured with.
#[derive(Debug, Clone)]
pub enum CipherSpec {
    External(ExternalCipher),
    Sealed(SealedCipher),
}

impl CipherTransform for CipherSpec {
    fn transform(
        &self,
        direction: Direction,
        master: &str,
        input: &mut (dyn Read + Send),
        output: &mut (dyn Write + Send),
    ) -> crate::errors::Result<()> {
        match self {
            CipherSpec::External(c) => c.transform(direction, master, input, output),
            CipherSpec::Sealed(c) => c.transform(direction, master, input, output),
        }
    }

    fn name(&self) -> &str {
        match self {
            CipherSpec::External(c) => c.name(),
            CipherSpec::Sealed(c) => c.name(),
        }
    }
}

/// Map a failed write into the transform or the sink.
pub(crate) fn write_error(e: io::Error) -> VaultError {
    match e.kind() {
        io::ErrorKind::WriteZero | io::ErrorKind::BrokenPipe => VaultError::IncompleteWrite,
        _ => VaultError::Io(e),
    }
}
