//! Secure random bytes for password generation and record salts.
//!
//! Everything that needs randomness takes a `&mut dyn RandomSource`, so
//! tests can hand in a fixed byte script instead of the OS generator.

use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::errors::{Result, VaultError};

/// A source of cryptographically secure bytes.
pub trait RandomSource: Send {
    /// Fill `buf` completely or fail.
    fn fill(&mut self, buf: &mut [u8]) -> Result<()>;
}

/// The operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| VaultError::RandomSource(e.to_string()))
    }
}

/// Replays a fixed byte sequence, then runs dry.
///
/// Only meant for tests and reproducible demos; never use it for real secrets.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    bytes: Vec<u8>,
    pos: usize,
}

impl ScriptedRandom {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            pos: 0,
        }
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

impl RandomSource for ScriptedRandom {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let available = self.remaining();
        if available < buf.len() {
            return Err(VaultError::RandomExhausted {
                needed: buf.len(),
                got: available,
            });
        }
        buf.copy_from_slice(&self.bytes[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(())
    }
}
