//! In-process cipher: Argon2id key derivation + AES-256-GCM.
//!
//! Envelope layout:
//!
//! ```text
//! [GVLT: 4 bytes][version: 1 byte][memory_kib, iterations, parallelism: 3 x u32 LE]
//! [salt: 32 bytes][nonce: 12 bytes][ciphertext + tag]
//! ```
//!
//! The Argon2 parameters travel with the ciphertext so a vault always
//! reopens with the settings it was sealed with, even after the config
//! changes.  Every seal draws a fresh salt.

use std::io::{Read, Write};

use zeroize::Zeroizing;

use super::{write_error, CipherTransform, Direction};
use crate::crypto::encryption::{decrypt, encrypt, NONCE_LEN};
use crate::crypto::kdf::{
    derive_key, generate_salt, Argon2Params, MAX_ITERATIONS, MAX_MEMORY_KIB, MAX_PARALLELISM,
    SALT_LEN,
};
use crate::crypto::random::OsRandom;
use crate::errors::{Result, VaultError};

/// Magic bytes at the start of every sealed vault.
const MAGIC: &[u8; 4] = b"GVLT";

/// Current envelope version.
pub const CURRENT_VERSION: u8 = 1;

/// magic + version + three u32 params.
const PREFIX_LEN: usize = 4 + 1 + 12;

const HEADER_LEN: usize = PREFIX_LEN + SALT_LEN;

/// Argon2id + AES-256-GCM, parameterized by the KDF cost used for new seals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SealedCipher {
    params: Argon2Params,
}

impl SealedCipher {
    pub fn new(params: Argon2Params) -> Self {
        Self { params }
    }

    fn seal(&self, master: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        let salt = generate_salt(&mut OsRandom)?;
        let key = Zeroizing::new(derive_key(master.as_bytes(), &salt, &self.params)?);
        let body = encrypt(key.as_slice(), plaintext)?;

        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(MAGIC);
        out.push(CURRENT_VERSION);
        out.extend_from_slice(&self.params.memory_kib.to_le_bytes());
        out.extend_from_slice(&self.params.iterations.to_le_bytes());
        out.extend_from_slice(&self.params.parallelism.to_le_bytes());
        out.extend_from_slice(&salt);
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn open(master: &str, data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if data.len() < HEADER_LEN + NONCE_LEN {
            return Err(VaultError::InvalidVaultFormat(
                "too small to be a sealed vault".into(),
            ));
        }
        if &data[0..4] != MAGIC {
            return Err(VaultError::InvalidVaultFormat(
                "missing GVLT magic bytes".into(),
            ));
        }
        let version = data[4];
        if version != CURRENT_VERSION {
            return Err(VaultError::InvalidVaultFormat(format!(
                "unsupported version {version}, expected {CURRENT_VERSION}"
            )));
        }

        let params = Argon2Params {
            memory_kib: read_u32(&data[5..9]),
            iterations: read_u32(&data[9..13]),
            parallelism: read_u32(&data[13..17]),
        };
        if !params.within_limits() {
            return Err(VaultError::InvalidVaultFormat(format!(
                "Argon2 parameters out of range (memory_kib {} / {MAX_MEMORY_KIB}, \
                 iterations {} / {MAX_ITERATIONS}, parallelism {} / {MAX_PARALLELISM})",
                params.memory_kib, params.iterations, params.parallelism
            )));
        }
        let salt = &data[PREFIX_LEN..HEADER_LEN];

        let key = Zeroizing::new(derive_key(master.as_bytes(), salt, &params)?);
        decrypt(key.as_slice(), &data[HEADER_LEN..])
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

impl CipherTransform for SealedCipher {
    fn transform(
        &self,
        direction: Direction,
        master: &str,
        input: &mut (dyn Read + Send),
        output: &mut (dyn Write + Send),
    ) -> Result<()> {
        let mut data = Zeroizing::new(Vec::new());
        input.read_to_end(&mut data)?;

        match direction {
            Direction::Encrypt => {
                let sealed = self.seal(master, &data)?;
                output.write_all(&sealed).map_err(write_error)?;
            }
            Direction::Decrypt => {
                let plaintext = Self::open(master, &data)?;
                output.write_all(&plaintext).map_err(write_error)?;
            }
        }
        output.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "sealed"
    }
}
