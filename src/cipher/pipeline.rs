//! Ciphertext <-> records.
//!
//! `decode` pipes the backing bytes through the decrypt direction of a
//! transform and parses the plaintext lines; `encode` does the reverse.
//! Plaintext only ever lives in zeroizing memory buffers.

use std::io::{Read, Write};

use zeroize::Zeroizing;

use super::{CipherTransform, Direction};
use crate::errors::{Result, VaultError};
use crate::vault::format::{Decoded, RecordFormat};
use crate::vault::record::Record;

/// Decrypt `source` and parse it into records.
///
/// A transform failure aborts with nothing returned.  Lines that do not
/// parse are reported in `Decoded::rejected` and the rest are kept.
pub fn decode(
    cipher: &dyn CipherTransform,
    master: &str,
    format: RecordFormat,
    source: &mut (dyn Read + Send),
) -> Result<Decoded> {
    let mut plaintext = Zeroizing::new(Vec::new());
    cipher.transform(Direction::Decrypt, master, source, &mut *plaintext)?;

    let text = std::str::from_utf8(&plaintext).map_err(|e| {
        VaultError::InvalidVaultFormat(format!("decrypted vault is not UTF-8: {e}"))
    })?;

    let decoded = format.decode_all(text);
    tracing::debug!(
        cipher = cipher.name(),
        records = decoded.records.len(),
        rejected = decoded.rejected.len(),
        "decoded vault"
    );
    Ok(decoded)
}

/// Serialize `records` and encrypt them into `sink`.
pub fn encode<'a, I>(
    cipher: &dyn CipherTransform,
    master: &str,
    format: RecordFormat,
    records: I,
    sink: &mut (dyn Write + Send),
) -> Result<()>
where
    I: IntoIterator<Item = &'a Record>,
{
    let plaintext = format.encode_all(records);
    let mut input: &[u8] = plaintext.as_bytes();
    cipher.transform(Direction::Encrypt, master, &mut input, sink)?;
    tracing::debug!(cipher = cipher.name(), bytes = plaintext.len(), "encoded vault");
    Ok(())
}
