//! Plaintext line format of a vault, before encryption.
//!
//! Every record is one newline-terminated line of colon-separated fields:
//!
//! ```text
//! legacy:  name:add_count:del_count:secret
//! salted:  name:base64(salt):add_count:del_count:secret
//! ```
//!
//! The secret is the remainder of the line, so it may contain colons
//! but never a newline.  The format is chosen once per vault.

use std::fmt::Write as _;
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::record::Record;
use crate::errors::{Result, VaultError};

/// Which line layout a vault uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// `name:add:del:secret`
    #[default]
    Legacy,
    /// `name:salt:add:del:secret`, every record carrying its own random salt.
    Salted,
}

/// A persisted line that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// 1-based line number in the decrypted stream.
    pub line: usize,
    pub reason: String,
}

impl From<LineError> for VaultError {
    fn from(e: LineError) -> Self {
        VaultError::MalformedLine {
            line: e.line,
            reason: e.reason,
        }
    }
}

/// Records parsed from a decrypted stream, plus the lines that were skipped.
#[derive(Debug, Default)]
pub struct Decoded {
    pub records: Vec<Record>,
    pub rejected: Vec<LineError>,
}

fn legacy_decoder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<name>[^:]+):(?P<add>[0-9]+):(?P<del>[0-9]+):(?P<secret>.*)$")
            .unwrap_or_else(|e| unreachable!("legacy decoder pattern: {e}"))
    })
}

fn salted_decoder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<name>[^:]+):(?P<salt>[^:]+):(?P<add>[0-9]+):(?P<del>[0-9]+):(?P<secret>.*)$",
        )
        .unwrap_or_else(|e| unreachable!("salted decoder pattern: {e}"))
    })
}

impl RecordFormat {
    /// Append the encoded line for `record` to `out`.
    pub fn encode_into(self, record: &Record, out: &mut String) {
        // Writing into a String cannot fail.
        let _ = match self {
            RecordFormat::Legacy => writeln!(
                out,
                "{}:{}:{}:{}",
                record.name(),
                record.add_count(),
                record.del_count(),
                record.stored_secret()
            ),
            RecordFormat::Salted => writeln!(
                out,
                "{}:{}:{}:{}:{}",
                record.name(),
                BASE64.encode(record.salt().unwrap_or_default()),
                record.add_count(),
                record.del_count(),
                record.stored_secret()
            ),
        };
    }

    /// Serialize every record, sorted by name for a stable output.
    pub fn encode_all<'a, I>(self, records: I) -> Zeroizing<String>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut sorted: Vec<&Record> = records.into_iter().collect();
        sorted.sort_by(|a, b| a.name().cmp(b.name()));

        let mut out = Zeroizing::new(String::new());
        for record in sorted {
            self.encode_into(record, &mut out);
        }
        out
    }

    /// Parse a single non-empty line.
    pub fn decode_line(self, line: &str) -> std::result::Result<Record, String> {
        let decoder = match self {
            RecordFormat::Legacy => legacy_decoder(),
            RecordFormat::Salted => salted_decoder(),
        };
        let caps = decoder
            .captures(line)
            .ok_or_else(|| format!("line does not match the {} layout", self.label()))?;

        let name = group(&caps, "name").to_string();
        let add_count = parse_count(&caps, "add")?;
        let del_count = parse_count(&caps, "del")?;
        let secret = group(&caps, "secret").to_string();
        let salt = match self {
            RecordFormat::Legacy => None,
            RecordFormat::Salted => Some(
                BASE64
                    .decode(group(&caps, "salt"))
                    .map_err(|e| format!("bad salt: {e}"))?,
            ),
        };

        Ok(Record::from_parts(name, secret, add_count, del_count, salt))
    }

    /// Parse a whole decrypted stream.
    ///
    /// Bad lines are collected in `rejected` and parsing carries on with
    /// the next one.
    pub fn decode_all(self, plaintext: &str) -> Decoded {
        let mut decoded = Decoded::default();
        for (idx, line) in plaintext.split('\n').enumerate() {
            if line.is_empty() {
                continue;
            }
            match self.decode_line(line) {
                Ok(record) => decoded.records.push(record),
                Err(reason) => decoded.rejected.push(LineError {
                    line: idx + 1,
                    reason,
                }),
            }
        }
        decoded
    }

    fn label(self) -> &'static str {
        match self {
            RecordFormat::Legacy => "legacy",
            RecordFormat::Salted => "salted",
        }
    }
}

fn group<'h>(caps: &Captures<'h>, name: &str) -> &'h str {
    caps.name(name).map_or("", |m| m.as_str())
}

/// Counters stop one short of `u64::MAX` so a delete can always step past them.
fn parse_count(caps: &Captures<'_>, name: &str) -> std::result::Result<u64, String> {
    group(caps, name)
        .parse::<u64>()
        .map_err(|e| format!("bad {name} counter: {e}"))
        .and_then(|n| match n {
            u64::MAX => Err(format!("{name} counter out of range")),
            n => Ok(n),
        })
}

/// Validate a key name before it enters the map.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(':') || name.contains('\n') {
        return Err(VaultError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Validate a secret before it enters the map.
pub fn validate_secret(name: &str, secret: &str) -> Result<()> {
    if secret.contains('\n') {
        return Err(VaultError::InvalidSecret(name.to_string()));
    }
    Ok(())
}
