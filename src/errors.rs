use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in vaultgate.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Precondition errors ---
    #[error("Vault is not open: cannot {0}")]
    NotOpen(&'static str),

    #[error("Vault is already open: cannot open")]
    AlreadyOpen,

    #[error("Empty master not allowed")]
    EmptyMaster,

    #[error("Service is stopped")]
    Stopped,

    // --- Lookup errors ---
    #[error("Unknown key: {0}")]
    RecordNotFound(String),

    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    // --- Validation errors ---
    #[error("Invalid key name '{0}': names must be non-empty and cannot contain ':' or newlines")]
    InvalidName(String),

    #[error("Invalid secret for '{0}': secrets cannot contain newlines")]
    InvalidSecret(String),

    #[error("Invalid list filter: {0}")]
    InvalidFilter(#[from] regex::Error),

    #[error("Nothing to set for '{0}': give either a secret or a recipe")]
    MissingSecret(String),

    // --- Decode errors ---
    #[error("Malformed record on line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    // --- Generator errors ---
    #[error("Invalid recipe at {index}: {message}")]
    Recipe { index: usize, message: String },

    #[error("Random source exhausted: needed {needed} bytes, got {got}")]
    RandomExhausted { needed: usize, got: usize },

    #[error("Random source error: {0}")]
    RandomSource(String),

    // --- Transform errors ---
    #[error("Failed to start cipher '{program}': {source}")]
    TransformSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cipher '{program}' failed ({status}){stderr}")]
    TransformFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Incomplete write to the cipher transform")]
    IncompleteWrite,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — wrong master or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Invalid vault format: {0}")]
    InvalidVaultFormat(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Convenience type alias for vaultgate results.
pub type Result<T> = std::result::Result<T, VaultError>;
