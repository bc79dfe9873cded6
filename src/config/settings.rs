use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cipher::{CipherSpec, ExternalCipher, SealedCipher};
use crate::crypto::kdf::Argon2Params;
use crate::errors::{Result, VaultError};
use crate::vault::RecordFormat;

/// Which transform encrypts the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherKind {
    /// Pipe through the `openssl enc` command.
    #[default]
    Openssl,
    /// In-process Argon2id + AES-256-GCM.
    Sealed,
}

/// Vault configuration, loaded from `vaultgate.toml`.
///
/// Every field has a sensible default so vaultgate works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Vault file, relative to the config directory.
    #[serde(default = "default_vault_file")]
    pub vault_file: String,

    #[serde(default)]
    pub cipher: CipherKind,

    /// Program run for the `openssl` cipher.
    #[serde(default = "default_openssl_program")]
    pub openssl_program: String,

    /// Cipher name handed to `openssl enc`.
    #[serde(default = "default_openssl_cipher")]
    pub openssl_cipher: String,

    #[serde(default)]
    pub record_format: RecordFormat,

    /// Recipe used by `set --recipe` and `generate` when none is given.
    #[serde(default = "default_recipe")]
    pub default_recipe: String,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_file() -> String {
    "vault".to_string()
}

fn default_openssl_program() -> String {
    "openssl".to_string()
}

fn default_openssl_cipher() -> String {
    "aes-256-cbc".to_string()
}

fn default_recipe() -> String {
    "16an+2s".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_file: default_vault_file(),
            cipher: CipherKind::default(),
            openssl_program: default_openssl_program(),
            openssl_cipher: default_openssl_cipher(),
            record_format: RecordFormat::default(),
            default_recipe: default_recipe(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the config directory.
    pub const FILE_NAME: &'static str = "vaultgate.toml";

    /// Load settings from `<dir>/vaultgate.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Full path to the vault file.
    ///
    /// Example: `<dir>/vault`
    pub fn vault_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.vault_file)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    /// The transform the configured cipher stands for.
    pub fn cipher_spec(&self) -> CipherSpec {
        match self.cipher {
            CipherKind::Openssl => CipherSpec::External(ExternalCipher::openssl(
                &self.openssl_program,
                &self.openssl_cipher,
            )),
            CipherKind::Sealed => CipherSpec::Sealed(SealedCipher::new(self.argon2_params())),
        }
    }

    pub fn record_format(&self) -> RecordFormat {
        self.record_format
    }
}

// ── Tests ────────────────────────────────────────────────────────────
