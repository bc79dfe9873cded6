//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::service::VaultService;

/// Minimum length for a freshly chosen master password.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable holding the master password (CI/CD).
pub const MASTER_ENV: &str = "VAULTGATE_MASTER";

/// Environment variable holding the new master password for `passwd`.
pub const NEW_MASTER_ENV: &str = "VAULTGATE_NEW_MASTER";

/// Environment variable holding the peer's master password for `merge`.
pub const MERGE_MASTER_ENV: &str = "VAULTGATE_MERGE_MASTER";

/// vaultgate: a mergeable, versioned password vault.
#[derive(Parser)]
#[command(
    name = "vaultgate",
    about = "Mergeable, versioned password vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding vaultgate.toml and the vault (default: .vaultgate)
    #[arg(long, default_value = ".vaultgate", global = true)]
    pub config: PathBuf,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Init,

    /// Print a secret
    Get {
        /// Record name
        name: String,
    },

    /// Store a secret, generated unless --prompt is given
    Set {
        /// Record name
        name: String,

        /// Read the secret from stdin or an interactive prompt
        #[arg(long, conflicts_with = "recipe")]
        prompt: bool,

        /// Recipe to generate the secret from (e.g. 16an+2s)
        #[arg(short, long)]
        recipe: Option<String>,
    },

    /// List record names
    List {
        /// Regular expression names must match
        #[arg(default_value = output::MATCH_ALL)]
        filter: String,

        /// Show the version counters of each record
        #[arg(short, long)]
        long: bool,
    },

    /// Remove a record from this vault only
    Unset {
        /// Record name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete a record everywhere this vault is merged
    Delete {
        /// Record name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Merge another vault file into this one
    Merge {
        /// Path of the other vault
        path: PathBuf,
    },

    /// Change the vault's master password
    Passwd,

    /// Print a generated password without touching the vault
    Generate {
        /// Recipe to generate from (default: from vaultgate.toml)
        recipe: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Read a password from `env_var`, falling back to an interactive prompt.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_secret(env_var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    // 1. Check the environment variable first (CI/CD friendly).
    if let Ok(pw) = std::env::var(env_var) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    // 2. Fall back to interactive prompt.
    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// The vault's master password.
pub fn prompt_master() -> Result<Zeroizing<String>> {
    prompt_secret(MASTER_ENV, "Enter vault password")
}

/// Prompt for a new password with confirmation (`init`, `passwd`).
///
/// Also respects `env_var` for scripted/CI usage.
/// Enforces a minimum password length.
pub fn prompt_new_master(env_var: &str) -> Result<Zeroizing<String>> {
    // Check the environment variable first (CI/CD friendly).
    if let Ok(pw) = std::env::var(env_var) {
        if !pw.is_empty() {
            if pw.len() < MIN_PASSWORD_LEN {
                return Err(VaultError::CommandFailed(format!(
                    "password must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose vault password")
            .with_confirmation(
                "Confirm vault password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Ask a yes/no question, defaulting to no.
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))
}

/// Load the settings from the `--config` directory.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    Settings::load(&cli.config)
}

/// Build the service for the configured vault and open it with the
/// master password, warning about any records that had to be skipped.
pub fn open_service(cli: &Cli, settings: &Settings) -> Result<VaultService> {
    let service = VaultService::from_settings(settings, &cli.config);
    let master = prompt_master()?;
    service.open(&master)?;

    for rejected in service.rejected_lines() {
        let err = VaultError::from(rejected);
        output::warning(&format!("Skipped: {err}"));
    }
    Ok(service)
}
