//! `vaultgate init`: create a new, empty vault.

use std::fs;

use crate::cipher::CipherTransform;
use crate::cli::output;
use crate::cli::{load_settings, prompt_new_master, Cli, MASTER_ENV};
use crate::errors::{Result, VaultError};
use crate::service::VaultService;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let vault_path = settings.vault_path(&cli.config);

    // 1. Create the vault directory if it doesn't exist.
    if let Some(dir) = vault_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            output::info(&format!("Created vault directory: {}", dir.display()));
        }
    }

    // 2. Refuse to clobber an existing vault before asking for a password.
    if vault_path.exists() {
        output::tip("Use `vaultgate set` to add records to the existing vault.");
        return Err(VaultError::VaultAlreadyExists(vault_path));
    }

    // 3. Prompt for a new password (with confirmation) and write the empty vault.
    let master = prompt_new_master(MASTER_ENV)?;
    let service = VaultService::from_settings(&settings, &cli.config);
    service.create(&master)?;
    service.close(false)?;

    output::success(&format!(
        "Vault created at {} ({} cipher)",
        vault_path.display(),
        settings.cipher_spec().name()
    ));
    output::tip("Run `vaultgate set <NAME>` to generate and store a password.");
    output::tip("Run `vaultgate list` to see all records.");

    Ok(())
}
