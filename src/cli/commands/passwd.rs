//! `vaultgate passwd`: change the vault master password.

use crate::cli::output;
use crate::cli::{load_settings, open_service, prompt_new_master, Cli, NEW_MASTER_ENV};
use crate::errors::Result;

/// Execute the `passwd` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;

    // 1. Open the vault with the current password.
    let service = open_service(cli, &settings)?;

    // 2. Re-key and save under the new password.
    output::info("Choose your new vault password.");
    let new_master = prompt_new_master(NEW_MASTER_ENV)?;
    service.set_master(&new_master)?;
    service.close(true)?;

    output::success("Master password changed.");
    Ok(())
}
