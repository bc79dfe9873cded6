//! `vaultgate merge`: fold another copy of the vault into this one.

use std::path::Path;

use crate::cli::output;
use crate::cli::{load_settings, open_service, prompt_secret, Cli, MERGE_MASTER_ENV};
use crate::errors::Result;

/// Execute the `merge` command.
pub fn execute(cli: &Cli, path: &Path) -> Result<()> {
    let settings = load_settings(cli)?;
    let service = open_service(cli, &settings)?;

    let before = service.list(".*")?.len();
    let peer_master = prompt_secret(
        MERGE_MASTER_ENV,
        &format!("Enter password for {}", path.display()),
    )?;
    service.merge(path, &peer_master)?;
    let after = service.list(".*")?.len();
    service.close(true)?;

    output::success(&format!(
        "Merged {} ({before} -> {after} live record(s))",
        path.display()
    ));
    Ok(())
}
