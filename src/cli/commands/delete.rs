//! `vaultgate delete`: tombstone a record so merges carry the deletion.

use crate::cli::output;
use crate::cli::{confirm, load_settings, open_service, Cli};
use crate::errors::Result;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, name: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force && !confirm(&format!("Delete '{name}'?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    let settings = load_settings(cli)?;
    let service = open_service(cli, &settings)?;
    service.delete(name)?;
    service.close(true)?;

    output::success(&format!("Deleted '{name}'"));
    Ok(())
}
