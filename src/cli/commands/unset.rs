//! `vaultgate unset`: purge a record from this vault only.
//!
//! Unlike `delete`, nothing is left behind for a merge to carry over,
//! so a peer that still has the record will bring it back.

use crate::cli::output;
use crate::cli::{confirm, load_settings, open_service, Cli};
use crate::errors::Result;

/// Execute the `unset` command.
pub fn execute(cli: &Cli, name: &str, force: bool) -> Result<()> {
    if !force && !confirm(&format!("Remove '{name}' from this vault?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    let settings = load_settings(cli)?;
    let service = open_service(cli, &settings)?;
    service.unset(name)?;
    service.close(true)?;

    output::success(&format!("Removed '{name}'"));
    Ok(())
}
