//! `vaultgate get`: print a single secret.

use crate::cli::{load_settings, open_service, Cli};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, name: &str) -> Result<()> {
    let settings = load_settings(cli)?;
    let service = open_service(cli, &settings)?;

    let secret = service.get(name)?;
    println!("{}", secret.as_str());

    service.close(false)
}
