//! `vaultgate list`: show the live record names.

use crate::cli::output;
use crate::cli::{load_settings, open_service, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, filter: &str, long: bool) -> Result<()> {
    let settings = load_settings(cli)?;
    let service = open_service(cli, &settings)?;

    if long {
        let records = service.list_details(filter)?;
        output::print_records_table(&records, filter);
    } else {
        for name in service.list(filter)? {
            println!("{name}");
        }
    }

    service.close(false)
}
