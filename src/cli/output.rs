//! Styled terminal output for the CLI commands.
//!
//! Results go to stdout, problems to stderr, each behind a colored marker.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::service::RecordInfo;

/// Filter `list` uses when none is given.
pub const MATCH_ALL: &str = ".*";

/// Green check mark, stdout.
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Red cross, stderr.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Yellow warning sign, stderr.
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Dimmed hint after an arrow.
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Message shown by `list --long` when `filter` selected nothing.
pub fn empty_listing(filter: &str) -> String {
    if filter == MATCH_ALL {
        "The vault has no live records.".to_string()
    } else {
        format!("No live records match '{filter}'.")
    }
}

/// Print the live records selected by `filter` with their version counters.
pub fn print_records_table(records: &[RecordInfo], filter: &str) {
    if records.is_empty() {
        info(&empty_listing(filter));
        if filter == MATCH_ALL {
            tip("Run `vaultgate set <NAME>` to add one.");
        } else {
            tip("Run `vaultgate list --long` to see every record.");
        }
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Sets", "Deletes"]);
    for r in records {
        table.add_row(vec![
            r.name.clone(),
            r.add_count.to_string(),
            r.del_count.to_string(),
        ]);
    }

    info(&format!("{} record(s)", records.len()));
    println!("{table}");
}
