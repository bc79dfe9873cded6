//! `vaultgate generate`: print a password without opening the vault.

use crate::cli::{load_settings, Cli};
use crate::crypto::OsRandom;
use crate::errors::Result;
use crate::generator;

/// Execute the `generate` command.
pub fn execute(cli: &Cli, recipe: Option<&str>) -> Result<()> {
    let settings = load_settings(cli)?;
    let recipe = recipe.unwrap_or(settings.default_recipe.as_str());

    let password = generator::generate(recipe, "", &mut OsRandom)?;
    println!("{}", password.as_str());
    Ok(())
}
