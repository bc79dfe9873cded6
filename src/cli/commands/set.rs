//! `vaultgate set`: store a generated or typed secret.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{load_settings, open_service, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `set` command.
///
/// Without `--prompt` the secret is generated from `recipe`, or from the
/// configured default recipe.
pub fn execute(cli: &Cli, name: &str, prompt: bool, recipe: Option<&str>) -> Result<()> {
    let settings = load_settings(cli)?;

    // Read a typed secret before the vault password so piped input goes
    // to the secret.
    let typed = if prompt { Some(read_secret(name)?) } else { None };
    let recipe = match typed {
        Some(_) => None,
        None => Some(recipe.unwrap_or(settings.default_recipe.as_str())),
    };

    let service = open_service(cli, &settings)?;
    let stored = service.set(name, typed.as_ref().map(|s| s.as_str()), recipe)?;
    service.close(true)?;

    match recipe {
        Some(recipe) => {
            output::success(&format!("Generated a new secret for '{name}' ({recipe})"));
            println!("{}", stored.as_str());
        }
        None => output::success(&format!("Stored secret for '{name}'")),
    }

    Ok(())
}

/// Read the secret from stdin when piped, else from a hidden prompt.
fn read_secret(name: &str) -> Result<Zeroizing<String>> {
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim_end_matches(['\r', '\n']);
        return Ok(Zeroizing::new(trimmed.to_string()));
    }

    let secret = dialoguer::Password::new()
        .with_prompt(format!("Enter secret for {name}"))
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(secret))
}
