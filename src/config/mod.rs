//! Configuration loaded from `vaultgate.toml`.

pub mod settings;

pub use settings::{CipherKind, Settings};
