//! Cryptographic primitives for vaultgate.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - Argon2id password-based key derivation (`kdf`)
//! - The injectable secure random source (`random`)

pub mod encryption;
pub mod kdf;
pub mod random;

pub use encryption::{decrypt, encrypt};
pub use kdf::{derive_key, generate_salt, Argon2Params};
pub use random::{OsRandom, RandomSource, ScriptedRandom};
