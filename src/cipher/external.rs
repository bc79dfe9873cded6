//! A cipher transform backed by an external process.
//!
//! The plaintext goes in on the child's stdin and comes out on its
//! stdout (or the other way round for decryption).  Feeding and
//! draining run on two scoped threads: with only one of them, a child
//! that fills its stdout pipe before we finish writing its stdin would
//! deadlock both processes.  The master secret reaches the child
//! through the `VAULT_MASTER` environment variable, never argv.

use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread;

use super::{write_error, CipherTransform, Direction};
use crate::errors::{Result, VaultError};

/// Environment variable the child reads the master secret from.
pub const MASTER_ENV: &str = "VAULT_MASTER";

/// An external program plus the arguments for each direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCipher {
    program: String,
    encrypt_args: Vec<String>,
    decrypt_args: Vec<String>,
}

impl ExternalCipher {
    pub fn new(
        program: impl Into<String>,
        encrypt_args: Vec<String>,
        decrypt_args: Vec<String>,
    ) -> Self {
        Self {
            program: program.into(),
            encrypt_args,
            decrypt_args,
        }
    }

    /// `openssl <cipher> [-d] -a -pbkdf2 -pass env:VAULT_MASTER`
    pub fn openssl(program: &str, cipher: &str) -> Self {
        let pass = format!("env:{MASTER_ENV}");
        let common = ["-a", "-pbkdf2", "-pass", pass.as_str()];

        let mut encrypt_args = vec![cipher.to_string()];
        encrypt_args.extend(common.iter().map(|s| s.to_string()));

        let mut decrypt_args = vec![cipher.to_string(), "-d".to_string()];
        decrypt_args.extend(common.iter().map(|s| s.to_string()));

        Self::new(program, encrypt_args, decrypt_args)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::Encrypt => &self.encrypt_args,
            Direction::Decrypt => &self.decrypt_args,
        }
    }
}

impl CipherTransform for ExternalCipher {
    fn transform(
        &self,
        direction: Direction,
        master: &str,
        input: &mut (dyn Read + Send),
        output: &mut (dyn Write + Send),
    ) -> Result<()> {
        tracing::debug!(program = %self.program, ?direction, "spawning cipher");

        let mut child = Command::new(&self.program)
            .args(self.args(direction))
            .env(MASTER_ENV, master)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| VaultError::TransformSpawn {
                program: self.program.clone(),
                source,
            })?;

        let (Some(mut stdin), Some(mut stdout), Some(mut stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VaultError::Io(io::Error::other("cipher pipes were not captured")));
        };

        let (fed, drained, errput) = thread::scope(|s| {
            let feeder = s.spawn(move || {
                let copied = io::copy(input, &mut stdin);
                // Closing stdin is what tells the child the input is over.
                drop(stdin);
                copied
            });
            let diagnostics = s.spawn(move || {
                let mut buf = Vec::new();
                stderr.read_to_end(&mut buf).map(|_| buf)
            });

            let drained = io::copy(&mut stdout, output);
            if drained.is_err() {
                // Nobody reads the child's output any more; stop it so the feeder unblocks.
                let _ = child.kill();
            }

            (
                join(feeder, "feeder"),
                drained,
                join(diagnostics, "stderr reader"),
            )
        });

        let status = child.wait()?;
        tracing::debug!(program = %self.program, %status, "cipher exited");

        if !status.success() {
            let stderr = errput
                .ok()
                .map(|buf| String::from_utf8_lossy(&buf).trim().to_string())
                .filter(|s| !s.is_empty())
                .map(|s| format!(": {s}"))
                .unwrap_or_default();
            return Err(VaultError::TransformFailed {
                program: self.program.clone(),
                status: status.to_string(),
                stderr,
            });
        }

        fed.map_err(write_error)?;
        drained.map_err(write_error)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.program
    }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, io::Result<T>>, what: &str) -> io::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other(format!("cipher {what} thread panicked"))))
}
