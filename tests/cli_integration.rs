//! Integration tests for the vaultgate CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Passwords come from `VAULTGATE_MASTER` (and friends) so nothing
//! prompts, and every vault uses the sealed cipher with cheap Argon2
//! settings so the tests do not depend on openssl.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const MASTER: &str = "correct-horse";

/// Helper: get a Command pointing at the vaultgate binary.
fn vaultgate() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("vaultgate").expect("binary should exist")
}

/// A temp dir holding a config that selects the fast sealed cipher.
fn config_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child("vaultgate.toml")
        .write_str(
            "cipher = \"sealed\"\n\
             argon2_memory_kib = 8192\n\
             argon2_iterations = 1\n\
             argon2_parallelism = 1\n",
        )
        .unwrap();
    tmp
}

/// A command against the vault in `dir`, unlocked with `MASTER`.
fn run_in(dir: &TempDir) -> Command {
    let mut cmd = vaultgate();
    cmd.arg("--config")
        .arg(dir.path())
        .env("VAULTGATE_MASTER", MASTER)
        .env_remove("VAULTGATE_LOG");
    cmd
}

/// A config dir with an initialised vault.
fn initialised() -> TempDir {
    let dir = config_dir();
    run_in(&dir).arg("init").assert().success();
    dir
}

fn set(dir: &TempDir, name: &str, secret: &str) {
    run_in(dir)
        .args(["set", name, "--prompt"])
        .write_stdin(format!("{secret}\n"))
        .assert()
        .success();
}

#[test]
fn help_flag_shows_usage() {
    vaultgate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("password vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("unset"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("merge"))
        .stdout(predicate::str::contains("passwd"))
        .stdout(predicate::str::contains("generate"));
}

#[test]
fn version_flag_shows_version() {
    vaultgate()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vaultgate"));
}

#[test]
fn no_args_shows_help() {
    vaultgate()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn init_creates_the_vault_file() {
    let dir = initialised();
    dir.child("vault").assert(predicate::path::exists());
}

#[test]
fn init_twice_fails() {
    let dir = initialised();
    run_in(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_rejects_short_passwords() {
    let dir = config_dir();
    vaultgate()
        .arg("--config")
        .arg(dir.path())
        .env("VAULTGATE_MASTER", "short")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8"));
    dir.child("vault").assert(predicate::path::missing());
}

#[test]
fn get_on_missing_vault_fails() {
    let dir = config_dir();
    run_in(&dir)
        .args(["get", "mail"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn set_prompt_then_get() {
    let dir = initialised();
    set(&dir, "mail", "p:a:s:s");
    run_in(&dir)
        .args(["get", "mail"])
        .assert()
        .success()
        .stdout("p:a:s:s\n");
}

#[test]
fn set_generates_from_a_recipe() {
    let dir = initialised();
    let out = run_in(&dir)
        .args(["set", "bank", "--recipe", "20n"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let printed = String::from_utf8(out).unwrap();
    let generated = printed.lines().last().unwrap().to_string();
    assert_eq!(generated.len(), 20);
    assert!(generated.chars().all(|c| c.is_ascii_digit()));

    run_in(&dir)
        .args(["get", "bank"])
        .assert()
        .success()
        .stdout(format!("{generated}\n"));
}

#[test]
fn set_with_a_bad_recipe_fails() {
    let dir = initialised();
    run_in(&dir)
        .args(["set", "bank", "--recipe", "4q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid recipe at 1"));
}

#[test]
fn get_with_wrong_password_fails() {
    let dir = initialised();
    vaultgate()
        .arg("--config")
        .arg(dir.path())
        .env("VAULTGATE_MASTER", "not-the-password")
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Decryption failed"));
}

#[test]
fn list_filters_and_sorts() {
    let dir = initialised();
    set(&dir, "gamma", "3");
    set(&dir, "alpha", "1");
    set(&dir, "abeta", "2");

    run_in(&dir)
        .args(["list", "^a"])
        .assert()
        .success()
        .stdout("abeta\nalpha\n");
}

#[test]
fn list_long_shows_counters() {
    let dir = initialised();
    set(&dir, "mail", "one");
    set(&dir, "mail", "two");

    run_in(&dir)
        .args(["list", "--long"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sets"))
        .stdout(predicate::str::contains("mail"))
        .stdout(predicate::str::contains("2"));
}

#[test]
fn list_long_on_an_empty_vault_says_so() {
    let dir = initialised();
    run_in(&dir)
        .args(["list", "--long"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The vault has no live records"));

    set(&dir, "mail", "m");
    run_in(&dir)
        .args(["list", "^bank", "--long"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No live records match '^bank'"));
}

#[test]
fn unreadable_lines_are_reported_and_skipped() {
    use vaultgate::cipher::{CipherTransform, Direction, SealedCipher};
    use vaultgate::crypto::kdf::MIN_MEMORY_KIB;
    use vaultgate::crypto::Argon2Params;

    let dir = config_dir();
    let cipher = SealedCipher::new(Argon2Params {
        memory_kib: MIN_MEMORY_KIB,
        iterations: 1,
        parallelism: 1,
    });
    let mut plaintext: &[u8] = b"good:1:0:x\nbroken\n";
    let mut sealed = Vec::new();
    cipher
        .transform(Direction::Encrypt, MASTER, &mut plaintext, &mut sealed)
        .unwrap();
    dir.child("vault").write_binary(&sealed).unwrap();

    run_in(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout("good\n")
        .stderr(predicate::str::contains("Malformed record on line 2"));
}

#[test]
fn recipes_past_the_length_cap_are_refused() {
    let dir = config_dir();
    vaultgate()
        .arg("--config")
        .arg(dir.path())
        .args(["generate", "4097a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("quantity too large"));
}

#[test]
fn delete_hides_the_record() {
    let dir = initialised();
    set(&dir, "old", "x");
    run_in(&dir)
        .args(["delete", "old", "--force"])
        .assert()
        .success();

    run_in(&dir).args(["list"]).assert().success().stdout("");
    run_in(&dir)
        .args(["get", "old"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key: old"));
}

#[test]
fn unset_unknown_name_fails() {
    let dir = initialised();
    run_in(&dir)
        .args(["unset", "ghost", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key: ghost"));
}

#[test]
fn merge_carries_deletions_but_not_unsets() {
    let dir = initialised();
    set(&dir, "deleted", "d");
    set(&dir, "unset", "u");

    // Snapshot the vault as the peer, then remove both records locally.
    let peer = dir.child("peer.vault");
    std::fs::copy(dir.child("vault").path(), peer.path()).unwrap();
    run_in(&dir)
        .args(["delete", "deleted", "--force"])
        .assert()
        .success();
    run_in(&dir)
        .args(["unset", "unset", "--force"])
        .assert()
        .success();

    run_in(&dir)
        .arg("merge")
        .arg(peer.path())
        .env("VAULTGATE_MERGE_MASTER", MASTER)
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged"));

    run_in(&dir).args(["list"]).assert().success().stdout("unset\n");
}

#[test]
fn passwd_rekeys_the_vault() {
    let dir = initialised();
    set(&dir, "mail", "m");

    run_in(&dir)
        .arg("passwd")
        .env("VAULTGATE_NEW_MASTER", "battery-staple")
        .assert()
        .success();

    run_in(&dir).args(["get", "mail"]).assert().failure();
    vaultgate()
        .arg("--config")
        .arg(dir.path())
        .env("VAULTGATE_MASTER", "battery-staple")
        .args(["get", "mail"])
        .assert()
        .success()
        .stdout("m\n");
}

#[test]
fn generate_needs_no_vault() {
    let dir = config_dir();
    vaultgate()
        .arg("--config")
        .arg(dir.path())
        .args(["generate", "12a"])
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[A-Za-z]{12}\n$").unwrap());
}

#[test]
fn generate_uses_the_configured_default_recipe() {
    let dir = config_dir();
    dir.child("vaultgate.toml")
        .write_str("default_recipe = \"6n\"\n")
        .unwrap();
    vaultgate()
        .arg("--config")
        .arg(dir.path())
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[0-9]{6}\n$").unwrap());
}

#[test]
fn bad_config_is_reported() {
    let dir = TempDir::new().unwrap();
    dir.child("vaultgate.toml").write_str("cipher = [").unwrap();
    vaultgate()
        .arg("--config")
        .arg(dir.path())
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file error"));
}
