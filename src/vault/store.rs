//! The in-memory, versioned record store of one vault.
//!
//! `VaultStore` owns the record map, the dirty flag and the master
//! secret while open.  Loading and saving go through the cipher
//! pipeline; everything else is plain map arithmetic.  A store is
//! single-writer: callers that share one across threads must wrap it
//! in a lock.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use zeroize::Zeroizing;

use crate::cipher::{self, CipherTransform};
use crate::crypto::kdf::generate_salt;
use crate::crypto::random::{OsRandom, RandomSource};
use crate::errors::{Result, VaultError};
use crate::generator::{self, PasswordGenerator};

use super::backing::Backing;
use super::format::{validate_name, validate_secret, LineError, RecordFormat};
use super::record::Record;

/// The main vault handle.  Build one with `VaultStore::new`, then
/// `open` (or `create`) it with the master secret.
pub struct VaultStore {
    /// Where the ciphertext lives.
    backing: Box<dyn Backing>,

    /// The transform records are piped through.
    cipher: Arc<dyn CipherTransform>,

    /// Line layout, fixed for the lifetime of the vault.
    format: RecordFormat,

    /// name -> record, tombstones included.
    records: HashMap<String, Record>,

    /// True when the records differ from what was last saved.
    dirty: bool,

    open: bool,

    /// Held only while open; wiped on close and on drop.
    master: Zeroizing<String>,

    generator: PasswordGenerator,

    random: Box<dyn RandomSource>,

    /// Lines skipped by the last `open`.
    rejected: Vec<LineError>,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// A closed store over `backing`, using the legacy line format and
    /// the OS random source.
    pub fn new(backing: Box<dyn Backing>, cipher: Arc<dyn CipherTransform>) -> Self {
        Self {
            backing,
            cipher,
            format: RecordFormat::default(),
            records: HashMap::new(),
            dirty: false,
            open: false,
            master: Zeroizing::new(String::new()),
            generator: PasswordGenerator::new(),
            random: Box::new(OsRandom),
            rejected: Vec::new(),
        }
    }

    pub fn with_format(mut self, format: RecordFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_random(mut self, random: Box<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// A closed store over another backing that shares this store's
    /// cipher and format.  Used to open merge peers.
    pub fn sibling(&self, backing: Box<dyn Backing>) -> Self {
        Self::new(backing, Arc::clone(&self.cipher)).with_format(self.format)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Decrypt the backing and load its records.
    ///
    /// On any failure the store stays closed and empty.
    pub fn open(&mut self, master: &str) -> Result<()> {
        if self.open {
            return Err(VaultError::AlreadyOpen);
        }

        let mut source = self.backing.source()?;
        let decoded = cipher::decode(self.cipher.as_ref(), master, self.format, source.as_mut())?;

        for rejected in &decoded.rejected {
            tracing::warn!(
                vault = %self.backing.describe(),
                line = rejected.line,
                reason = %rejected.reason,
                "skipping malformed record"
            );
        }

        self.records = decoded
            .records
            .into_iter()
            .map(|r| (r.name().to_string(), r))
            .collect();
        self.rejected = decoded.rejected;
        self.master = Zeroizing::new(master.to_string());
        self.dirty = false;
        self.open = true;

        tracing::debug!(
            vault = %self.backing.describe(),
            records = self.records.len(),
            "vault opened"
        );
        Ok(())
    }

    /// Start a brand-new, empty vault and save it straight away.
    pub fn create(&mut self, master: &str) -> Result<()> {
        if self.open {
            return Err(VaultError::AlreadyOpen);
        }
        if master.is_empty() {
            return Err(VaultError::EmptyMaster);
        }
        if self.backing.exists() {
            return Err(VaultError::VaultAlreadyExists(self.backing.describe().into()));
        }

        self.records.clear();
        self.rejected.clear();
        self.master = Zeroizing::new(master.to_string());
        self.open = true;
        self.dirty = true;

        if let Err(e) = self.save(false) {
            self.wipe();
            return Err(e);
        }
        tracing::debug!(vault = %self.backing.describe(), "vault created");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Close the vault, saving first when `persist` is set.
    ///
    /// Records and master are wiped even when the save fails; the save
    /// error is still returned.
    pub fn close(&mut self, persist: bool) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        let saved = if persist { self.save(false) } else { Ok(()) };
        self.wipe();
        tracing::debug!(vault = %self.backing.describe(), persisted = persist, "vault closed");
        saved
    }

    fn wipe(&mut self) {
        self.records = HashMap::new();
        self.master = Zeroizing::new(String::new());
        self.rejected.clear();
        self.dirty = false;
        self.open = false;
    }

    // ------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------

    /// The record called `name`, tombstone or not.
    pub fn get(&self, name: &str) -> Result<&Record> {
        self.require_open("get")?;
        self.records
            .get(name)
            .ok_or_else(|| VaultError::RecordNotFound(name.to_string()))
    }

    /// Live names matching `filter`, sorted.
    pub fn list(&self, filter: &str) -> Result<Vec<String>> {
        self.require_open("list")?;
        let filter = Regex::new(filter)?;

        let mut names: Vec<String> = self
            .records
            .values()
            .filter(|r| !r.is_deleted() && filter.is_match(r.name()))
            .map(|r| r.name().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Every record, tombstones included, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Add or update a secret.
    pub fn set(&mut self, name: &str, secret: &str) -> Result<()> {
        self.require_open("set")?;
        validate_name(name)?;
        validate_secret(name, secret)?;

        match self.records.get_mut(name) {
            Some(record) => record.set_secret(secret),
            None => {
                let salt = match self.format {
                    RecordFormat::Legacy => None,
                    RecordFormat::Salted => Some(generate_salt(self.random.as_mut())?.to_vec()),
                };
                self.records
                    .insert(name.to_string(), Record::new(name, secret, salt));
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Generate a password from `recipe`, store it under `name`, and return it.
    pub fn set_random(&mut self, name: &str, recipe: &str) -> Result<Zeroizing<String>> {
        self.require_open("set")?;
        validate_name(name)?;
        let recipe = self.generator.recipe(recipe)?;
        let secret = generator::extend(&recipe, "", self.random.as_mut())?;
        self.set(name, &secret)?;
        Ok(secret)
    }

    /// Purge `name` from this vault.  Not replicated by merge.
    pub fn unset(&mut self, name: &str) -> Result<()> {
        self.require_open("unset")?;
        if self.records.remove(name).is_none() {
            return Err(VaultError::RecordNotFound(name.to_string()));
        }
        self.dirty = true;
        Ok(())
    }

    /// Tombstone `name`; the deletion survives merges.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.require_open("delete")?;
        let record = self
            .records
            .get_mut(name)
            .ok_or_else(|| VaultError::RecordNotFound(name.to_string()))?;
        record.delete();
        self.dirty = true;
        Ok(())
    }

    /// Re-key the vault; the next save encrypts under `master`.
    pub fn set_master(&mut self, master: &str) -> Result<()> {
        self.require_open("set master")?;
        if master.is_empty() {
            return Err(VaultError::EmptyMaster);
        }
        self.master = Zeroizing::new(master.to_string());
        self.dirty = true;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Persistence and merge
    // ------------------------------------------------------------------

    /// Encrypt every record to the backing if dirty (or `force`).
    pub fn save(&mut self, force: bool) -> Result<()> {
        self.require_open("save")?;
        if !(self.dirty || force) {
            return Ok(());
        }

        let mut sink = self.backing.sink()?;
        cipher::encode(
            self.cipher.as_ref(),
            &self.master,
            self.format,
            self.records.values(),
            &mut sink,
        )?;
        sink.commit()?;

        self.dirty = false;
        tracing::debug!(
            vault = %self.backing.describe(),
            records = self.records.len(),
            "vault saved"
        );
        Ok(())
    }

    /// Fold `other`'s records into this vault.
    ///
    /// Shared names are merged record by record, names only `other`
    /// knows are copied in, and names only this vault knows are left
    /// alone.
    pub fn merge(&mut self, other: &VaultStore) -> Result<()> {
        self.require_open("merge")?;
        if !other.open {
            return Err(VaultError::NotOpen("merge from"));
        }

        for (name, theirs) in &other.records {
            let record = match self.records.entry(name.clone()) {
                Entry::Occupied(entry) => {
                    let mine = entry.into_mut();
                    mine.merge(theirs);
                    mine
                }
                Entry::Vacant(entry) => entry.insert(theirs.clone()),
            };
            // Salted lines cannot be written without a salt.
            if self.format == RecordFormat::Salted && record.salt().is_none() {
                record.fill_salt(generate_salt(self.random.as_mut())?.to_vec());
            }
        }
        self.dirty = true;
        tracing::debug!(
            vault = %self.backing.describe(),
            peer = %other.backing.describe(),
            records = self.records.len(),
            "vault merged"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// Lines the last `open` had to skip.
    pub fn rejected_lines(&self) -> &[LineError] {
        &self.rejected
    }

    pub fn location(&self) -> String {
        self.backing.describe()
    }

    fn require_open(&self, op: &'static str) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(VaultError::NotOpen(op))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::pipeline::tests::XorCipher;
    use crate::crypto::random::ScriptedRandom;
    use crate::vault::backing::MemoryBacking;

    fn store(backing: &MemoryBacking) -> VaultStore {
        VaultStore::new(Box::new(backing.clone()), Arc::new(XorCipher))
    }

    fn created() -> (MemoryBacking, VaultStore) {
        let backing = MemoryBacking::new();
        let mut s = store(&backing);
        s.create("master").unwrap();
        (backing, s)
    }

    /// A plaintext vault encrypted with `XorCipher` under "master".
    fn backing_with(plaintext: &str) -> MemoryBacking {
        let mut bytes = Vec::new();
        let mut input = plaintext.as_bytes();
        XorCipher
            .transform(cipher::Direction::Encrypt, "master", &mut input, &mut bytes)
            .unwrap();
        MemoryBacking::with_bytes(bytes)
    }

    #[test]
    fn operations_on_a_closed_vault_fail() {
        let mut s = store(&MemoryBacking::new());
        assert!(!s.is_open());
        assert!(matches!(s.get("x"), Err(VaultError::NotOpen(_))));
        assert!(matches!(s.list(".*"), Err(VaultError::NotOpen(_))));
        assert!(matches!(s.set("x", "y"), Err(VaultError::NotOpen(_))));
        assert!(matches!(s.unset("x"), Err(VaultError::NotOpen(_))));
        assert!(matches!(s.save(true), Err(VaultError::NotOpen(_))));
        assert!(matches!(s.set_master("m"), Err(VaultError::NotOpen(_))));
    }

    #[test]
    fn open_missing_vault_stays_closed() {
        let mut s = store(&MemoryBacking::new());
        assert!(matches!(s.open("master"), Err(VaultError::VaultNotFound(_))));
        assert!(!s.is_open());
    }

    #[test]
    fn open_twice_fails() {
        let (_, mut s) = created();
        assert!(matches!(s.open("master"), Err(VaultError::AlreadyOpen)));
    }

    #[test]
    fn wrong_master_leaves_the_store_closed_and_empty() {
        let backing = backing_with("a:1:0:x\n");
        let mut s = store(&backing);
        assert!(s.open("wrong").is_err());
        assert!(!s.is_open());
        assert_eq!(s.records().count(), 0);
    }

    #[test]
    fn open_loads_records_and_reports_bad_lines() {
        let backing = backing_with("a:1:0:x\nb:2:3:y\ngarbage\n");
        let mut s = store(&backing);
        s.open("master").unwrap();
        assert_eq!(s.records().count(), 2);
        assert_eq!(s.get("a").unwrap().secret(), "x");
        assert!(s.get("b").unwrap().is_deleted());
        assert_eq!(s.rejected_lines().len(), 1);
        assert_eq!(s.rejected_lines()[0].line, 3);
        assert!(!s.is_dirty());
    }

    #[test]
    fn create_refuses_existing_vaults_and_empty_masters() {
        let (backing, _) = created();
        let mut again = store(&backing);
        assert!(matches!(
            again.create("master"),
            Err(VaultError::VaultAlreadyExists(_))
        ));
        let mut fresh = store(&MemoryBacking::new());
        assert!(matches!(fresh.create(""), Err(VaultError::EmptyMaster)));
        assert!(!fresh.is_open());
    }

    #[test]
    fn set_then_get() {
        let (_, mut s) = created();
        s.set("mail", "one").unwrap();
        assert_eq!(s.get("mail").unwrap().secret(), "one");
        assert_eq!(s.get("mail").unwrap().add_count(), 1);

        s.set("mail", "two").unwrap();
        let r = s.get("mail").unwrap();
        assert_eq!(r.secret(), "two");
        assert_eq!(r.add_count(), 2);
        assert!(s.is_dirty());
    }

    #[test]
    fn set_rejects_bad_names_and_secrets() {
        let (_, mut s) = created();
        assert!(matches!(s.set("a:b", "x"), Err(VaultError::InvalidName(_))));
        assert!(matches!(s.set("ok", "x\ny"), Err(VaultError::InvalidSecret(_))));
        assert_eq!(s.records().count(), 0);
    }

    #[test]
    fn get_unknown_is_not_found() {
        let (_, s) = created();
        assert!(matches!(s.get("nope"), Err(VaultError::RecordNotFound(_))));
    }

    #[test]
    fn list_filters_sorts_and_hides_tombstones() {
        let (_, mut s) = created();
        s.set("alpha", "1").unwrap();
        s.set("abeta", "2").unwrap();
        s.set("gamma", "3").unwrap();
        s.set("agone", "4").unwrap();
        s.delete("gamma").unwrap();
        s.delete("agone").unwrap();

        assert_eq!(s.list("^a").unwrap(), ["abeta", "alpha"]);
        assert_eq!(s.list(".*").unwrap(), ["abeta", "alpha"]);
        assert!(matches!(s.list("("), Err(VaultError::InvalidFilter(_))));
    }

    #[test]
    fn unset_removes_outright() {
        let (_, mut s) = created();
        s.set("k", "v").unwrap();
        s.unset("k").unwrap();
        assert!(s.list(".*").unwrap().is_empty());
        assert!(matches!(s.get("k"), Err(VaultError::RecordNotFound(_))));
        assert!(matches!(s.unset("k"), Err(VaultError::RecordNotFound(_))));
    }

    #[test]
    fn delete_keeps_a_tombstone() {
        let (_, mut s) = created();
        s.set("k", "v").unwrap();
        s.delete("k").unwrap();
        let r = s.get("k").unwrap();
        assert!(r.is_deleted());
        assert_eq!(r.secret(), "");
        assert_eq!((r.add_count(), r.del_count()), (1, 2));
    }

    #[test]
    fn set_master_requires_a_value_and_marks_dirty() {
        let (backing, mut s) = created();
        assert!(!s.is_dirty());
        assert!(matches!(s.set_master(""), Err(VaultError::EmptyMaster)));
        s.set_master("rotated").unwrap();
        assert!(s.is_dirty());
        s.close(true).unwrap();

        let mut reopened = store(&backing);
        assert!(reopened.open("master").is_err());
        reopened.open("rotated").unwrap();
    }

    #[test]
    fn save_only_writes_when_dirty_or_forced() {
        let (backing, mut s) = created();
        let before = backing.bytes();

        s.save(false).unwrap();
        assert_eq!(backing.bytes(), before);

        s.set("k", "v").unwrap();
        s.save(false).unwrap();
        assert!(!s.is_dirty());
        let after = backing.bytes();
        assert_ne!(after, before);

        s.save(true).unwrap();
        assert_eq!(backing.bytes(), after);
    }

    #[test]
    fn save_persists_tombstones() {
        let (backing, mut s) = created();
        s.set("k", "v").unwrap();
        s.delete("k").unwrap();
        s.close(true).unwrap();

        let mut reopened = store(&backing);
        reopened.open("master").unwrap();
        assert!(reopened.get("k").unwrap().is_deleted());
    }

    #[test]
    fn close_without_persist_discards_changes() {
        let (backing, mut s) = created();
        s.set("k", "v").unwrap();
        s.close(false).unwrap();
        assert!(!s.is_open());
        assert_eq!(s.records().count(), 0);

        let mut reopened = store(&backing);
        reopened.open("master").unwrap();
        assert_eq!(reopened.records().count(), 0);
    }

    #[test]
    fn set_random_stores_and_returns_the_password() {
        let (_, mut s) = created();
        let pass = s.set_random("gen", "12an").unwrap();
        assert_eq!(pass.len(), 12);
        assert_eq!(s.get("gen").unwrap().secret(), pass.as_str());
        assert!(matches!(
            s.set_random("gen", "12q"),
            Err(VaultError::Recipe { index: 2, .. })
        ));
        assert_eq!(s.get("gen").unwrap().add_count(), 1);
    }

    #[test]
    fn starved_random_source_leaves_the_record_alone() {
        let backing = MemoryBacking::new();
        let mut s = store(&backing).with_random(Box::new(ScriptedRandom::new(vec![0u8; 4])));
        s.create("master").unwrap();
        assert!(matches!(
            s.set_random("k", "2a"),
            Err(VaultError::RandomExhausted { .. })
        ));
        assert!(s.get("k").is_err());
    }

    #[test]
    fn salted_records_get_a_salt_once() {
        let backing = MemoryBacking::new();
        let mut s = store(&backing).with_format(RecordFormat::Salted);
        s.create("master").unwrap();
        s.set("k", "one").unwrap();
        let salt = s.get("k").unwrap().salt().map(<[u8]>::to_vec);
        assert_eq!(salt.as_ref().map(Vec::len), Some(32));

        s.set("k", "two").unwrap();
        assert_eq!(s.get("k").unwrap().salt().map(<[u8]>::to_vec), salt);
        s.close(true).unwrap();

        let mut reopened = store(&backing).with_format(RecordFormat::Salted);
        reopened.open("master").unwrap();
        assert_eq!(reopened.get("k").unwrap().salt().map(<[u8]>::to_vec), salt);
    }

    // ------------------------------------------------------------------
    // Merge
    // ------------------------------------------------------------------

    fn opened_with(plaintext: &str) -> VaultStore {
        let mut s = store(&backing_with(plaintext));
        s.open("master").unwrap();
        s
    }

    fn counters(s: &VaultStore, name: &str) -> (u64, u64, String) {
        let r = s.get(name).unwrap();
        (r.add_count(), r.del_count(), r.secret().to_string())
    }

    #[test]
    fn merge_with_identical_copy_changes_nothing() {
        let text = "a:3:0:x\nb:1:2:y\nc:4:4:z\n";
        let mut mine = opened_with(text);
        let theirs = opened_with(text);
        mine.merge(&theirs).unwrap();

        let before = opened_with(text);
        for name in ["a", "b", "c"] {
            assert_eq!(counters(&mine, name), counters(&before, name));
            assert_eq!(
                mine.get(name).unwrap().stored_secret(),
                before.get(name).unwrap().stored_secret()
            );
        }
    }

    #[test]
    fn merge_propagates_tombstones() {
        let mut b = opened_with("k:1:0:live\n");
        let a = opened_with("k:1:2:live\n");
        b.merge(&a).unwrap();
        assert!(b.get("k").unwrap().is_deleted());
        assert!(b.list(".*").unwrap().is_empty());
    }

    #[test]
    fn merge_resurrects_newer_sets() {
        let mut b = opened_with("k:3:0:again\n");
        let a = opened_with("k:1:2:old\n");
        b.merge(&a).unwrap();
        assert_eq!(counters(&b, "k"), (3, 2, "again".to_string()));

        let mut a = opened_with("k:1:2:old\n");
        let b = opened_with("k:3:0:again\n");
        a.merge(&b).unwrap();
        assert_eq!(counters(&a, "k"), (3, 2, "again".to_string()));
    }

    #[test]
    fn merge_copies_new_names_and_keeps_local_ones() {
        let mut mine = opened_with("local:1:0:l\n");
        let theirs = opened_with("remote:2:0:r\n");
        mine.merge(&theirs).unwrap();
        assert_eq!(mine.list(".*").unwrap(), ["local", "remote"]);
        assert_eq!(counters(&mine, "remote"), (2, 0, "r".to_string()));
        assert!(mine.is_dirty());
    }

    #[test]
    fn unset_names_come_back_from_a_peer() {
        let mut mine = opened_with("k:1:0:v\n");
        mine.unset("k").unwrap();
        let theirs = opened_with("k:1:0:v\n");
        mine.merge(&theirs).unwrap();
        assert_eq!(mine.list(".*").unwrap(), ["k"]);
    }

    #[test]
    fn salted_store_salts_records_merged_from_a_legacy_peer() {
        let backing = MemoryBacking::new();
        let mut salted = store(&backing)
            .with_format(RecordFormat::Salted)
            .with_random(Box::new(ScriptedRandom::new(vec![5u8; 64])));
        salted.create("master").unwrap();
        salted.merge(&opened_with("k:2:0:v\n")).unwrap();
        assert_eq!(salted.get("k").unwrap().salt(), Some(&[5u8; 32][..]));
        salted.close(true).unwrap();

        let mut reopened = store(&backing).with_format(RecordFormat::Salted);
        reopened.open("master").unwrap();
        assert!(reopened.rejected_lines().is_empty());
        assert_eq!(reopened.list(".*").unwrap(), ["k"]);
        assert_eq!(counters(&reopened, "k"), (2, 0, "v".to_string()));
    }

    #[test]
    fn merge_needs_both_sides_open() {
        let mut mine = opened_with("a:1:0:x\n");
        let closed = store(&MemoryBacking::new());
        assert!(matches!(mine.merge(&closed), Err(VaultError::NotOpen(_))));
    }
}
