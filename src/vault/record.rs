//! A single named secret and its version counters.
//!
//! `add_count` is bumped every time the secret is set; `delete` sets
//! `del_count` one past it.  A record is a tombstone while
//! `del_count > add_count`, and a later `set_secret` lifts it back
//! above the tombstone.  Both counters only ever grow, which is what
//! lets two replicas be merged without losing deletions.

use std::fmt;

use zeroize::Zeroizing;

/// One vault entry.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    name: String,
    secret: Zeroizing<String>,
    add_count: u64,
    del_count: u64,
    salt: Option<Vec<u8>>,
}

impl Record {
    /// Create a live record with `add_count = 1`.
    pub fn new(name: &str, secret: &str, salt: Option<Vec<u8>>) -> Self {
        Self {
            name: name.to_string(),
            secret: Zeroizing::new(secret.to_string()),
            add_count: 1,
            del_count: 0,
            salt,
        }
    }

    /// Rebuild a record exactly as it was persisted.
    pub fn from_parts(
        name: String,
        secret: String,
        add_count: u64,
        del_count: u64,
        salt: Option<Vec<u8>>,
    ) -> Self {
        Self {
            name,
            secret: Zeroizing::new(secret),
            add_count,
            del_count,
            salt,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The visible secret: empty while the record is deleted.
    pub fn secret(&self) -> &str {
        if self.is_deleted() {
            ""
        } else {
            &self.secret
        }
    }

    /// The stored secret, deleted or not.  Only the encoder needs this.
    pub(crate) fn stored_secret(&self) -> &str {
        &self.secret
    }

    pub fn add_count(&self) -> u64 {
        self.add_count
    }

    pub fn del_count(&self) -> u64 {
        self.del_count
    }

    pub fn salt(&self) -> Option<&[u8]> {
        self.salt.as_deref()
    }

    pub fn is_deleted(&self) -> bool {
        self.del_count > self.add_count
    }

    /// Give the record `salt` unless it already has one.
    pub fn fill_salt(&mut self, salt: Vec<u8>) {
        self.salt.get_or_insert(salt);
    }

    /// Replace the secret and bump `add_count`.  Counters saturate.
    pub fn set_secret(&mut self, secret: &str) {
        self.secret = Zeroizing::new(secret.to_string());
        self.add_count = self.add_count.saturating_add(1);
    }

    /// Turn the record into a tombstone.
    pub fn delete(&mut self) {
        self.del_count = self.add_count.saturating_add(1);
    }

    /// Fold a peer's copy of the same record into this one.
    ///
    /// The tombstone counter takes the maximum of both sides.  The
    /// secret follows whichever side has the strictly higher
    /// `add_count`; on a tie the local secret is kept.
    pub fn merge(&mut self, theirs: &Record) {
        self.del_count = self.del_count.max(theirs.del_count);
        if theirs.add_count > self.add_count {
            self.secret = theirs.secret.clone();
            self.add_count = theirs.add_count;
        }
        if self.salt.is_none() {
            self.salt.clone_from(&theirs.salt);
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("name", &self.name)
            .field("secret", &"***")
            .field("add_count", &self.add_count)
            .field("del_count", &self.del_count)
            .field("salted", &self.salt.is_some())
            .finish()
    }
}
