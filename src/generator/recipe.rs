//! The recipe language.
//!
//! ```text
//! recipe     := mix ('+' mix)*
//! mix        := quantity? ingredient+
//! quantity   := digit+            (absent or 0 means 1)
//! ingredient := 'a' | 'n' | 's'   (letters, digits, symbols)
//! ```
//!
//! `16an+2s` is sixteen characters drawn from letters and digits plus
//! two symbols, woven together.  A recipe adds at most `MAX_LENGTH`
//! characters in total.

use crate::errors::{Result, VaultError};

pub const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &str = "0123456789";
pub const SYMBOLS: &str = "(-_)~#{[|^@]}+=<>,?./!";

/// Most characters a single recipe may add.
pub const MAX_LENGTH: u32 = 4096;

/// How many characters to draw, and from which alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mix {
    quantity: u32,
    alphabet: String,
}

impl Mix {
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn alphabet(&self) -> &str {
        &self.alphabet
    }
}

/// A parsed recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    source: String,
    mixes: Vec<Mix>,
}

impl Recipe {
    /// Parse `source`, failing at the first offending byte.
    pub fn parse(source: &str) -> Result<Self> {
        let bytes = source.as_bytes();
        if bytes.is_empty() {
            return Err(recipe_error(0, "empty recipe".into()));
        }

        let mut mixes = Vec::new();
        let mut idx = 0;
        let mut total: u32 = 0;

        loop {
            let start = idx;
            let mut quantity: Option<u32> = None;
            while let Some(b) = bytes.get(idx).copied().filter(u8::is_ascii_digit) {
                let q = quantity
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|q| q.checked_add(u32::from(b - b'0')))
                    .filter(|q| *q <= MAX_LENGTH)
                    .ok_or_else(|| recipe_error(idx, "quantity too large".into()))?;
                quantity = Some(q);
                idx += 1;
            }

            let mut alphabet = String::new();
            while let Some(&b) = bytes.get(idx) {
                match b {
                    b'a' => alphabet.push_str(LETTERS),
                    b'n' => alphabet.push_str(DIGITS),
                    b's' => alphabet.push_str(SYMBOLS),
                    b'+' => break,
                    _ => {
                        let shown = source[idx..].chars().next().unwrap_or_default();
                        return Err(recipe_error(
                            idx,
                            format!("expected one of 'a', 'n', 's', '+'; not '{shown}'"),
                        ));
                    }
                }
                idx += 1;
            }

            if alphabet.is_empty() {
                let message = match quantity {
                    None => "expected ingredient or quantity",
                    Some(_) => "expected ingredient",
                };
                return Err(recipe_error(idx, message.into()));
            }

            let quantity = quantity.filter(|q| *q > 0).unwrap_or(1);
            total += quantity;
            if total > MAX_LENGTH {
                return Err(recipe_error(
                    start,
                    format!("recipe longer than {MAX_LENGTH} characters"),
                ));
            }
            mixes.push(Mix { quantity, alphabet });

            if idx == bytes.len() {
                break;
            }
            // Skip the '+'.
            idx += 1;
        }

        Ok(Self {
            source: source.to_string(),
            mixes,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn mixes(&self) -> &[Mix] {
        &self.mixes
    }

    /// Number of characters one generation adds.
    pub fn total_quantity(&self) -> u64 {
        self.mixes.iter().map(|m| u64::from(m.quantity)).sum()
    }
}

fn recipe_error(index: usize, message: String) -> VaultError {
    VaultError::Recipe { index, message }
}
