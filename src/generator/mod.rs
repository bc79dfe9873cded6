//! Recipe-driven password generation.
//!
//! This module provides:
//! - The recipe parser and its character classes (`recipe`)
//! - `PasswordGenerator`, which caches parsed recipes and weaves random
//!   characters into a password

pub mod recipe;

use std::collections::HashMap;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::crypto::random::RandomSource;
use crate::errors::Result;

pub use recipe::{Mix, Recipe, DIGITS, LETTERS, MAX_LENGTH, SYMBOLS};

/// Parses recipes once and generates passwords from them.
#[derive(Debug, Default)]
pub struct PasswordGenerator {
    recipes: HashMap<String, Arc<Recipe>>,
}

impl PasswordGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The parsed recipe for `source`, parsing and caching it on first use.
    ///
    /// Recipes that fail to parse are not cached.
    pub fn recipe(&mut self, source: &str) -> Result<Arc<Recipe>> {
        if let Some(recipe) = self.recipes.get(source) {
            return Ok(Arc::clone(recipe));
        }
        let recipe = Arc::new(Recipe::parse(source)?);
        self.recipes.insert(source.to_string(), Arc::clone(&recipe));
        Ok(recipe)
    }

    /// Generate a fresh password from `source`.
    pub fn generate(&mut self, source: &str, rng: &mut dyn RandomSource) -> Result<Zeroizing<String>> {
        let recipe = self.recipe(source)?;
        extend(&recipe, "", rng)
    }

    /// Number of distinct recipes parsed so far.
    pub fn cached(&self) -> usize {
        self.recipes.len()
    }
}

/// Parse `source` and extend `base` with it, without caching the recipe.
pub fn generate(source: &str, base: &str, rng: &mut dyn RandomSource) -> Result<Zeroizing<String>> {
    let recipe = Recipe::parse(source)?;
    extend(&recipe, base, rng)
}

/// Weave the characters of `recipe` into `base`.
///
/// For every character: two random bytes pick the character
/// (`((b1 & 0x7f) << 8) + b2`, modulo the alphabet size) and a third
/// picks where it goes (`b3` modulo the current length + 1), so the
/// classes end up interleaved rather than grouped.
pub fn extend(recipe: &Recipe, base: &str, rng: &mut dyn RandomSource) -> Result<Zeroizing<String>> {
    let added = recipe.total_quantity().min(u64::from(MAX_LENGTH));
    let added = usize::try_from(added).unwrap_or_default();
    let mut result = Zeroizing::new(String::with_capacity(base.len().saturating_add(added)));
    result.push_str(base);
    let mut len = base.chars().count();

    for mix in recipe.mixes() {
        let alphabet: Vec<char> = mix.alphabet().chars().collect();
        for _ in 0..mix.quantity() {
            let mut draw = Zeroizing::new([0u8; 3]);
            rng.fill(draw.as_mut_slice())?;

            let index = ((usize::from(draw[0] & 0x7f) << 8) + usize::from(draw[1])) % alphabet.len();
            let position = usize::from(draw[2]) % (len + 1);

            let at = result
                .char_indices()
                .nth(position)
                .map_or(result.len(), |(i, _)| i);
            result.insert(at, alphabet[index]);
            len += 1;
        }
    }

    Ok(result)
}
