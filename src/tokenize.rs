//! Character-level tokeniser — the second half of the spectrogram model's
//! `parse` step.
//!
//! Maps each character of normalised text to its integer ID in a fixed
//! vocabulary.  The default vocabulary is the English character set of the
//! `tts_en_fastpitch` export:
//!   `[pad] + " " + a–z + "'" + punctuation`
//!
//! A model repository may ship its own symbol list in `config.json`
//! (see [`crate::download::ModelConfig::symbols`]).  Text is lowercased before
//! lookup; unknown characters are silently skipped.

use std::collections::HashMap;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;

/// Index 0 is reserved for padding and never produced by [`Vocabulary::encode`].
const PAD: char = '\u{0}';

const LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";

const PUNCTUATION: &str = ",.!?-;:";

static ENGLISH: Lazy<Vocabulary> = Lazy::new(|| {
    let symbols: Vec<char> = std::iter::once(PAD)
        .chain(std::iter::once(' '))
        .chain(LETTERS.chars())
        .chain(std::iter::once('\''))
        .chain(PUNCTUATION.chars())
        .collect();
    Vocabulary::from_chars(symbols)
});

/// Character → token ID mapping.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    ids: HashMap<char, i64>,
}

impl Vocabulary {
    /// The built-in English character vocabulary.
    pub fn english() -> Self {
        (*ENGLISH).clone()
    }

    fn from_chars(symbols: Vec<char>) -> Self {
        // First occurrence wins if a symbol list repeats a character.
        let mut ids = HashMap::with_capacity(symbols.len());
        for (i, c) in symbols.into_iter().enumerate() {
            ids.entry(c).or_insert(i as i64);
        }
        Self { ids }
    }

    /// Build from a `config.json` symbol list.  Index 0 must be the pad
    /// symbol; every entry must be exactly one character.
    pub fn from_symbols(symbols: &[String]) -> Result<Self> {
        if symbols.is_empty() {
            bail!("Symbol list is empty");
        }
        let mut chars = Vec::with_capacity(symbols.len());
        for (i, s) in symbols.iter().enumerate() {
            let mut it = s.chars();
            match (it.next(), it.next()) {
                (Some(c), None) => chars.push(c),
                _ => bail!("Symbol #{} ({:?}) is not a single character", i, s),
            }
        }
        Ok(Self::from_chars(chars))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// ID of `c` (after lowercasing), `None` for characters outside the vocabulary.
    pub fn id_of(&self, c: char) -> Option<i64> {
        c.to_lowercase()
            .next()
            .and_then(|lc| self.ids.get(&lc).copied())
            .filter(|&id| id != 0)
    }

    /// Encode `text` to token IDs, skipping unknown characters.
    pub fn encode(&self, text: &str) -> Vec<i64> {
        text.chars().filter_map(|c| self.id_of(c)).collect()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::english()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
