//! Ordered keyword map
//!
//! A `KeywordMap` keeps dialect keywords in insertion order and hands them
//! out longest-first for matching. Two keywords of the same length are
//! tried in insertion order; that tie-break is arbitrary but stable.

use std::collections::HashMap;

use crate::error::{Result, TsarError};

/// A single dialect keyword and the host token it is rewritten to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub word: String,
    pub replacement: String,
    /// Length in characters, not bytes
    pub len: usize,
}

/// Ordered set of keyword -> replacement pairs with unique keywords
#[derive(Debug, Clone, Default)]
pub struct KeywordMap {
    entries: Vec<Keyword>,
    positions: HashMap<String, usize>,
}

impl KeywordMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from pairs, rejecting empty keywords
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (word, replacement) in pairs {
            map.insert(word, replacement)?;
        }
        Ok(map)
    }

    /// Insert a keyword. Re-inserting an existing keyword replaces its
    /// replacement but keeps its original position.
    pub fn insert(&mut self, word: impl Into<String>, replacement: impl Into<String>) -> Result<()> {
        let word = word.into();
        let replacement = replacement.into();

        if word.is_empty() {
            return Err(TsarError::Dictionary(
                "Keywords must not be empty".to_string(),
            ));
        }

        if let Some(&idx) = self.positions.get(&word) {
            self.entries[idx].replacement = replacement;
            return Ok(());
        }

        let len = word.chars().count();
        self.positions.insert(word.clone(), self.entries.len());
        self.entries.push(Keyword {
            word,
            replacement,
            len,
        });
        Ok(())
    }

    /// Look up the replacement for a keyword
    pub fn get(&self, word: &str) -> Option<&str> {
        self.positions
            .get(word)
            .map(|&idx| self.entries[idx].replacement.as_str())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.positions.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keywords in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Keyword> {
        self.entries.iter()
    }

    /// Keywords in matching order: longest first, ties by insertion order
    pub fn by_length(&self) -> Vec<&Keyword> {
        let mut ordered: Vec<&Keyword> = self.entries.iter().collect();
        // sort_by is stable
        ordered.sort_by(|a, b| b.len.cmp(&a.len));
        ordered
    }

    /// Keywords whose replacement is itself a keyword.
    ///
    /// Translation is only idempotent on quote-free input when this is empty.
    pub fn self_referential(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|k| self.contains(&k.replacement))
            .map(|k| k.word.as_str())
            .collect()
    }
}
