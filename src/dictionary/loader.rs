//! Dictionary loading
//!
//! Dictionaries are JSON objects of keyword -> replacement. Object order is
//! preserved, so same-length tie-breaks follow the file.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;

use super::keywords::KeywordMap;
use crate::error::{Result, TsarError};

/// Built-in keywords used when no dictionary file is configured
const BUILTIN: &[(&str, &str)] = &[
    ("короче", "#"),
    ("выведи", "print"),
    ("спроси", "input"),
    ("иначе_ежели", "elif"),
    ("илиежели", "elif"),
    ("ежели", "if"),
    ("иначе", "else"),
    ("пока", "while"),
    ("для", "for"),
    ("в", "in"),
    ("диапазон", "range"),
    ("истина", "True"),
    ("ложь", "False"),
];

impl KeywordMap {
    /// The built-in default dictionary
    pub fn builtin() -> Self {
        let mut map = Self::new();
        for (word, replacement) in BUILTIN {
            // Built-in words are non-empty
            let _ = map.insert(*word, *replacement);
        }
        map
    }

    /// Parse a dictionary from a JSON object
    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        let object = value.as_object().ok_or_else(|| {
            TsarError::Dictionary("Dictionary must be a JSON object".to_string())
        })?;

        let mut map = Self::new();
        for (word, replacement) in object {
            let replacement = replacement.as_str().ok_or_else(|| {
                TsarError::Dictionary(format!(
                    "Replacement for '{}' must be a string",
                    word
                ))
            })?;
            map.insert(word.as_str(), replacement)?;
        }
        Ok(map)
    }

    /// Load a dictionary file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content).map_err(|e| match e {
            TsarError::Dictionary(msg) => {
                TsarError::Dictionary(format!("{}: {}", path.display(), msg))
            }
            TsarError::Json(err) => {
                TsarError::Dictionary(format!("{}: {}", path.display(), err))
            }
            other => other,
        })
    }

    /// Load a dictionary file, falling back to the built-in set when the
    /// file does not exist. Any other failure is returned.
    pub fn load_or_builtin(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(map) => {
                log::debug!("Loaded {} keywords from {}", map.len(), path.display());
                Ok(map)
            }
            Err(TsarError::IoError(e)) if e.kind() == ErrorKind::NotFound => {
                log::warn!(
                    "Dictionary {} not found, using built-in keywords",
                    path.display()
                );
                Ok(Self::builtin())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_covers_core_constructs() {
        let map = KeywordMap::builtin();
        for host in ["#", "print", "input", "if", "elif", "else", "while", "for", "in", "range", "True", "False"] {
            assert!(
                map.iter().any(|k| k.replacement == host),
                "missing builtin for {}",
                host
            );
        }
        assert!(map.self_referential().is_empty());
    }

    #[test]
    fn test_builtin_accepts_both_elif_spellings() {
        let map = KeywordMap::builtin();
        assert_eq!(map.get("илиежели"), Some("elif"));
        assert_eq!(map.get("иначе_ежели"), Some("elif"));
    }

    #[test]
    fn test_from_json_preserves_order() {
        let map = KeywordMap::from_json_str(r#"{"бв": "x", "аг": "y"}"#).unwrap();
        let words: Vec<&str> = map.by_length().iter().map(|k| k.word.as_str()).collect();
        assert_eq!(words, vec!["бв", "аг"]);
    }

    #[test]
    fn test_from_json_rejects_non_string() {
        let result = KeywordMap::from_json_str(r#"{"выведи": 1}"#);
        assert!(matches!(result, Err(TsarError::Dictionary(_))));

        let result = KeywordMap::from_json_str(r#"["выведи"]"#);
        assert!(matches!(result, Err(TsarError::Dictionary(_))));
    }

    #[test]
    fn test_load_or_builtin_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let map = KeywordMap::load_or_builtin(&dir.path().join("dictionary.json")).unwrap();
        assert_eq!(map.len(), KeywordMap::builtin().len());
    }

    #[test]
    fn test_load_or_builtin_broken_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let result = KeywordMap::load_or_builtin(file.path());
        assert!(matches!(result, Err(TsarError::Dictionary(_))));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"скажи": "print"}}"#).unwrap();
        let map = KeywordMap::load(file.path()).unwrap();
        assert_eq!(map.get("скажи"), Some("print"));
    }
}
