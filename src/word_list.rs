use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::Debug;
use std::ops::Range;
use std::path::Path;
use std::{fmt, fs};
use unicode_normalization::UnicodeNormalization;

use crate::types::WordId;
use crate::MAX_SLOT_LENGTH;

/// A struct representing a word in the word list.
#[derive(Debug, Clone)]
pub struct Word {
    /// The word as it would appear in a grid: uppercase, NFC-normalized, no whitespace.
    pub normalized_string: String,

    /// The word as it appears in the user's word list.
    pub canonical_string: String,

    /// The characters making up `normalized_string`, so that positions within the word are
    /// character positions rather than byte offsets.
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// The number of characters in the word.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Given a canonical word string from a word list file, turn it into the normalized form we'll
/// use in the actual fill engine.
#[must_use]
pub fn normalize_word(canonical: &str) -> String {
    canonical
        .to_uppercase()
        .nfc() // Normalize Unicode combining forms
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordListError {
    InvalidPath(String),
    InvalidWord(String),
}

impl fmt::Display for WordListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordListError::InvalidPath(path) => write!(f, "Can’t read file: “{path}”"),
            WordListError::InvalidWord(word) => {
                write!(f, "Word list contains invalid word: “{word}”")
            }
        }
    }
}

impl std::error::Error for WordListError {}

/// The vocabulary available for filling variables. Words are interned, so each distinct
/// normalized string has exactly one `WordId`, and ids are stable once assigned.
#[derive(Default, Clone)]
pub struct WordList {
    /// All loaded words, in the order they were first seen. A `WordId` is an index into this list.
    pub words: Vec<Word>,

    /// A map from a normalized string to the id of the Word representing it.
    pub word_id_by_string: HashMap<String, WordId>,

    /// Problems found while loading entries; the offending entries are skipped.
    pub errors: Vec<WordListError>,
}

impl WordList {
    #[must_use]
    pub fn new() -> WordList {
        WordList::default()
    }

    /// Build a word list from in-memory strings.
    pub fn from_words<I, S>(words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut instance = WordList::new();
        for word in words {
            instance.add_word(word.as_ref());
        }
        instance
    }

    /// Build a word list from the contents of a word list file, which has one word per line.
    /// Blank lines are ignored.
    #[must_use]
    pub fn from_file_contents(contents: &str) -> WordList {
        WordList::from_words(contents.lines())
    }

    /// Read and parse a word list file.
    pub fn from_dict_file(path: &Path) -> Result<WordList, WordListError> {
        let contents = fs::read_to_string(path)
            .map_err(|_| WordListError::InvalidPath(path.to_string_lossy().into()))?;

        Ok(WordList::from_file_contents(&contents))
    }

    /// Add a word to the list, returning its id. Duplicates resolve to the existing id; entries
    /// that are blank or contain non-alphabetic characters are skipped (the latter are recorded
    /// in `errors`).
    pub fn add_word(&mut self, canonical: &str) -> Option<WordId> {
        let canonical = canonical.trim();
        let normalized = normalize_word(canonical);
        if normalized.is_empty() {
            return None;
        }

        if !normalized.chars().all(char::is_alphabetic) {
            self.errors
                .push(WordListError::InvalidWord(canonical.to_string()));
            return None;
        }

        if let Some(&word_id) = self.word_id_by_string.get(&normalized) {
            return Some(word_id);
        }

        let word_id = self.words.len();
        self.words.push(Word {
            glyphs: normalized.chars().collect(),
            normalized_string: normalized.clone(),
            canonical_string: canonical.to_string(),
        });
        self.word_id_by_string.insert(normalized, word_id);

        Some(word_id)
    }

    /// Look up the id of a word, normalizing it first.
    #[must_use]
    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.word_id_by_string.get(&normalize_word(word)).copied()
    }

    /// Borrow an existing word using its id.
    #[must_use]
    pub fn get_word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    /// All valid word ids, in insertion order.
    #[must_use]
    pub fn word_ids(&self) -> Range<WordId> {
        0..self.words.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordList")
            .field("words", &self.words.len())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub mod tests {
    use crate::word_list::{normalize_word, WordList, WordListError};
    use std::path;
    use std::path::PathBuf;

    /// Path to a fixture file in the `resources` directory.
    #[must_use]
    pub fn resource_path(name: &str) -> PathBuf {
        let mut path = path::PathBuf::from(file!());
        path.pop();
        path.pop();
        path.push("resources");
        path.push(name);
        path
    }

    #[test]
    fn test_loads_words_from_file() {
        let word_list = WordList::from_dict_file(&resource_path("words0.txt"))
            .expect("fixture word list should load");

        assert_eq!(word_list.len(), 10);
        assert!(word_list.errors.is_empty());

        let word_id = word_list.word_id("seven").expect("should include SEVEN");
        let word = word_list.get_word(word_id);
        assert_eq!(word.normalized_string, "SEVEN");
        assert_eq!(word.canonical_string, "seven");
        assert_eq!(word.len(), 5);
    }

    #[test]
    fn test_missing_file() {
        let result = WordList::from_dict_file(&resource_path("no-such-file.txt"));

        assert!(matches!(result, Err(WordListError::InvalidPath(_))));
    }

    #[test]
    fn test_duplicates_and_blank_lines() {
        let word_list = WordList::from_file_contents("six\n\nSIX\n  Six \nten\n");

        assert_eq!(word_list.len(), 2);
        assert_eq!(word_list.word_id("six"), Some(0));
        assert_eq!(word_list.word_id("TEN"), Some(1));
    }

    #[test]
    fn test_invalid_words_are_reported() {
        let word_list = WordList::from_words(["x-ray", "zebra"]);

        assert_eq!(word_list.len(), 1);
        assert_eq!(
            word_list.errors,
            vec![WordListError::InvalidWord("x-ray".into())]
        );
    }

    #[test]
    fn test_unusual_characters() {
        // The second entry spells its accent with a combining character.
        let word_list = WordList::from_words(["monsutâ", "he\u{301}len"]);

        assert_eq!(
            word_list.words.iter().map(|word| word.len()).collect::<Vec<_>>(),
            vec![7, 5]
        );
        assert_eq!(normalize_word("he\u{301}len"), "H\u{c9}LEN");
    }
}
