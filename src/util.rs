use std::collections::HashMap;

use crate::types::WordId;
use crate::word_list::WordList;

/// Number of occurrences of each letter at a single position across a set of options.
pub type LetterCounts = HashMap<char, usize>;

/// Count the letters appearing at `cell_idx` in each of the given options. Options too short to
/// have a letter at that position don't contribute anything.
pub fn build_letter_counts(
    word_list: &WordList,
    options: &[WordId],
    cell_idx: usize,
) -> LetterCounts {
    let mut result = LetterCounts::new();

    for &word_id in options {
        if let Some(&letter) = word_list.words[word_id].glyphs.get(cell_idx) {
            *result.entry(letter).or_insert(0) += 1;
        }
    }

    result
}
