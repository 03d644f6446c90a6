//! This module bundles the static inputs of a solve (the puzzle graph and the vocabulary) and
//! projects assignments back onto the grid for output.

use crate::backtracking_search::Assignment;
use crate::puzzle_graph::{GridError, PuzzleGraph};
use crate::word_list::WordList;

/// Character used for blocked cells in `render_grid`.
pub const BLOCK_CHAR: char = '█';

/// A struct holding references to all of the information needed as input to a solve.
#[derive(Clone, Copy)]
pub struct PuzzleConfig<'a> {
    /// The vocabulary used to fill the grid; see `word_list.rs`.
    pub word_list: &'a WordList,

    /// Variables and overlaps derived from the grid structure; see `puzzle_graph.rs`.
    pub graph: &'a PuzzleGraph,
}

/// A struct that owns a copy of each piece of information needed by `PuzzleConfig`.
#[derive(Debug)]
pub struct OwnedPuzzleConfig {
    pub word_list: WordList,
    pub graph: PuzzleGraph,
}

impl OwnedPuzzleConfig {
    /// Build a config from a structure string (see `parse_structure`) and a loaded word list.
    pub fn new(structure: &str, word_list: WordList) -> Result<OwnedPuzzleConfig, GridError> {
        Ok(OwnedPuzzleConfig {
            word_list,
            graph: PuzzleGraph::from_structure_string(structure)?,
        })
    }

    #[must_use]
    pub fn to_config_ref(&self) -> PuzzleConfig {
        PuzzleConfig {
            word_list: &self.word_list,
            graph: &self.graph,
        }
    }
}

/// Project an assignment onto the grid. Cells that are blocked or not covered by any assigned
/// variable are `None`.
#[must_use]
pub fn letter_grid(config: &PuzzleConfig, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; config.graph.width()]; config.graph.height()];

    for (variable_id, word_id) in assignment.iter() {
        let Some(word_id) = word_id else {
            continue;
        };
        let word = &config.word_list.words[word_id];
        let coords = config.graph.variable(variable_id).cell_coords();

        for ((row, col), &letter) in coords.into_iter().zip(&word.glyphs) {
            letters[row][col] = Some(letter);
        }
    }

    letters
}

/// Turn the given assignment into a rendered string, one line per row.
#[must_use]
pub fn render_grid(config: &PuzzleConfig, assignment: &Assignment) -> String {
    letter_grid(config, assignment)
        .iter()
        .enumerate()
        .map(|(row, line)| {
            line.iter()
                .enumerate()
                .map(|(col, cell)| {
                    if config.graph.is_fillable(row, col) {
                        cell.unwrap_or(' ')
                    } else {
                        BLOCK_CHAR
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
