/// An identifier for a given variable, based on its index in the `PuzzleGraph`'s `variables`
/// field.
pub type VariableId = usize;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field.
pub type WordId = usize;

/// Zero-indexed row and column of a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);
