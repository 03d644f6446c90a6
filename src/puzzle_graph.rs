//! This module derives the constraint graph of a crossword from its grid structure: one variable
//! per maximal run of fillable cells, plus the overlap relation between every pair of variables
//! that share a cell.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{GridCoord, VariableId};
use crate::MAX_SLOT_LENGTH;

/// Characters that mark a fillable cell in a structure string. Anything else is a block.
pub const FILLABLE_MARKERS: [char; 2] = ['_', '.'];

/// The direction that a variable is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Across,
    Down,
}

/// A maximal run of fillable cells, identified by its start cell, direction, and length.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct Variable {
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
}

impl Variable {
    #[must_use]
    pub fn new(row: usize, col: usize, direction: Direction, length: usize) -> Variable {
        Variable {
            start_cell: (row, col),
            direction,
            length,
        }
    }

    #[must_use]
    pub fn row(&self) -> usize {
        self.start_cell.0
    }

    #[must_use]
    pub fn col(&self) -> usize {
        self.start_cell.1
    }

    /// Generate the coords for each cell of this variable.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length)
            .map(|cell_idx| match self.direction {
                Direction::Across => (self.start_cell.0, self.start_cell.1 + cell_idx),
                Direction::Down => (self.start_cell.0 + cell_idx, self.start_cell.1),
            })
            .collect()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Across => "across",
            Direction::Down => "down",
        })
    }
}

/// A variable written as `row,col,direction,length`, e.g. `1,2,down,5`.
impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (row, col) = self.start_cell;
        write!(f, "{row},{col},{},{}", self.direction, self.length)
    }
}

/// A string that isn't a `row,col,direction,length` variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVariableError(String);

impl fmt::Display for ParseVariableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid variable: {:?}", self.0)
    }
}

impl std::error::Error for ParseVariableError {}

impl FromStr for Variable {
    type Err = ParseVariableError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseVariableError(raw.to_string());

        let mut fields = raw.split(',').map(str::trim);
        let mut next_field = || fields.next().ok_or_else(invalid);

        let row: usize = next_field()?.parse().map_err(|_| invalid())?;
        let col: usize = next_field()?.parse().map_err(|_| invalid())?;
        let direction = match next_field()? {
            "across" => Direction::Across,
            "down" => Direction::Down,
            _ => return Err(invalid()),
        };
        let length: usize = next_field()?.parse().map_err(|_| invalid())?;

        if fields.next().is_some() {
            return Err(invalid());
        }

        Ok(Variable::new(row, col, direction, length))
    }
}

#[cfg(feature = "serde")]
impl Serialize for Variable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// A crossing between one variable and another, seen from the first variable's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other_variable_id: VariableId,

    /// Position of the shared cell within this variable's word.
    pub cell_idx: usize,

    /// Position of the shared cell within the other variable's word.
    pub other_cell_idx: usize,
}

/// Problems with a grid structure that prevent building a `PuzzleGraph`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    Empty,
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::Empty => write!(f, "Grid must have at least one row"),
            GridError::RaggedRows {
                row,
                expected,
                found,
            } => write!(
                f,
                "Rows in grid must all be the same length (row {row} has {found} cells, expected {expected})"
            ),
        }
    }
}

impl std::error::Error for GridError {}

/// Parse a structure string with one line per row, where `_` or `.` marks a fillable cell and any
/// other character marks a block.
pub fn parse_structure(structure: &str) -> Result<Vec<Vec<bool>>, GridError> {
    let lines: Vec<&str> = structure.lines().collect();

    // Blank lines at either end are just file formatting.
    let first = lines.iter().position(|line| !line.trim().is_empty());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return Err(GridError::Empty);
    };

    let cells: Vec<Vec<bool>> = lines[first..=last]
        .iter()
        .map(|line| {
            line.chars()
                .map(|c| FILLABLE_MARKERS.contains(&c))
                .collect()
        })
        .collect();

    check_rectangular(&cells)?;

    Ok(cells)
}

fn check_rectangular(cells: &[Vec<bool>]) -> Result<(), GridError> {
    let Some(first_row) = cells.first() else {
        return Err(GridError::Empty);
    };
    if first_row.is_empty() {
        return Err(GridError::Empty);
    }

    let expected = first_row.len();
    match cells.iter().position(|row| row.len() != expected) {
        Some(row) => Err(GridError::RaggedRows {
            row,
            expected,
            found: cells[row].len(),
        }),
        None => Ok(()),
    }
}

/// Find every maximal run of `true` cells of length 2 or more in each row, as lists of
/// (row, col) coords.
fn build_runs(cells: &[Vec<bool>]) -> Vec<Vec<GridCoord>> {
    let mut result: Vec<Vec<GridCoord>> = vec![];

    for (row, line) in cells.iter().enumerate() {
        let mut current_run: Vec<GridCoord> = vec![];

        for (col, &fillable) in line.iter().enumerate() {
            if fillable {
                current_run.push((row, col));
            } else {
                if current_run.len() > 1 {
                    result.push(current_run);
                }
                current_run = vec![];
            }
        }

        if current_run.len() > 1 {
            result.push(current_run);
        }
    }

    result
}

/// The immutable constraint graph of a crossword.
pub struct PuzzleGraph {
    width: usize,
    height: usize,

    /// Row-major grid, `true` for fillable cells.
    cells: Vec<Vec<bool>>,

    /// All ACROSS variables in row-major order, then all DOWN variables in column-major order.
    variables: Vec<Variable>,

    variable_id_by_spec: HashMap<Variable, VariableId>,

    /// For each variable, its crossings in order of cell index. These double as the neighbor list.
    crossings: Vec<SmallVec<[Crossing; MAX_SLOT_LENGTH]>>,

    /// Dense `variables.len()` x `variables.len()` table: the entry for `(a, b)` holds the
    /// position of the shared cell within `a` and within `b`, if any.
    overlaps: Vec<Option<(usize, usize)>>,
}

impl PuzzleGraph {
    /// Build the graph from a rectangular grid of fillable (`true`) and blocked (`false`) cells.
    pub fn new(cells: Vec<Vec<bool>>) -> Result<PuzzleGraph, GridError> {
        check_rectangular(&cells)?;

        let height = cells.len();
        let width = cells[0].len();

        let mut variables: Vec<Variable> = build_runs(&cells)
            .into_iter()
            .map(|coords| Variable {
                start_cell: coords[0],
                direction: Direction::Across,
                length: coords.len(),
            })
            .collect();

        let transposed: Vec<Vec<bool>> = (0..width)
            .map(|col| (0..height).map(|row| cells[row][col]).collect())
            .collect();

        variables.extend(build_runs(&transposed).into_iter().map(|coords| {
            let (col, row) = coords[0];
            Variable {
                start_cell: (row, col),
                direction: Direction::Down,
                length: coords.len(),
            }
        }));

        let variable_id_by_spec: HashMap<Variable, VariableId> = variables
            .iter()
            .enumerate()
            .map(|(variable_id, &variable)| (variable, variable_id))
            .collect();

        // Map each cell to the variables passing through it, which we can then use to find
        // overlaps without comparing every pair of runs cell by cell.
        let mut entries_by_cell: HashMap<GridCoord, SmallVec<[(VariableId, usize); 2]>> =
            HashMap::new();
        for (variable_id, variable) in variables.iter().enumerate() {
            for (cell_idx, coord) in variable.cell_coords().into_iter().enumerate() {
                entries_by_cell
                    .entry(coord)
                    .or_default()
                    .push((variable_id, cell_idx));
            }
        }

        let variable_count = variables.len();
        let mut overlaps = vec![None; variable_count * variable_count];
        let crossings: Vec<SmallVec<[Crossing; MAX_SLOT_LENGTH]>> = variables
            .iter()
            .enumerate()
            .map(|(variable_id, variable)| {
                variable
                    .cell_coords()
                    .iter()
                    .enumerate()
                    .flat_map(|(cell_idx, coord)| {
                        entries_by_cell[coord]
                            .iter()
                            .filter(|&&(other_id, _)| other_id != variable_id)
                            .map(move |&(other_variable_id, other_cell_idx)| Crossing {
                                other_variable_id,
                                cell_idx,
                                other_cell_idx,
                            })
                            .collect::<SmallVec<[Crossing; 2]>>()
                    })
                    .inspect(|crossing| {
                        overlaps[variable_id * variable_count + crossing.other_variable_id] =
                            Some((crossing.cell_idx, crossing.other_cell_idx));
                    })
                    .collect::<SmallVec<[Crossing; MAX_SLOT_LENGTH]>>()
            })
            .collect();

        Ok(PuzzleGraph {
            width,
            height,
            cells,
            variables,
            variable_id_by_spec,
            crossings,
            overlaps,
        })
    }

    /// Parse a structure string (see `parse_structure`) and build its graph.
    pub fn from_structure_string(structure: &str) -> Result<PuzzleGraph, GridError> {
        PuzzleGraph::new(parse_structure(structure)?)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn is_fillable(&self, row: usize, col: usize) -> bool {
        self.cells[row][col]
    }

    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    #[must_use]
    pub fn variable(&self, variable_id: VariableId) -> &Variable {
        &self.variables[variable_id]
    }

    #[must_use]
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn variable_id(&self, variable: &Variable) -> Option<VariableId> {
        self.variable_id_by_spec.get(variable).copied()
    }

    /// The position of the shared cell within `a`'s word and within `b`'s word, or `None` if the
    /// two variables don't cross. A variable never overlaps itself.
    #[must_use]
    pub fn overlap(&self, a: VariableId, b: VariableId) -> Option<(usize, usize)> {
        self.overlaps[a * self.variables.len() + b]
    }

    #[must_use]
    pub fn crossings(&self, variable_id: VariableId) -> &[Crossing] {
        &self.crossings[variable_id]
    }

    /// All variables with a defined overlap with this one.
    pub fn neighbors(&self, variable_id: VariableId) -> impl Iterator<Item = VariableId> + '_ {
        self.crossings[variable_id]
            .iter()
            .map(|crossing| crossing.other_variable_id)
    }

    #[must_use]
    pub fn neighbor_count(&self, variable_id: VariableId) -> usize {
        self.crossings[variable_id].len()
    }
}

impl Debug for PuzzleGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PuzzleGraph")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("variables", &self.variables.len())
            .finish_non_exhaustive()
    }
}
