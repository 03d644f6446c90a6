//! This module implements grid filling as a recursive backtracking search over the domains left
//! by node and arc consistency. Variables are chosen by minimum remaining values with a degree
//! tie-break, candidate words are tried in least-constraining-value order, and every tentative
//! assignment re-runs AC-3 on the arcs pointing at the newly assigned variable.

use log::{debug, info, trace};
use rand::prelude::*;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::arc_consistency::{
    establish_arc_consistency, establish_node_consistency, revise, ArcConsistencyFailure,
    ArcConsistencyResult, ArcConsistencySuccess, DirectedArc,
};
use crate::domains::DomainStore;
use crate::grid_config::PuzzleConfig;
use crate::types::{VariableId, WordId};
use crate::util::build_letter_counts;
use crate::word_list::WordList;

/// A (possibly partial) mapping from each variable to a word, indexed by `VariableId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    word_ids: Vec<Option<WordId>>,
}

impl Assignment {
    /// An assignment with every variable unassigned.
    #[must_use]
    pub fn new(variable_count: usize) -> Assignment {
        Assignment {
            word_ids: vec![None; variable_count],
        }
    }

    #[must_use]
    pub fn get(&self, variable_id: VariableId) -> Option<WordId> {
        self.word_ids[variable_id]
    }

    pub fn set(&mut self, variable_id: VariableId, word_id: Option<WordId>) {
        self.word_ids[variable_id] = word_id;
    }

    /// Does every variable have a word?
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.word_ids.iter().all(Option::is_some)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableId, Option<WordId>)> + '_ {
        self.word_ids.iter().copied().enumerate()
    }

    pub fn unassigned(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.iter()
            .filter(|(_, word_id)| word_id.is_none())
            .map(|(variable_id, _)| variable_id)
    }

    /// The assigned words as strings, indexed by `VariableId`.
    #[must_use]
    pub fn words<'a>(&self, word_list: &'a WordList) -> Vec<Option<&'a str>> {
        self.word_ids
            .iter()
            .map(|word_id| word_id.map(|word_id| word_list.words[word_id].normalized_string.as_str()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.word_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.word_ids.is_empty()
    }
}

/// Is the assignment free of conflicts? That requires all of:
/// * no word used twice,
/// * every assigned word the same length as its variable,
/// * every pair of assigned crossing variables agreeing on the letter in the shared cell.
///
/// Unassigned variables never cause a conflict.
#[must_use]
pub fn is_consistent(config: &PuzzleConfig, assignment: &Assignment) -> bool {
    let mut seen: HashSet<WordId> = HashSet::with_capacity(assignment.len());

    for (variable_id, word_id) in assignment.iter() {
        let Some(word_id) = word_id else {
            continue;
        };

        if !seen.insert(word_id) {
            return false;
        }

        let word = &config.word_list.words[word_id];
        if word.len() != config.graph.variable(variable_id).length {
            return false;
        }

        for crossing in config.graph.crossings(variable_id) {
            let Some(other_word_id) = assignment.get(crossing.other_variable_id) else {
                continue;
            };

            let other_word = &config.word_list.words[other_word_id];
            if word.glyphs.get(crossing.cell_idx) != other_word.glyphs.get(crossing.other_cell_idx)
            {
                return false;
            }
        }
    }

    true
}

/// How domain changes made while exploring a candidate are handled when that candidate is
/// abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomainRollback {
    /// Snapshot every domain before a tentative assignment and restore them when backtracking.
    /// The assigned variable's domain is narrowed to its word before propagating, so pruning
    /// reflects the assignment itself.
    #[default]
    Snapshot,

    /// Leave pruned domains in place when backtracking, and propagate against the assigned
    /// variable's unnarrowed domain. Propagation then only removes words with no support in the
    /// current domains, whatever was assigned, so nothing pruned here is needed by a sibling
    /// candidate. It also tightens neighbors far less than `Snapshot` does, leaving the
    /// consistency check to reject most bad candidates.
    Retain,
}

/// Knobs for a single search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub rollback: DomainRollback,

    /// Re-run AC-3 on the arcs into each newly assigned variable before recursing.
    pub maintain_arc_consistency: bool,

    /// When set, ties left after the variable and value heuristics are broken randomly with this
    /// seed instead of by id order.
    pub rng_seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            rollback: DomainRollback::default(),
            maintain_arc_consistency: true,
            rng_seed: None,
        }
    }
}

/// A struct tracking stats about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// Calls into the recursive search.
    pub states: usize,
    /// Candidates abandoned after being tried.
    pub backtracks: usize,
    /// Domain-shrinking revisions across every AC-3 run.
    pub arc_revisions: usize,
    pub total_time: Duration,
    pub initial_arc_consistency_time: Duration,
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub assignment: Assignment,
    pub statistics: Statistics,
}

/// Why a fill operation produced no assignment. Both cases are ordinary outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillFailure {
    /// Initial consistency enforcement emptied this variable's domain.
    Unsatisfiable { variable_id: VariableId },

    /// The search tried every candidate without completing the grid.
    Exhausted,
}

/// Search state for one solve attempt: the domains being pruned, plus bookkeeping.
pub struct CrosswordSolver<'a> {
    config: PuzzleConfig<'a>,
    search_config: SearchConfig,
    domains: DomainStore,
    rng: Option<SmallRng>,
    statistics: Statistics,
}

impl<'a> CrosswordSolver<'a> {
    /// Create a solver whose domains all start as the full vocabulary.
    #[must_use]
    pub fn new(config: PuzzleConfig<'a>, search_config: SearchConfig) -> CrosswordSolver<'a> {
        let rng = search_config.rng_seed.map(SmallRng::seed_from_u64);

        CrosswordSolver {
            domains: DomainStore::seed(&config),
            config,
            search_config,
            rng,
            statistics: Statistics::default(),
        }
    }

    #[must_use]
    pub fn domains(&self) -> &DomainStore {
        &self.domains
    }

    pub fn domains_mut(&mut self) -> &mut DomainStore {
        &mut self.domains
    }

    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn enforce_node_consistency(&mut self) {
        establish_node_consistency(&self.config, &mut self.domains);
    }

    pub fn revise(&mut self, x: VariableId, y: VariableId) -> bool {
        revise(&self.config, &mut self.domains, x, y)
    }

    /// Run AC-3 from the given arcs, or from every arc if `None`.
    pub fn ac3(&mut self, arcs: Option<Vec<DirectedArc>>) -> ArcConsistencyResult {
        let result = establish_arc_consistency(&self.config, &mut self.domains, arcs);
        if let Ok(ArcConsistencySuccess { revisions }) = result {
            self.statistics.arc_revisions += revisions;
        }
        result
    }

    /// Pick the unassigned variable with the fewest remaining candidates, preferring the one with
    /// the most neighbors on a tie. Returns `None` if everything is assigned.
    pub fn select_unassigned_variable(&mut self, assignment: &Assignment) -> Option<VariableId> {
        let mut candidates: Vec<VariableId> = assignment.unassigned().collect();
        if let Some(rng) = self.rng.as_mut() {
            candidates.shuffle(rng);
        }

        // `min_by_key` keeps the first of several equal minimums, so any shuffle above decides
        // the remaining ties.
        candidates.into_iter().min_by_key(|&variable_id| {
            (
                self.domains.len(variable_id),
                Reverse(self.config.graph.neighbor_count(variable_id)),
            )
        })
    }

    /// Order a variable's candidates by how many options they would rule out among its unassigned
    /// neighbors, fewest first. The score for a word is the sum, over each unassigned neighbor, of
    /// that neighbor's candidates with a different letter in the shared cell.
    pub fn order_domain_values(
        &mut self,
        variable_id: VariableId,
        assignment: &Assignment,
    ) -> Vec<WordId> {
        let config = &self.config;

        // For each unassigned neighbor: our cell index, its domain size, and its letter counts at
        // the shared cell. A candidate's conflicts with that neighbor are its domain size minus
        // the count for the candidate's letter.
        let neighbor_stats: Vec<_> = config
            .graph
            .crossings(variable_id)
            .iter()
            .filter(|crossing| assignment.get(crossing.other_variable_id).is_none())
            .map(|crossing| {
                let options = self.domains.options(crossing.other_variable_id);
                (
                    crossing.cell_idx,
                    options.len(),
                    build_letter_counts(config.word_list, options, crossing.other_cell_idx),
                )
            })
            .collect();

        let mut values: Vec<WordId> = self.domains.options(variable_id).to_vec();
        if let Some(rng) = self.rng.as_mut() {
            values.shuffle(rng);
        }

        values.sort_by_cached_key(|&word_id| {
            let glyphs = &config.word_list.words[word_id].glyphs;
            neighbor_stats
                .iter()
                .map(|(cell_idx, option_count, letter_counts)| {
                    let matching = glyphs
                        .get(*cell_idx)
                        .and_then(|letter| letter_counts.get(letter))
                        .copied()
                        .unwrap_or(0);
                    option_count - matching
                })
                .sum::<usize>()
        });

        values
    }

    /// Extend a partial assignment to a complete, consistent one, or return `None` if no
    /// extension exists given the current domains.
    pub fn backtrack(&mut self, mut assignment: Assignment) -> Option<Assignment> {
        if self.backtrack_in_place(&mut assignment) {
            Some(assignment)
        } else {
            None
        }
    }

    fn backtrack_in_place(&mut self, assignment: &mut Assignment) -> bool {
        self.statistics.states += 1;

        let Some(variable_id) = self.select_unassigned_variable(assignment) else {
            return true;
        };

        let values = self.order_domain_values(variable_id, assignment);
        trace!(
            "branching on {} with {} candidates",
            self.config.graph.variable(variable_id),
            values.len()
        );

        for word_id in values {
            let snapshot = match self.search_config.rollback {
                DomainRollback::Snapshot => Some(self.domains.snapshot()),
                DomainRollback::Retain => None,
            };

            assignment.set(variable_id, Some(word_id));

            if is_consistent(&self.config, assignment)
                && self.propagate(variable_id, word_id)
                && self.backtrack_in_place(assignment)
            {
                return true;
            }

            assignment.set(variable_id, None);
            if let Some(snapshot) = snapshot {
                self.domains.restore(snapshot);
            }
            self.statistics.backtracks += 1;
        }

        false
    }

    /// Tighten the domains of a newly assigned variable's neighbors. Returns false if some
    /// domain was wiped out.
    fn propagate(&mut self, variable_id: VariableId, word_id: WordId) -> bool {
        if !self.search_config.maintain_arc_consistency {
            return true;
        }

        if self.search_config.rollback == DomainRollback::Snapshot {
            self.domains.narrow_to(variable_id, word_id);
        }

        let arcs: Vec<DirectedArc> = self
            .config
            .graph
            .neighbors(variable_id)
            .map(|neighbor| (neighbor, variable_id))
            .collect();

        self.ac3(Some(arcs)).is_ok()
    }

    /// Establish node and arc consistency, then search from an empty assignment.
    pub fn solve(&mut self) -> Result<Assignment, FillFailure> {
        let start = Instant::now();

        self.enforce_node_consistency();
        let initial = self.ac3(None);
        self.statistics.initial_arc_consistency_time = start.elapsed();

        if let Err(ArcConsistencyFailure { variable_id }) = initial {
            debug!(
                "initial arc consistency failed at {}",
                self.config.graph.variable(variable_id)
            );
            self.statistics.total_time = start.elapsed();
            return Err(FillFailure::Unsatisfiable { variable_id });
        }

        let result = self.backtrack(Assignment::new(self.config.graph.variable_count()));
        self.statistics.total_time = start.elapsed();

        result.ok_or(FillFailure::Exhausted)
    }

    /// Consume the solver, keeping its statistics.
    #[must_use]
    pub fn into_statistics(self) -> Statistics {
        self.statistics
    }
}

/// Search for a complete, consistent fill of the given puzzle.
pub fn find_fill(
    config: &PuzzleConfig,
    search_config: &SearchConfig,
) -> Result<FillSuccess, FillFailure> {
    let mut solver = CrosswordSolver::new(*config, search_config.clone());
    let result = solver.solve();
    let statistics = solver.into_statistics();

    match result {
        Ok(assignment) => {
            info!(
                "filled {} variables in {:?} ({} states, {} backtracks)",
                assignment.len(),
                statistics.total_time,
                statistics.states,
                statistics.backtracks
            );
            Ok(FillSuccess {
                assignment,
                statistics,
            })
        }
        Err(failure) => {
            info!("no fill found: {failure:?} after {:?}", statistics.total_time);
            Err(failure)
        }
    }
}
