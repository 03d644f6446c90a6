//! This module contains a crossword-specific implementation of node consistency and the AC-3
//! algorithm. For our purposes, a grid is:
//!
//! - Node-consistent when every candidate for a variable has the variable's length.
//!
//! - Arc-consistent when, for every pair of crossing variables `(x, y)`, every candidate for `x`
//!   has at least one candidate for `y` with the same letter in the shared cell.
//!
//! Node consistency must be established first, since the letter positions used by arc
//! consistency are only meaningful for words of the right length.

use log::{debug, trace};
use std::collections::{HashSet, VecDeque};

use crate::domains::DomainStore;
use crate::grid_config::PuzzleConfig;
use crate::types::VariableId;
use crate::util::build_letter_counts;
use crate::CHECK_INVARIANTS;

/// A directed constraint `(x, y)`: revising it prunes `x` against `y`.
pub type DirectedArc = (VariableId, VariableId);

/// Result from a successful call to `establish_arc_consistency`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many `revise` calls shrank a domain.
    pub revisions: usize,
}

/// Result from a failed call to `establish_arc_consistency`, identifying the variable whose
/// domain was wiped out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub variable_id: VariableId,
}

/// Result from a call to `establish_arc_consistency`.
pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Remove every candidate whose length doesn't match its variable.
pub fn establish_node_consistency(config: &PuzzleConfig, domains: &mut DomainStore) {
    for (variable_id, variable) in config.graph.variables().iter().enumerate() {
        domains.retain(variable_id, |&word_id| {
            config.word_list.words[word_id].len() == variable.length
        });
    }

    if CHECK_INVARIANTS {
        assert!(
            domains.is_node_consistent(config),
            "Domains not node-consistent after enforcement?"
        );
    }
}

/// Make `x` arc-consistent with `y` by removing each candidate for `x` whose letter in the
/// shared cell doesn't appear at that cell in any candidate for `y`. Only `x` is pruned. Returns
/// whether `x`'s domain shrank; variables that don't cross are left untouched.
pub fn revise(
    config: &PuzzleConfig,
    domains: &mut DomainStore,
    x: VariableId,
    y: VariableId,
) -> bool {
    let Some((x_cell_idx, y_cell_idx)) = config.graph.overlap(x, y) else {
        return false;
    };

    let supported = build_letter_counts(config.word_list, domains.options(y), y_cell_idx);

    domains.retain(x, |&word_id| {
        config.word_list.words[word_id]
            .glyphs
            .get(x_cell_idx)
            .map_or(false, |letter| supported.contains_key(letter))
    })
}

/// Every ordered pair of crossing variables.
#[must_use]
pub fn all_arcs(config: &PuzzleConfig) -> Vec<DirectedArc> {
    (0..config.graph.variable_count())
        .flat_map(|x| config.graph.neighbors(x).map(move |y| (x, y)))
        .collect()
}

/// Run AC-3 starting from the given arcs, or from every arc in the grid if none are given.
///
/// Arcs are pulled from the worklist in the order they were queued, so every starting arc is
/// revised before any requeued one. Whenever `revise(x, y)` shrinks
/// `x`, the arcs *leaving* `x` (`(x, n)` for each neighbor `n`) are queued again, so that `x`'s
/// smaller domain is rechecked against its neighbors. Arcs pointing *into* `x` aren't requeued,
/// so a successful run doesn't guarantee every arc still holds. If any domain becomes empty,
/// propagation stops and the failure names that variable.
pub fn establish_arc_consistency(
    config: &PuzzleConfig,
    domains: &mut DomainStore,
    arcs: Option<Vec<DirectedArc>>,
) -> ArcConsistencyResult {
    // An arc that's already waiting isn't queued twice.
    let mut worklist: VecDeque<DirectedArc> = VecDeque::new();
    let mut queued: HashSet<DirectedArc> = HashSet::new();
    for arc in arcs.unwrap_or_else(|| all_arcs(config)) {
        if queued.insert(arc) {
            worklist.push_back(arc);
        }
    }

    let mut revisions = 0;

    while let Some(arc) = worklist.pop_front() {
        queued.remove(&arc);
        let (x, y) = arc;

        if !revise(config, domains, x, y) {
            continue;
        }
        revisions += 1;
        trace!("revised {x} against {y}: {} options left", domains.len(x));

        if domains.is_empty(x) {
            debug!(
                "domain wipeout for {} after {revisions} revisions",
                config.graph.variable(x)
            );
            return Err(ArcConsistencyFailure { variable_id: x });
        }

        for neighbor in config.graph.neighbors(x) {
            if queued.insert((x, neighbor)) {
                worklist.push_back((x, neighbor));
            }
        }
    }

    // Only outgoing arcs are requeued, so an arc revised early can go stale when its target
    // shrinks later. Pruning never breaks node consistency, though.
    if CHECK_INVARIANTS {
        assert!(
            domains.is_node_consistent(config),
            "Domains lost node consistency during AC-3?"
        );
    }

    Ok(ArcConsistencySuccess { revisions })
}

#[cfg(test)]
mod tests {
    use crate::arc_consistency::{
        all_arcs, establish_arc_consistency, establish_node_consistency, revise,
        ArcConsistencyFailure, ArcConsistencySuccess,
    };
    use crate::domains::DomainStore;
    use crate::grid_config::{OwnedPuzzleConfig, PuzzleConfig};
    use crate::puzzle_graph::tests::{find_variable, STRUCTURE_0};
    use crate::puzzle_graph::Direction;
    use crate::word_list::tests::resource_path;
    use crate::word_list::WordList;

    fn structure_0_config() -> OwnedPuzzleConfig {
        let word_list = WordList::from_dict_file(&resource_path("words0.txt")).unwrap();
        OwnedPuzzleConfig::new(STRUCTURE_0, word_list).unwrap()
    }

    fn words(config: &PuzzleConfig, domains: &DomainStore, variable_id: usize) -> Vec<String> {
        let mut result: Vec<String> = domains
            .options(variable_id)
            .iter()
            .map(|&word_id| config.word_list.words[word_id].normalized_string.clone())
            .collect();
        result.sort();
        result
    }

    #[test]
    fn test_establish_node_consistency() {
        let owned = structure_0_config();
        let config = owned.to_config_ref();
        let mut domains = DomainStore::seed(&config);

        establish_node_consistency(&config, &mut domains);

        for (variable_id, variable) in config.graph.variables().iter().enumerate() {
            assert!(!domains.is_empty(variable_id));
            for &word_id in domains.options(variable_id) {
                assert_eq!(config.word_list.words[word_id].len(), variable.length);
            }
        }
        assert!(domains.is_node_consistent(&config));
        assert_eq!(
            words(&config, &domains, find_variable(config.graph, 0, 1, Direction::Down)),
            vec!["EIGHT", "SEVEN", "THREE"]
        );
    }

    #[test]
    fn test_revise_sequence() {
        let owned = structure_0_config();
        let config = owned.to_config_ref();
        let mut domains = DomainStore::seed(&config);
        establish_node_consistency(&config, &mut domains);

        let top = find_variable(config.graph, 0, 1, Direction::Across);
        let left = find_variable(config.graph, 0, 1, Direction::Down);
        let bottom = find_variable(config.graph, 4, 1, Direction::Across);
        let right = find_variable(config.graph, 1, 4, Direction::Down);

        assert!(revise(&config, &mut domains, top, left));
        assert_eq!(words(&config, &domains, top), vec!["SIX", "TEN", "TWO"]);

        assert!(revise(&config, &mut domains, left, top));
        assert_eq!(words(&config, &domains, left), vec!["SEVEN", "THREE"]);

        assert!(revise(&config, &mut domains, left, bottom));
        assert_eq!(words(&config, &domains, left), vec!["SEVEN"]);

        assert!(revise(&config, &mut domains, top, left));
        assert_eq!(words(&config, &domains, top), vec!["SIX"]);

        assert!(revise(&config, &mut domains, bottom, left));
        assert_eq!(words(&config, &domains, bottom), vec!["NINE"]);

        assert!(revise(&config, &mut domains, right, bottom));
        assert_eq!(words(&config, &domains, right), vec!["FIVE", "NINE"]);

        // Nothing left to prune, and non-crossing pairs are never revised.
        assert!(!revise(&config, &mut domains, right, bottom));
        assert!(!revise(&config, &mut domains, top, bottom));
    }

    #[test]
    fn test_revise_two_variable_crossing() {
        // The ACROSS word's last letter is the DOWN word's last letter.
        let owned = OwnedPuzzleConfig::new(
            "##_\n##_\n##_\n##_\n___",
            WordList::from_words(["SIX", "TEN", "TWO", "SEVEN", "THREE"]),
        )
        .unwrap();
        let config = owned.to_config_ref();
        let mut domains = DomainStore::seed(&config);
        establish_node_consistency(&config, &mut domains);

        let across = find_variable(config.graph, 4, 0, Direction::Across);
        let down = find_variable(config.graph, 0, 2, Direction::Down);
        assert_eq!(words(&config, &domains, across), vec!["SIX", "TEN", "TWO"]);
        assert_eq!(words(&config, &domains, down), vec!["SEVEN", "THREE"]);

        assert!(revise(&config, &mut domains, across, down));
        assert_eq!(words(&config, &domains, across), vec!["TEN"]);
        assert_eq!(
            words(&config, &domains, down),
            vec!["SEVEN", "THREE"],
            "revise only prunes its first argument"
        );

        assert!(revise(&config, &mut domains, down, across));
        assert_eq!(words(&config, &domains, down), vec!["SEVEN"]);
    }

    #[test]
    fn test_revise_shared_first_cell() {
        let owned = OwnedPuzzleConfig::new(
            "___\n_##\n_##\n_##\n_##",
            WordList::from_words(["SIX", "TEN", "TWO", "SEVEN", "THREE"]),
        )
        .unwrap();
        let config = owned.to_config_ref();
        let mut domains = DomainStore::seed(&config);
        establish_node_consistency(&config, &mut domains);

        let across = find_variable(config.graph, 0, 0, Direction::Across);
        let down = find_variable(config.graph, 0, 0, Direction::Down);

        // S and T both appear as first letters on each side.
        assert!(!revise(&config, &mut domains, across, down));

        let seven = config.word_list.word_id("SEVEN").unwrap();
        domains.set_options(down, vec![seven]);

        assert!(revise(&config, &mut domains, across, down));
        assert_eq!(words(&config, &domains, across), vec!["SIX"]);
    }

    #[test]
    fn test_establish_arc_consistency() {
        let owned = structure_0_config();
        let config = owned.to_config_ref();
        let mut domains = DomainStore::seed(&config);
        establish_node_consistency(&config, &mut domains);

        let result = establish_arc_consistency(&config, &mut domains, None);

        // Every starting arc is revised once before the requeued ones, which is enough here to
        // reach a fixed point after six shrinking revisions.
        assert_eq!(result, Ok(ArcConsistencySuccess { revisions: 6 }));
        assert!(domains.is_arc_consistent(&config));
        let graph = config.graph;
        assert_eq!(
            words(&config, &domains, find_variable(graph, 0, 1, Direction::Down)),
            vec!["SEVEN"]
        );
        assert_eq!(
            words(&config, &domains, find_variable(graph, 0, 1, Direction::Across)),
            vec!["SIX"]
        );
        assert_eq!(
            words(&config, &domains, find_variable(graph, 4, 1, Direction::Across)),
            vec!["NINE"]
        );
        assert_eq!(
            words(&config, &domains, find_variable(graph, 1, 4, Direction::Down)),
            vec!["FIVE", "NINE"]
        );
    }

    #[test]
    fn test_arc_consistency_is_idempotent() {
        let owned = structure_0_config();
        let config = owned.to_config_ref();
        let mut domains = DomainStore::seed(&config);
        establish_node_consistency(&config, &mut domains);
        establish_arc_consistency(&config, &mut domains, None).unwrap();

        let before = domains.clone();
        let result = establish_arc_consistency(&config, &mut domains, None).unwrap();

        assert_eq!(result.revisions, 0);
        assert_eq!(domains, before);
    }

    #[test]
    fn test_arc_consistency_wipeout() {
        let owned = OwnedPuzzleConfig::new(
            "___\n_##\n_##\n_##\n_##",
            WordList::from_words(["SIX", "TEN", "TWO", "BREAD", "CRUMB"]),
        )
        .unwrap();
        let config = owned.to_config_ref();
        let mut domains = DomainStore::seed(&config);
        establish_node_consistency(&config, &mut domains);

        let result = establish_arc_consistency(&config, &mut domains, None);

        let Err(ArcConsistencyFailure { variable_id }) = result else {
            panic!("Expected a domain wipeout");
        };
        assert!(domains.is_empty(variable_id));
    }

    #[test]
    fn test_restricted_arcs() {
        let owned = structure_0_config();
        let config = owned.to_config_ref();
        let mut domains = DomainStore::seed(&config);
        establish_node_consistency(&config, &mut domains);

        let left = find_variable(config.graph, 0, 1, Direction::Down);
        let right = find_variable(config.graph, 1, 4, Direction::Down);
        let bottom = find_variable(config.graph, 4, 1, Direction::Across);
        domains.narrow_to(bottom, config.word_list.word_id("FOUR").unwrap());

        establish_arc_consistency(&config, &mut domains, Some(vec![(right, bottom)])).unwrap();

        assert_eq!(words(&config, &domains, right), vec!["FOUR"]);
        assert_eq!(
            words(&config, &domains, left),
            vec!["EIGHT", "SEVEN", "THREE"],
            "arcs not reachable from the starting set are left alone"
        );
    }

    #[test]
    fn test_all_arcs() {
        let owned = structure_0_config();
        let config = owned.to_config_ref();

        let arcs = all_arcs(&config);

        assert_eq!(arcs.len(), 6);
        for &(x, y) in &arcs {
            assert!(arcs.contains(&(y, x)));
            assert!(config.graph.overlap(x, y).is_some());
        }
    }
}
