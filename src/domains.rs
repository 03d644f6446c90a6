use std::fmt;
use std::fmt::{Debug, Formatter};

use crate::grid_config::PuzzleConfig;
use crate::types::{VariableId, WordId};

/// The live candidate words for each variable, indexed by `VariableId`. Each domain is kept in
/// ascending `WordId` order, and domains only ever shrink except when a snapshot is restored.
#[derive(Clone, PartialEq, Eq)]
pub struct DomainStore {
    domains: Vec<Vec<WordId>>,
}

impl DomainStore {
    /// Give every variable a full copy of the vocabulary.
    #[must_use]
    pub fn seed(config: &PuzzleConfig) -> DomainStore {
        let vocabulary: Vec<WordId> = config.word_list.word_ids().collect();

        DomainStore {
            domains: vec![vocabulary; config.graph.variable_count()],
        }
    }

    /// The current candidates for a variable, in ascending id order.
    #[must_use]
    pub fn options(&self, variable_id: VariableId) -> &[WordId] {
        &self.domains[variable_id]
    }

    #[must_use]
    pub fn len(&self, variable_id: VariableId) -> usize {
        self.domains[variable_id].len()
    }

    #[must_use]
    pub fn is_empty(&self, variable_id: VariableId) -> bool {
        self.domains[variable_id].is_empty()
    }

    #[must_use]
    pub fn contains(&self, variable_id: VariableId, word_id: WordId) -> bool {
        self.domains[variable_id].binary_search(&word_id).is_ok()
    }

    #[must_use]
    pub fn variable_count(&self) -> usize {
        self.domains.len()
    }

    /// Keep only the candidates matching the predicate. Returns whether the domain shrank.
    pub fn retain<F>(&mut self, variable_id: VariableId, predicate: F) -> bool
    where
        F: FnMut(&WordId) -> bool,
    {
        let domain = &mut self.domains[variable_id];
        let before = domain.len();
        domain.retain(predicate);
        domain.len() < before
    }

    /// Reduce a variable's domain to a single word.
    pub fn narrow_to(&mut self, variable_id: VariableId, word_id: WordId) {
        self.domains[variable_id] = vec![word_id];
    }

    /// Replace a variable's domain outright; the given options are sorted and deduplicated.
    pub fn set_options(&mut self, variable_id: VariableId, mut options: Vec<WordId>) {
        options.sort_unstable();
        options.dedup();
        self.domains[variable_id] = options;
    }

    /// Copy the full store so it can be put back with `restore` after a speculative branch.
    #[must_use]
    pub fn snapshot(&self) -> DomainStore {
        self.clone()
    }

    pub fn restore(&mut self, snapshot: DomainStore) {
        *self = snapshot;
    }

    /// Is every candidate the same length as its variable?
    #[must_use]
    pub fn is_node_consistent(&self, config: &PuzzleConfig) -> bool {
        self.domains.iter().enumerate().all(|(variable_id, domain)| {
            let length = config.graph.variable(variable_id).length;
            domain
                .iter()
                .all(|&word_id| config.word_list.words[word_id].len() == length)
        })
    }

    /// Does every candidate of every variable have a compatible candidate in each neighbor?
    #[must_use]
    pub fn is_arc_consistent(&self, config: &PuzzleConfig) -> bool {
        (0..self.domains.len()).all(|x| {
            config.graph.crossings(x).iter().all(|crossing| {
                self.domains[x].iter().all(|&word_id| {
                    let letter = config.word_list.words[word_id].glyphs.get(crossing.cell_idx);
                    self.domains[crossing.other_variable_id]
                        .iter()
                        .any(|&other_word_id| {
                            letter.is_some()
                                && config.word_list.words[other_word_id]
                                    .glyphs
                                    .get(crossing.other_cell_idx)
                                    == letter
                        })
                })
            })
        })
    }
}

impl Debug for DomainStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.domains.iter().map(Vec::len))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::domains::DomainStore;
    use crate::grid_config::OwnedPuzzleConfig;
    use crate::word_list::WordList;

    #[test]
    fn test_seed_and_snapshot() {
        let owned = OwnedPuzzleConfig::new(
            "___\n_##\n_##",
            WordList::from_words(["ONE", "TWO", "SIX"]),
        )
        .unwrap();
        let config = owned.to_config_ref();

        let mut domains = DomainStore::seed(&config);
        assert_eq!(domains.variable_count(), 2);
        assert_eq!(domains.options(0), &[0, 1, 2]);
        assert_eq!(domains.options(1), &[0, 1, 2]);

        let snapshot = domains.snapshot();

        assert!(domains.retain(0, |&word_id| word_id != 1));
        assert!(!domains.retain(0, |_| true));
        domains.narrow_to(1, 2);
        assert_eq!(domains.options(0), &[0, 2]);
        assert!(domains.contains(1, 2));
        assert!(!domains.contains(1, 0));

        domains.restore(snapshot);
        assert_eq!(domains.options(0), &[0, 1, 2]);
        assert_eq!(domains.len(1), 3);
    }

    #[test]
    fn test_set_options_sorts() {
        let owned =
            OwnedPuzzleConfig::new("__", WordList::from_words(["AB", "CD", "EF"])).unwrap();
        let mut domains = DomainStore::seed(&owned.to_config_ref());

        domains.set_options(0, vec![2, 0, 2]);

        assert_eq!(domains.options(0), &[0, 2]);
        assert!(!domains.is_empty(0));
    }
}
