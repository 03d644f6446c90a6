pub mod arc_consistency;
pub mod backtracking_search;
pub mod domains;
pub mod grid_config;
pub mod puzzle_graph;
pub mod types;
pub mod util;
pub mod word_list;

/// When enabled, re-verify domain invariants after every consistency pass and panic on violation.
pub const CHECK_INVARIANTS: bool = cfg!(feature = "check_invariants");

/// The expected maximum length for a single variable; words up to this length keep their
/// characters inline.
pub const MAX_SLOT_LENGTH: usize = 21;
