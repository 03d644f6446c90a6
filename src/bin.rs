use clap::{Parser, ValueEnum};
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::PathBuf;
use wordfill_core::backtracking_search::{find_fill, DomainRollback, SearchConfig};
use wordfill_core::grid_config::{render_grid, OwnedPuzzleConfig};
use wordfill_core::word_list::WordList;

/// wordfill: Command-line crossword word fill tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the structure file, with _ representing fillable squares and anything else a block
    structure_path: PathBuf,

    /// Path to the word list file, one word per line
    words_path: PathBuf,

    /// Path to write the filled grid to, as plain text with █ for blocks [default: none]
    output_path: Option<PathBuf>,

    /// Seed used to break ties between equally good variables and words [default: id order]
    #[arg(long)]
    seed: Option<u64>,

    /// What happens to pruned domains when the search backtracks
    #[arg(long, value_enum, default_value_t = Rollback::Snapshot)]
    rollback: Rollback,

    /// Skip arc consistency after each tentative assignment
    #[arg(long)]
    no_propagation: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Rollback {
    Snapshot,
    Retain,
}

impl From<Rollback> for DomainRollback {
    fn from(rollback: Rollback) -> Self {
        match rollback {
            Rollback::Snapshot => DomainRollback::Snapshot,
            Rollback::Retain => DomainRollback::Retain,
        }
    }
}

struct Error(String);

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0) // Print error unquoted
    }
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let structure = fs::read_to_string(&args.structure_path).map_err(|_| {
        Error(format!(
            "Couldn't read file '{}'",
            args.structure_path.display()
        ))
    })?;

    let word_list =
        WordList::from_dict_file(&args.words_path).map_err(|error| Error(error.to_string()))?;

    #[allow(clippy::comparison_chain)]
    if word_list.errors.len() == 1 {
        return Err(Error(format!("{}", word_list.errors[0])));
    } else if word_list.errors.len() > 1 {
        let mut full_error: String = "".into();
        for error in &word_list.errors {
            full_error.push_str(&format!("\n- {error}"));
        }
        return Err(Error(full_error));
    }

    if word_list.is_empty() {
        return Err(Error("Word list is empty".into()));
    }

    let puzzle_config =
        OwnedPuzzleConfig::new(&structure, word_list).map_err(|error| Error(error.to_string()))?;
    let config = puzzle_config.to_config_ref();

    let search_config = SearchConfig {
        rollback: args.rollback.into(),
        maintain_arc_consistency: !args.no_propagation,
        rng_seed: args.seed,
    };

    let Ok(result) = find_fill(&config, &search_config) else {
        println!("No solution.");
        return Ok(());
    };

    let rendered = render_grid(&config, &result.assignment);
    println!("{rendered}");

    if let Some(output_path) = args.output_path {
        fs::write(&output_path, rendered + "\n").map_err(|_| {
            Error(format!("Couldn't write file '{}'", output_path.display()))
        })?;
    }

    Ok(())
}
