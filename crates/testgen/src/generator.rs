use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use histiso_core::history::display::format_log;
use histiso_core::history::statement::Statement;
use rand::distr::{Distribution, Uniform};
use rand::RngExt;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

#[derive(Clone, Debug, Default, Deserialize, Serialize, TypedBuilder)]
pub struct HistParams {
    pub id: u64,
    pub n_session: u64,
    pub n_object: u64,
    pub n_transaction: u64,
    pub n_operation: u64,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct History {
    params: HistParams,
    statements: Vec<Statement<String>>,
}

impl History {
    #[must_use]
    pub const fn new(params: HistParams, statements: Vec<Statement<String>>) -> Self {
        Self { params, statements }
    }

    #[must_use]
    pub const fn get_id(&self) -> u64 {
        self.params.id
    }

    #[must_use]
    pub const fn get_statements(&self) -> &Vec<Statement<String>> {
        &self.statements
    }

    #[must_use]
    pub const fn get_params(&self) -> &HistParams {
        &self.params
    }

    /// Renders the history in the log text format.
    #[must_use]
    pub fn to_log(&self) -> String {
        format_log(&self.statements)
    }
}

/// Generate a single well-formed history.
///
/// Sessions are numbered `1..=n_session`. Each session runs `n_transaction`
/// transactions one after another, each being `BEGIN`, `n_operation` random
/// reads or writes over objects `obj0..obj{n_object - 1}`, then `COMMIT`.
/// Sessions are interleaved at random, statement by statement, so the result
/// exercises session-id reuse and cross-session conflicts while staying
/// well formed.
///
/// # Panics
///
/// Panics if `n_object` is zero (cannot create a uniform distribution over
/// an empty range).
#[must_use]
pub fn generate_single_history(
    n_session: u64,
    n_object: u64,
    n_transaction: u64,
    n_operation: u64,
) -> Vec<Statement<String>> {
    let mut random_generator = rand::rng();
    let object_range = Uniform::new(0, n_object).unwrap();

    let mut scripts: Vec<VecDeque<Statement<String>>> = (1..=n_session)
        .map(|session| {
            let mut script = VecDeque::new();
            for _ in 0..n_transaction {
                script.push_back(Statement::begin(session));
                for _ in 0..n_operation {
                    let object = format!("obj{}", object_range.sample(&mut random_generator));
                    if random_generator.random::<bool>() {
                        script.push_back(Statement::read(session, object));
                    } else {
                        script.push_back(Statement::write(session, object));
                    }
                }
                script.push_back(Statement::commit(session));
            }
            script
        })
        .collect();

    let mut statements = Vec::new();
    loop {
        scripts.retain(|script| !script.is_empty());
        if scripts.is_empty() {
            break;
        }
        let pick = random_generator.random_range(0..scripts.len());
        statements.extend(scripts[pick].pop_front());
    }
    statements
}

#[must_use]
pub fn generate_mult_histories(
    n_hist: u64,
    n_session: u64,
    n_object: u64,
    n_transaction: u64,
    n_operation: u64,
) -> Vec<History> {
    (0..n_hist)
        .into_par_iter()
        .map(|i_hist| History {
            params: HistParams {
                id: i_hist,
                n_session,
                n_object,
                n_transaction,
                n_operation,
            },
            statements: generate_single_history(n_session, n_object, n_transaction, n_operation),
        })
        .collect()
}

/// Writes every history to `<dir>/<id>/<file_name>`, the layout the
/// `count` command walks.
///
/// # Errors
///
/// Returns the first I/O error hit while creating directories or files.
pub fn write_history_tree(
    dir: &Path,
    histories: &[History],
    file_name: &str,
) -> io::Result<Vec<PathBuf>> {
    histories
        .iter()
        .map(|history| {
            let history_dir = dir.join(history.get_id().to_string());
            fs::create_dir_all(&history_dir)?;
            let path = history_dir.join(file_name);
            fs::write(&path, history.to_log())?;
            Ok(path)
        })
        .collect()
}
