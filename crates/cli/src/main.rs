use std::path::Path;
use std::{fs, process};

use clap::Parser;
use histiso_cli::{
    classify_file, discover, load_history, App, Command, CountArgs, ElleArgs, FileOutcome,
    GenerateArgs, GraphArgs, ValidateArgs,
};
use histiso_core::graph::builder::build;
use histiso_core::graph::export::to_edge_list;
use histiso_core::history::elle::to_elle;
use histiso_core::history::validate::validate;
use histiso_core::Statement;
use histiso_iso::graph::to_dot;
use histiso_iso::{
    Comparison, DedupConfig, DedupEngine, ExternalSolver, IsomorphismOracle, LibraryOracle,
};
use histiso_parser::Policy;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app = App::parse();
    match &app.command {
        Command::Count(args) => count(args),
        Command::Graph(args) => graph(args),
        Command::Validate(args) => validate_file(args),
        Command::Generate(args) => generate(args),
        Command::Elle(args) => elle(args),
    }
}

const fn policy(strict: bool) -> Policy {
    if strict {
        Policy::Strict
    } else {
        Policy::Lenient
    }
}

fn load(path: &Path, policy: Policy) -> Vec<Statement<String>> {
    load_history(path, policy).unwrap_or_else(|e| {
        eprintln!("{}: {e}", path.display());
        process::exit(1);
    })
}

fn fallback(args: &CountArgs) -> Box<dyn IsomorphismOracle> {
    let Some(executable) = &args.solver else {
        return Box::new(LibraryOracle);
    };
    let solver = ExternalSolver::builder()
        .executable(executable.clone())
        .strategy(args.solver_strategy)
        .threads(args.solver_threads);
    match args.solver_timeout {
        Some(timeout) => Box::new(solver.timeout(timeout).build()),
        None => Box::new(solver.build()),
    }
}

fn count(args: &CountArgs) {
    let files = discover(&args.dir, &args.file_name, args.limit).unwrap_or_else(|e| {
        eprintln!("Failed to read input directory: {e}");
        process::exit(1);
    });

    if files.is_empty() {
        eprintln!("No {} files found in {}", args.file_name, args.dir.display());
        process::exit(1);
    }

    let config = DedupConfig::builder()
        .deadline(args.deadline)
        .comparison(if args.subgraph_shortcut {
            Comparison::SubgraphShortcut
        } else {
            Comparison::Exact
        })
        .build();
    let mut engine = DedupEngine::new(LibraryOracle, fallback(args), config);

    let mut skipped = 0_usize;
    for path in &files {
        let label = path.display().to_string();
        let outcome = classify_file(&mut engine, path, policy(args.strict), args.validate)
            .unwrap_or_else(|e| {
                eprintln!("Failed to classify {label}: {e}");
                process::exit(1);
            });

        let outcome = match outcome {
            FileOutcome::Classified(outcome) => outcome,
            FileOutcome::Skipped(reason) => {
                skipped += 1;
                if args.json {
                    let result = serde_json::json!({
                        "file": label,
                        "skipped": true,
                        "error": reason,
                    });
                    println!("{}", serde_json::to_string(&result).unwrap());
                } else {
                    println!("{label}: SKIPPED ({reason})");
                }
                continue;
            }
        };

        if args.json {
            let result = serde_json::json!({
                "file": label,
                "classification": outcome.classification,
                "record": outcome.record,
            });
            println!("{}", serde_json::to_string(&result).unwrap());
        } else {
            let record = outcome.record;
            let class = outcome.classification.class();
            let status = if outcome.classification.is_novel() {
                format!("NEW #{class}")
            } else {
                format!("DUPLICATE of #{class}")
            };
            println!(
                "{label}: {status} ({} processed, {} distinct, {:.3}s)",
                record.total_processed, record.distinct_count, record.elapsed_seconds
            );
        }
    }

    let stats = engine.stats();
    tracing::info!(
        library_answers = stats.library_answers,
        library_timeouts = stats.library_timeouts,
        fallback_answers = stats.fallback_answers,
        skipped,
        "done"
    );

    if args.json {
        let summary = serde_json::json!({
            "processed": engine.processed(),
            "skipped": skipped,
            "distinct_count": engine.distinct_count(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&summary).unwrap());
    } else {
        println!("Number of non-isomorphic graphs: {}", engine.distinct_count());
    }
}

fn graph(args: &GraphArgs) {
    let statements = load(&args.file, policy(args.strict));
    let graph = build(&statements);
    if args.dot {
        print!("{}", to_dot(&graph));
    } else {
        println!("{}", to_edge_list(&graph, args.comments));
    }
}

fn validate_file(args: &ValidateArgs) {
    let statements = load(&args.file, policy(args.strict));
    let filename = args.file.display();
    match validate(&statements) {
        Ok(()) => println!("{filename}: OK ({} statements)", statements.len()),
        Err(e) => {
            println!("{filename}: INVALID ({e})");
            process::exit(1);
        }
    }
}

fn generate(args: &GenerateArgs) {
    fs::create_dir_all(&args.output_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create output directory: {e}");
        process::exit(1);
    });

    let histories = histiso_testgen::generator::generate_mult_histories(
        args.n_hist,
        args.n_session,
        args.n_object,
        args.n_txn,
        args.n_op,
    );

    histiso_testgen::generator::write_history_tree(&args.output_dir, &histories, &args.file_name)
        .unwrap_or_else(|e| {
            eprintln!("Failed to write histories: {e}");
            process::exit(1);
        });

    println!(
        "Generated {} histories to {}",
        histories.len(),
        args.output_dir.display()
    );
}

fn elle(args: &ElleArgs) {
    let statements = load(&args.file, policy(args.strict));
    let history = to_elle(&statements);
    fs::write(&args.output, history.to_string()).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {e}", args.output.display());
        process::exit(1);
    });
    println!(
        "Wrote {} events to {}",
        history.len(),
        args.output.display()
    );
}
