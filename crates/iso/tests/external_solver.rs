#![cfg(unix)]

mod common;

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use common::graph_from_log;
use histiso_iso::{CancelFlag, ExportedGraph, ExternalSolver, IsomorphismOracle, OracleError};
use tempfile::TempDir;

const TWO_NODES: &str = "$_$_$ Op: BEGIN Tx: 1 $_$_$ Op: BEGIN Tx: 2";
const EDGE: &str = "\
$_$_$ Op: BEGIN Tx: 1
$_$_$ Op: BEGIN Tx: 2
$_$_$ Op: WRITE Tx: 1 Obj: x
$_$_$ Op: WRITE Tx: 2 Obj: x
";
const THREE_NODES: &str = "$_$_$ Op: BEGIN Tx: 1 $_$_$ Op: BEGIN Tx: 2 $_$_$ Op: BEGIN Tx: 3";

/// A solver stand-in: `sh <script> -a .. -t .. <pattern> <target>`.
///
/// Scripts are run through the interpreter rather than executed directly,
/// and `exec` their last command so a kill reaches it.
struct Fixture {
    scripts: TempDir,
    scratch: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            scripts: tempfile::tempdir().unwrap(),
            scratch: tempfile::tempdir().unwrap(),
        }
    }

    fn solver(&self, body: &str) -> ExternalSolver {
        let script = self.scripts.path().join("solver.sh");
        fs::write(&script, body).unwrap();
        ExternalSolver::builder()
            .executable("sh")
            .launcher_args(vec![script.display().to_string()])
            .scratch_dir(self.scratch.path())
            .build()
    }

    fn scratch_is_empty(&self) -> bool {
        is_empty(self.scratch.path())
    }
}

fn is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

fn pair() -> (ExportedGraph, ExportedGraph) {
    (graph_from_log(TWO_NODES), graph_from_log(TWO_NODES))
}

// -- Solution counts -----------------------------------------------------

#[test]
fn positive_count_means_isomorphic() {
    let fixture = Fixture::new();
    let solver = fixture.solver("exec echo '3 0.01 0.02'\n");
    let (a, b) = pair();

    assert!(solver.are_isomorphic(&a, &b, &CancelFlag::new()).unwrap());
    assert_eq!(
        solver.count_solutions(&a, &b, &CancelFlag::new()).unwrap(),
        3
    );
    assert!(fixture.scratch_is_empty());
}

#[test]
fn zero_count_means_not_isomorphic() {
    let fixture = Fixture::new();
    let solver = fixture.solver("exec echo 0\n");
    let (a, b) = pair();

    assert!(!solver.are_isomorphic(&a, &b, &CancelFlag::new()).unwrap());
    assert!(!solver
        .has_subgraph_isomorphic(&a, &b, &CancelFlag::new())
        .unwrap());
}

#[test]
fn solver_gets_options_and_edge_list_files() {
    let fixture = Fixture::new();
    let solver = fixture.solver(
        r#"[ "$1 $2 $3 $4" = "-a 1 -t 8" ] || exit 7
test -f "$5" && test -f "$6" || exit 8
exec echo "$(head -n 1 "$5")"
"#,
    );
    let small = graph_from_log(TWO_NODES);
    let big = graph_from_log(THREE_NODES);

    // the pattern file comes first, its first line is the node count
    assert_eq!(
        solver
            .count_solutions(&small, &big, &CancelFlag::new())
            .unwrap(),
        2
    );
}

#[test]
fn differing_sizes_are_rejected_without_spawning() {
    let solver = ExternalSolver::builder()
        .executable("/nonexistent/histiso-solver")
        .build();
    let two = graph_from_log(TWO_NODES);
    let three = graph_from_log(THREE_NODES);
    let edge = graph_from_log(EDGE);
    let flag = CancelFlag::new();

    assert!(!solver.are_isomorphic(&two, &three, &flag).unwrap());
    assert!(!solver.are_isomorphic(&two, &edge, &flag).unwrap());
}

// -- Failures ------------------------------------------------------------

#[test]
fn nonzero_exit_is_process_failure() {
    let fixture = Fixture::new();
    let solver = fixture.solver("echo 5\necho boom >&2\nexit 3\n");
    let (a, b) = pair();

    let err = solver.are_isomorphic(&a, &b, &CancelFlag::new()).unwrap_err();
    match err {
        OracleError::SolverProcessFailure { status, stderr } => {
            assert_eq!(status.code(), Some(3));
            assert_eq!(stderr.trim(), "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(fixture.scratch_is_empty());
}

#[test]
fn unparsable_output_is_an_error() {
    let fixture = Fixture::new();
    let (a, b) = pair();

    for body in ["exec echo 'no solutions here'\n", "exit 0\n"] {
        let solver = fixture.solver(body);
        let err = solver.are_isomorphic(&a, &b, &CancelFlag::new()).unwrap_err();
        assert!(
            matches!(err, OracleError::SolverOutput { .. }),
            "{body:?} gave {err}"
        );
    }
    assert!(fixture.scratch_is_empty());
}

#[test]
fn missing_executable_is_io_error() {
    let scratch = tempfile::tempdir().unwrap();
    let solver = ExternalSolver::builder()
        .executable("/nonexistent/histiso-solver")
        .scratch_dir(scratch.path())
        .build();
    let (a, b) = pair();

    let err = solver.are_isomorphic(&a, &b, &CancelFlag::new()).unwrap_err();
    assert!(matches!(err, OracleError::Io(_)));
    assert!(is_empty(scratch.path()));
}

// -- Timeout and cancellation --------------------------------------------

#[test]
fn slow_solver_is_killed_at_timeout() {
    let fixture = Fixture::new();
    let script = fixture.scripts.path().join("slow.sh");
    fs::write(&script, "exec sleep 30\n").unwrap();
    let solver = ExternalSolver::builder()
        .executable("sh")
        .launcher_args(vec![script.display().to_string()])
        .timeout(Duration::from_millis(100))
        .scratch_dir(fixture.scratch.path())
        .build();
    let (a, b) = pair();

    let started = Instant::now();
    let err = solver.are_isomorphic(&a, &b, &CancelFlag::new()).unwrap_err();
    assert!(matches!(
        err,
        OracleError::SolverTimeout { timeout } if timeout == Duration::from_millis(100)
    ));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(fixture.scratch_is_empty());
}

#[test]
fn raised_flag_cancels_before_spawning() {
    let solver = ExternalSolver::builder()
        .executable("/nonexistent/histiso-solver")
        .build();
    let (a, b) = pair();
    let flag = CancelFlag::new();
    flag.cancel();

    assert!(matches!(
        solver.are_isomorphic(&a, &b, &flag),
        Err(OracleError::Cancelled)
    ));
}
