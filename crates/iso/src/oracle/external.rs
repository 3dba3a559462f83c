use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use typed_builder::TypedBuilder;

use super::{IsomorphismOracle, OracleError};
use crate::graph::ExportedGraph;
use crate::worker::CancelFlag;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A VF3-compatible solver executable.
///
/// Each query writes both graphs to scratch files in edge-list form and runs
///
/// ```text
/// <executable> [launcher args..] -a <strategy> -t <threads> <pattern> <target>
/// ```
///
/// The first whitespace-separated token on stdout is read as the number of
/// embeddings of `pattern` into `target`. Scratch files are removed when the
/// query returns, on success and failure alike.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ExternalSolver {
    #[builder(setter(into))]
    executable: PathBuf,
    /// Arguments placed before the solver options, e.g. a script path when
    /// `executable` is an interpreter.
    #[builder(default)]
    launcher_args: Vec<String>,
    #[builder(default = 1)]
    strategy: u32,
    #[builder(default = 8)]
    threads: u32,
    /// Wall-clock limit for one solver process; unlimited when unset.
    #[builder(default, setter(strip_option))]
    timeout: Option<Duration>,
    /// Where scratch files go; the system temp dir when unset.
    #[builder(default, setter(strip_option, into))]
    scratch_dir: Option<PathBuf>,
}

impl ExternalSolver {
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Runs the solver once and returns the reported solution count.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Io`] if scratch files cannot be written or the
    ///   process cannot be started.
    /// - [`OracleError::SolverTimeout`] if the process outlives `timeout`.
    /// - [`OracleError::Cancelled`] if `cancel` is raised while it runs.
    /// - [`OracleError::SolverProcessFailure`] on a non-zero exit.
    /// - [`OracleError::SolverOutput`] if stdout carries no count.
    pub fn count_solutions(
        &self,
        pattern: &ExportedGraph,
        target: &ExportedGraph,
        cancel: &CancelFlag,
    ) -> Result<u64, OracleError> {
        if cancel.is_cancelled() {
            return Err(OracleError::Cancelled);
        }

        let pattern_file = self.scratch(pattern)?;
        let target_file = self.scratch(target)?;

        let mut child = Command::new(&self.executable)
            .args(&self.launcher_args)
            .arg("-a")
            .arg(self.strategy.to_string())
            .arg("-t")
            .arg(self.threads.to_string())
            .arg(pattern_file.path())
            .arg(target_file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        tracing::trace!(
            solver = %self.executable.display(),
            pid = child.id(),
            "spawned solver"
        );

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let (status, stdout, stderr) = thread::scope(|scope| {
            let stdout = scope.spawn(move || drain(stdout_pipe));
            let stderr = scope.spawn(move || drain(stderr_pipe));
            let status = self.wait(&mut child, cancel);
            (status, join(stdout), join(stderr))
        });

        let status = status?;
        let stdout = stdout?;
        let stderr = stderr?;

        if !status.success() {
            return Err(OracleError::SolverProcessFailure { status, stderr });
        }

        parse_count(&stdout).ok_or(OracleError::SolverOutput { stdout })
    }

    fn scratch(&self, graph: &ExportedGraph) -> io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("histiso-").suffix(".grf");
        let mut file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(graph.edge_list().as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    /// Waits for `child` to exit; kills and reaps it on timeout or cancel.
    ///
    /// The child has always terminated when this returns.
    fn wait(&self, child: &mut Child, cancel: &CancelFlag) -> Result<ExitStatus, OracleError> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(err) => {
                    reap(child);
                    return Err(err.into());
                }
            }
            if cancel.is_cancelled() {
                reap(child);
                return Err(OracleError::Cancelled);
            }
            if let Some(timeout) = self.timeout {
                if started.elapsed() >= timeout {
                    tracing::warn!(
                        solver = %self.executable.display(),
                        ?timeout,
                        "killing solver"
                    );
                    reap(child);
                    return Err(OracleError::SolverTimeout { timeout });
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn reap(child: &mut Child) {
    if let Err(err) = child.kill() {
        tracing::debug!(%err, "kill failed");
    }
    if let Err(err) = child.wait() {
        tracing::debug!(%err, "wait failed");
    }
}

fn drain(pipe: Option<impl Read>) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

fn parse_count(stdout: &str) -> Option<u64> {
    stdout.split_whitespace().next()?.parse().ok()
}

impl IsomorphismOracle for ExternalSolver {
    fn name(&self) -> &'static str {
        "external-solver"
    }

    fn are_isomorphic(
        &self,
        a: &ExportedGraph,
        b: &ExportedGraph,
        cancel: &CancelFlag,
    ) -> Result<bool, OracleError> {
        // an embedding between equal-sized graphs is a full isomorphism
        if a.node_count() != b.node_count() || a.edge_count() != b.edge_count() {
            return Ok(false);
        }
        Ok(self.count_solutions(a, b, cancel)? > 0)
    }

    fn has_subgraph_isomorphic(
        &self,
        small: &ExportedGraph,
        big: &ExportedGraph,
        cancel: &CancelFlag,
    ) -> Result<bool, OracleError> {
        Ok(self.count_solutions(small, big, cancel)? > 0)
    }
}
