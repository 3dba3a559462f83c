//! Shared fixtures: log-to-graph helper and scripted oracles.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use histiso_core::graph::builder::build;
use histiso_iso::{CancelFlag, ExportedGraph, IsomorphismOracle, OracleError};
use histiso_parser::{decode_str, Policy};

/// Decodes a log strictly and exports its conflict graph.
pub fn graph_from_log(log: &str) -> ExportedGraph {
    let statements = decode_str(log, Policy::Strict).expect("test log is well formed");
    ExportedGraph::new(&build(&statements))
}

/// Shared observation points for scripted oracles.
#[derive(Debug, Default, Clone)]
pub struct Tally {
    pub calls: Arc<AtomicUsize>,
    pub finished: Arc<AtomicBool>,
}

impl Tally {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Oracle that takes `delay` before answering `answer`.
///
/// A cooperative one gives up as soon as it sees the cancel flag; an
/// uncooperative one sleeps through it. Either way `tally.finished` is set
/// when the call returns.
#[derive(Debug, Clone)]
pub struct Stalling {
    pub delay: Duration,
    pub answer: bool,
    pub cooperative: bool,
    pub tally: Tally,
}

impl Stalling {
    fn run(&self, cancel: &CancelFlag) -> Result<bool, OracleError> {
        self.tally.calls.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();
        let result = loop {
            if self.cooperative && cancel.is_cancelled() {
                break Err(OracleError::Cancelled);
            }
            if started.elapsed() >= self.delay {
                break Ok(self.answer);
            }
            thread::sleep(Duration::from_millis(5));
        };
        self.tally.finished.store(true, Ordering::SeqCst);
        result
    }
}

impl IsomorphismOracle for Stalling {
    fn name(&self) -> &'static str {
        "stalling"
    }

    fn are_isomorphic(
        &self,
        _: &ExportedGraph,
        _: &ExportedGraph,
        cancel: &CancelFlag,
    ) -> Result<bool, OracleError> {
        self.run(cancel)
    }

    fn has_subgraph_isomorphic(
        &self,
        _: &ExportedGraph,
        _: &ExportedGraph,
        cancel: &CancelFlag,
    ) -> Result<bool, OracleError> {
        self.run(cancel)
    }
}

/// Oracle answering `answer` at once, recording whether `primary` had
/// already finished when it was asked.
#[derive(Debug, Clone)]
pub struct Recording {
    pub answer: bool,
    pub tally: Tally,
    pub primary: Tally,
    pub primary_done_first: Arc<AtomicBool>,
    pub subgraph_calls: Arc<AtomicUsize>,
}

impl Recording {
    pub fn new(answer: bool, primary: Tally) -> Self {
        Self {
            answer,
            tally: Tally::default(),
            primary,
            primary_done_first: Arc::new(AtomicBool::new(false)),
            subgraph_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn run(&self) -> Result<bool, OracleError> {
        self.tally.calls.fetch_add(1, Ordering::SeqCst);
        self.primary_done_first
            .store(self.primary.finished(), Ordering::SeqCst);
        Ok(self.answer)
    }
}

impl IsomorphismOracle for Recording {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn are_isomorphic(
        &self,
        _: &ExportedGraph,
        _: &ExportedGraph,
        _: &CancelFlag,
    ) -> Result<bool, OracleError> {
        self.run()
    }

    fn has_subgraph_isomorphic(
        &self,
        _: &ExportedGraph,
        _: &ExportedGraph,
        _: &CancelFlag,
    ) -> Result<bool, OracleError> {
        self.subgraph_calls.fetch_add(1, Ordering::SeqCst);
        self.run()
    }
}

/// Oracle that always fails with an unparsable-output error.
#[derive(Debug, Clone, Copy)]
pub struct Broken;

impl IsomorphismOracle for Broken {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn are_isomorphic(
        &self,
        _: &ExportedGraph,
        _: &ExportedGraph,
        _: &CancelFlag,
    ) -> Result<bool, OracleError> {
        Err(OracleError::SolverOutput {
            stdout: "oops".to_owned(),
        })
    }

    fn has_subgraph_isomorphic(
        &self,
        a: &ExportedGraph,
        b: &ExportedGraph,
        cancel: &CancelFlag,
    ) -> Result<bool, OracleError> {
        self.are_isomorphic(a, b, cancel)
    }
}
