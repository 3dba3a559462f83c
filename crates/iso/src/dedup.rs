//! Deduplication of conflict graphs up to isomorphism.
//!
//! [`DedupEngine`] keeps one representative per isomorphism class seen so
//! far. Each new graph is compared against the representatives in order; the
//! first match makes it a duplicate, no match makes it the representative of
//! a new class.
//!
//! Every comparison goes through two tiers. The primary oracle runs under a
//! deadline on a bounded worker ([`run_bounded`]); if it answers in time the
//! answer is final. Otherwise the worker is cancelled and joined, and the
//! fallback oracle decides the pair with no deadline of its own.

use std::time::{Duration, Instant};

use typed_builder::TypedBuilder;

use crate::graph::ExportedGraph;
use crate::oracle::{by_size, IsomorphismOracle, OracleError};
use crate::worker::{run_bounded, Bounded, CancelFlag};

/// Deadline for one primary-oracle comparison unless configured otherwise.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

/// Which question the oracles are asked for a pair.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Full isomorphism for every pair.
    #[default]
    Exact,
    /// Subgraph isomorphism of the smaller graph into the larger when both
    /// have the same number of nodes; full isomorphism otherwise.
    ///
    /// With equal node counts an embedding can still miss edges of the larger
    /// graph, so this may merge graphs that differ only by extra edges.
    SubgraphShortcut,
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct DedupConfig {
    #[builder(default = DEFAULT_DEADLINE)]
    pub deadline: Duration,
    #[builder(default)]
    pub comparison: Comparison,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// First graph seen of an isomorphism class.
#[derive(Debug, Clone)]
pub struct Representative {
    label: String,
    graph: ExportedGraph,
}

impl Representative {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn graph(&self) -> &ExportedGraph {
        &self.graph
    }
}

/// Class assignment of one classified graph. `class` indexes
/// [`DedupEngine::representatives`].
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Novel { class: usize },
    Duplicate { class: usize },
}

impl Classification {
    #[must_use]
    pub const fn class(&self) -> usize {
        match self {
            Self::Novel { class } | Self::Duplicate { class } => *class,
        }
    }

    #[must_use]
    pub const fn is_novel(&self) -> bool {
        matches!(self, Self::Novel { .. })
    }
}

/// Running totals after one classification.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub total_processed: usize,
    pub distinct_count: usize,
    /// Seconds spent classifying this graph.
    pub elapsed_seconds: f64,
}

/// How comparisons were decided.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TierStats {
    /// Answers the primary oracle gave within the deadline.
    pub library_answers: usize,
    /// Primary-oracle runs cut off at the deadline.
    pub library_timeouts: usize,
    /// Answers the fallback oracle gave after a timeout.
    pub fallback_answers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub classification: Classification,
    pub record: Record,
}

#[derive(Debug)]
struct Tiers<P, F> {
    primary: P,
    fallback: F,
    config: DedupConfig,
    stats: TierStats,
}

fn ask<O>(
    oracle: &O,
    subgraph: bool,
    small: &ExportedGraph,
    large: &ExportedGraph,
    cancel: &CancelFlag,
) -> Result<bool, OracleError>
where
    O: IsomorphismOracle + ?Sized,
{
    if subgraph {
        oracle.has_subgraph_isomorphic(small, large, cancel)
    } else {
        oracle.are_isomorphic(small, large, cancel)
    }
}

impl<P, F> Tiers<P, F>
where
    P: IsomorphismOracle,
    F: IsomorphismOracle,
{
    fn compare(&mut self, a: &ExportedGraph, b: &ExportedGraph) -> Result<bool, OracleError> {
        let (small, large) = by_size(a, b);
        let subgraph = self.config.comparison == Comparison::SubgraphShortcut
            && a.node_count() == b.node_count();

        let primary = &self.primary;
        match run_bounded(self.config.deadline, |cancel| {
            ask(primary, subgraph, small, large, cancel)
        }) {
            Bounded::Completed(Ok(answer)) => {
                self.stats.library_answers += 1;
                return Ok(answer);
            }
            Bounded::Completed(Err(OracleError::Cancelled)) | Bounded::TimedOut => {
                self.stats.library_timeouts += 1;
                tracing::warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    deadline = ?self.config.deadline,
                    nodes = large.node_count(),
                    "primary oracle timed out, falling back"
                );
            }
            Bounded::Completed(Err(err)) => return Err(err),
        }

        let answer = ask(&self.fallback, subgraph, small, large, &CancelFlag::new())?;
        self.stats.fallback_answers += 1;
        Ok(answer)
    }
}

/// Classifies graphs into isomorphism classes, one at a time.
#[derive(Debug)]
pub struct DedupEngine<P, F> {
    tiers: Tiers<P, F>,
    representatives: Vec<Representative>,
    records: Vec<Record>,
    processed: usize,
}

impl<P, F> DedupEngine<P, F>
where
    P: IsomorphismOracle,
    F: IsomorphismOracle,
{
    /// `primary` answers under [`DedupConfig::deadline`]; `fallback` answers
    /// whatever the primary could not.
    #[must_use]
    pub fn new(primary: P, fallback: F, config: DedupConfig) -> Self {
        Self {
            tiers: Tiers {
                primary,
                fallback,
                config,
                stats: TierStats::default(),
            },
            representatives: Vec::new(),
            records: Vec::new(),
            processed: 0,
        }
    }

    /// Compares `graph` against every representative in order and records
    /// the result. A graph with no match becomes a new representative under
    /// `label`.
    ///
    /// # Errors
    ///
    /// Returns the first oracle error other than a primary-oracle timeout.
    /// The engine is left as it was before the call.
    pub fn classify(
        &mut self,
        label: impl Into<String>,
        graph: ExportedGraph,
    ) -> Result<Outcome, OracleError> {
        let started = Instant::now();
        let label = label.into();

        let mut matched = None;
        for (class, representative) in self.representatives.iter().enumerate() {
            if self.tiers.compare(&graph, &representative.graph)? {
                matched = Some(class);
                break;
            }
        }

        let classification = if let Some(class) = matched {
            tracing::debug!(
                %label,
                representative = %self.representatives[class].label,
                "duplicate"
            );
            Classification::Duplicate { class }
        } else {
            let class = self.representatives.len();
            tracing::info!(
                %label,
                class,
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                "new isomorphism class"
            );
            self.representatives.push(Representative { label, graph });
            Classification::Novel { class }
        };

        self.processed += 1;
        let record = Record {
            total_processed: self.processed,
            distinct_count: self.representatives.len(),
            elapsed_seconds: started.elapsed().as_secs_f64(),
        };
        self.records.push(record);

        Ok(Outcome {
            classification,
            record,
        })
    }

    #[must_use]
    pub fn representatives(&self) -> &[Representative] {
        &self.representatives
    }

    #[must_use]
    pub fn distinct_count(&self) -> usize {
        self.representatives.len()
    }

    #[must_use]
    pub const fn processed(&self) -> usize {
        self.processed
    }

    /// One record per successful [`classify`](Self::classify), in order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub const fn stats(&self) -> TierStats {
        self.tiers.stats
    }

    #[must_use]
    pub const fn config(&self) -> &DedupConfig {
        &self.tiers.config
    }
}
