//! Rendering of a history as an Elle list-append history (EDN).
//!
//! Every transaction that touches an object becomes an `:invoke` and an `:ok`
//! event. Each write appends the next version number of its object, and a
//! read observes the whole list written so far:
//!
//! ```text
//! {:index 0 :type :invoke, :value [[:append 7 0] ], :process 1, :time 0}
//! {:index 1 :type :ok, :value [[:append 7 0] ], :process 1, :time 2}
//! {:index 2 :type :invoke, :value [[:r 7 nil] ], :process 2, :time 3}
//! {:index 3 :type :ok, :value [[:r 7 [0]] ], :process 2, :time 5}
//! ```
//!
//! Transactions are identified the same way as in
//! [`build`](crate::graph::builder::build). Times are statement positions in
//! the log: a transaction is invoked at its `BEGIN` and completes at its
//! `COMMIT`, or at its last access when it never commits.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt::{Display, Formatter, Result};
use core::hash::Hash;

use hashbrown::HashMap;

use crate::graph::builder::id_span;
use crate::history::statement::{SessionId, Statement, Txid};

/// One micro-operation of an Elle transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElleOp<'a, Object> {
    /// Read of `object`, which had seen writes `0..=version` (none if `None`).
    Read {
        object: &'a Object,
        version: Option<u64>,
    },
    /// Append of `version` to `object`.
    Append { object: &'a Object, version: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElleTransaction<'a, Object> {
    pub process: Txid,
    pub invoked_at: u64,
    pub completed_at: u64,
    pub ops: Vec<ElleOp<'a, Object>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    Invoke,
    Ok,
}

impl EventKind {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Invoke => ":invoke",
            Self::Ok => ":ok",
        }
    }
}

/// A history ready to be written out; `Display` renders one EDN map per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElleHistory<'a, Object> {
    transactions: Vec<ElleTransaction<'a, Object>>,
    /// `(time, kind, transaction)` in output order.
    events: Vec<(u64, EventKind, usize)>,
}

impl<'a, Object> ElleHistory<'a, Object> {
    /// Transactions with at least one access, by ascending txid.
    #[must_use]
    pub fn transactions(&self) -> &[ElleTransaction<'a, Object>] {
        &self.transactions
    }

    /// Number of events (two per transaction).
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Converts `statements` into an Elle list-append history.
#[must_use]
pub fn to_elle<Object>(statements: &[Statement<Object>]) -> ElleHistory<'_, Object>
where
    Object: Hash + Eq,
{
    let span = id_span(statements);
    let mut sessions: HashMap<SessionId, Txid> = HashMap::new();
    let mut versions: HashMap<&Object, u64> = HashMap::new();
    let mut timing: HashMap<Txid, (u64, u64)> = HashMap::new();
    let mut accesses: BTreeMap<Txid, Vec<ElleOp<'_, Object>>> = BTreeMap::new();

    for (time, statement) in (0_u64..).zip(statements) {
        let session = statement.session();
        let txid = *sessions.entry(session).or_insert(session);

        match statement {
            Statement::Begin { .. } => {
                timing.entry(txid).or_insert((time, time));
            }
            Statement::Commit { .. } => {
                timing.entry(txid).or_insert((time, time)).1 = time;
                if let Some(current) = sessions.get_mut(&session) {
                    *current = current.saturating_add(span);
                }
            }
            Statement::Write { object, .. } => {
                let version = versions.get(object).map_or(0, |v| v + 1);
                versions.insert(object, version);
                accesses
                    .entry(txid)
                    .or_default()
                    .push(ElleOp::Append { object, version });
                timing.entry(txid).or_insert((time, time)).1 = time;
            }
            Statement::Read { object, .. } => {
                let version = versions.get(object).copied();
                accesses
                    .entry(txid)
                    .or_default()
                    .push(ElleOp::Read { object, version });
                timing.entry(txid).or_insert((time, time)).1 = time;
            }
        }
    }

    let transactions: Vec<_> = accesses
        .into_iter()
        .map(|(process, ops)| {
            let (invoked_at, completed_at) = timing.get(&process).copied().unwrap_or_default();
            ElleTransaction {
                process,
                invoked_at,
                completed_at,
                ops,
            }
        })
        .collect();

    let mut events: Vec<_> = transactions
        .iter()
        .enumerate()
        .flat_map(|(i, tx)| {
            [
                (tx.invoked_at, EventKind::Invoke, i),
                (tx.completed_at, EventKind::Ok, i),
            ]
        })
        .collect();
    events.sort_unstable();

    tracing::debug!(
        transactions = transactions.len(),
        events = events.len(),
        "rendered elle history"
    );

    ElleHistory {
        transactions,
        events,
    }
}

/// EDN form of an object id: integers as-is, anything else as a string.
struct Key<'a, Object>(&'a Object);

impl<Object: Display> Display for Key<'_, Object> {
    fn fmt(&self, f: &mut Formatter) -> Result {
        let text = alloc::format!("{}", self.0);
        let digits = text.strip_prefix('-').unwrap_or(&text);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return f.write_str(&text);
        }
        f.write_str("\"")?;
        for c in text.chars() {
            if matches!(c, '"' | '\\') {
                f.write_str("\\")?;
            }
            write!(f, "{c}")?;
        }
        f.write_str("\"")
    }
}

fn write_op<Object: Display>(f: &mut Formatter, op: &ElleOp<'_, Object>, kind: EventKind) -> Result {
    match op {
        ElleOp::Append { object, version } => write!(f, "[:append {} {version}]", Key(*object)),
        ElleOp::Read { object, version } => {
            write!(f, "[:r {} ", Key(*object))?;
            match version {
                Some(last) if kind == EventKind::Ok => {
                    f.write_str("[")?;
                    for v in 0..*last {
                        write!(f, "{v} ")?;
                    }
                    write!(f, "{last}]]")
                }
                _ => f.write_str("nil]"),
            }
        }
    }
}

impl<Object: Display> Display for ElleHistory<'_, Object> {
    fn fmt(&self, f: &mut Formatter) -> Result {
        for (index, &(time, kind, tx)) in self.events.iter().enumerate() {
            let transaction = &self.transactions[tx];
            write!(f, "{{:index {index} :type {}, :value [", kind.keyword())?;
            for op in &transaction.ops {
                write_op(f, op, kind)?;
                f.write_str(" ")?;
            }
            writeln!(
                f,
                "], :process {}, :time {time}}}",
                transaction.process
            )?;
        }
        Ok(())
    }
}
