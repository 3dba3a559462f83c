//! Well-formedness check for a decoded history.
//!
//! A history is well formed when, per session, `BEGIN` and `COMMIT` strictly
//! alternate starting with `BEGIN`, every `READ`/`WRITE` happens inside an
//! open transaction of its session, and no transaction is left open at the
//! end of the log.
//!
//! The conflict-graph builder does not require this; it is a gate callers
//! apply before accepting a history.

use core::fmt::{Display, Formatter};

use hashbrown::HashMap;

use crate::history::statement::{Operation, SessionId, Statement};

/// Why a history is not well formed.
///
/// `position` is the 1-based index of the offending statement.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `BEGIN` on a session whose previous transaction has not committed.
    NestedBegin { session: SessionId, position: usize },
    /// `COMMIT` on a session without an open transaction.
    CommitWithoutBegin { session: SessionId, position: usize },
    /// `READ` or `WRITE` on a session without an open transaction.
    OutsideTransaction {
        session: SessionId,
        operation: Operation,
        position: usize,
    },
    /// The log ends while the session still has an open transaction.
    Unterminated { session: SessionId },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NestedBegin { session, position } => {
                write!(f, "nested BEGIN in session {session} at statement {position}")
            }
            Self::CommitWithoutBegin { session, position } => {
                write!(
                    f,
                    "COMMIT without BEGIN in session {session} at statement {position}"
                )
            }
            Self::OutsideTransaction {
                session,
                operation,
                position,
            } => write!(
                f,
                "{operation} in session {session} outside of BEGIN ... COMMIT at statement {position}"
            ),
            Self::Unterminated { session } => {
                write!(f, "session {session} begins a transaction but never commits")
            }
        }
    }
}

impl core::error::Error for ValidationError {}

/// Checks that `statements` form a well-formed history.
///
/// # Errors
///
/// Returns the first [`ValidationError`] in log order. Open transactions are
/// only reported after the whole log was scanned, lowest session first.
pub fn validate<Object>(statements: &[Statement<Object>]) -> Result<(), ValidationError> {
    let mut active: HashMap<SessionId, bool> = HashMap::new();

    for (index, statement) in statements.iter().enumerate() {
        let position = index + 1;
        let session = statement.session();
        let open = active.entry(session).or_default();
        match statement.operation() {
            Operation::Begin => {
                if *open {
                    return Err(ValidationError::NestedBegin { session, position });
                }
                *open = true;
            }
            Operation::Commit => {
                if !*open {
                    return Err(ValidationError::CommitWithoutBegin { session, position });
                }
                *open = false;
            }
            operation @ (Operation::Read | Operation::Write) => {
                if !*open {
                    return Err(ValidationError::OutsideTransaction {
                        session,
                        operation,
                        position,
                    });
                }
            }
        }
    }

    match active
        .into_iter()
        .filter_map(|(session, open)| open.then_some(session))
        .min()
    {
        Some(session) => Err(ValidationError::Unterminated { session }),
        None => Ok(()),
    }
}
