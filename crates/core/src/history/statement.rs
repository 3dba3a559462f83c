use core::fmt::{Debug, Display, Formatter, Result};

/// Session identifier as recorded in the log (`Tx:` field).
///
/// A session can run several transactions one after another, so a session id
/// is not a transaction identity on its own.
pub type SessionId = u64;

/// Identity of one transaction instance within a history.
///
/// The first transaction of a session reuses the session id; later ones are
/// offset by multiples of the history's id span (see
/// [`build`](crate::graph::builder::build)).
pub type Txid = u64;

/// Kind of a logged statement (`Op:` field).
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Begin,
    Commit,
    Read,
    Write,
}

impl Operation {
    /// Keyword used for this operation in the log format.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Begin => "BEGIN",
            Self::Commit => "COMMIT",
            Self::Read => "READ",
            Self::Write => "WRITE",
        }
    }

    /// Parses a log keyword. Matching is exact and case-sensitive.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "BEGIN" => Some(Self::Begin),
            "COMMIT" => Some(Self::Commit),
            "READ" => Some(Self::Read),
            "WRITE" => Some(Self::Write),
            _ => None,
        }
    }

    /// Returns `true` for operations that carry an object id.
    #[must_use]
    pub const fn accesses_object(self) -> bool {
        matches!(self, Self::Read | Self::Write)
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter) -> Result {
        f.write_str(self.keyword())
    }
}

/// A single event of a recorded history.
///
/// Statements are totally ordered by their position in the log; that order is
/// global across sessions.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Statement<Object> {
    Begin { session: SessionId },
    Commit { session: SessionId },
    Read { session: SessionId, object: Object },
    Write { session: SessionId, object: Object },
}

impl<Object> Statement<Object> {
    pub const fn begin(session: SessionId) -> Self {
        Self::Begin { session }
    }

    pub const fn commit(session: SessionId) -> Self {
        Self::Commit { session }
    }

    pub const fn read(session: SessionId, object: Object) -> Self {
        Self::Read { session, object }
    }

    pub const fn write(session: SessionId, object: Object) -> Self {
        Self::Write { session, object }
    }

    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Begin { .. } => Operation::Begin,
            Self::Commit { .. } => Operation::Commit,
            Self::Read { .. } => Operation::Read,
            Self::Write { .. } => Operation::Write,
        }
    }

    #[must_use]
    pub const fn session(&self) -> SessionId {
        match self {
            Self::Begin { session }
            | Self::Commit { session }
            | Self::Read { session, .. }
            | Self::Write { session, .. } => *session,
        }
    }

    /// The accessed object, `None` for `BEGIN` and `COMMIT`.
    #[must_use]
    pub const fn object(&self) -> Option<&Object> {
        match self {
            Self::Read { object, .. } | Self::Write { object, .. } => Some(object),
            Self::Begin { .. } | Self::Commit { .. } => None,
        }
    }
}

impl<Object> Debug for Statement<Object>
where
    Object: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            Self::Begin { session } => write!(f, "B{session}"),
            Self::Commit { session } => write!(f, "C{session}"),
            Self::Read { session, object } => write!(f, "R{session}({object:?})"),
            Self::Write { session, object } => write!(f, "W{session}({object:?})"),
        }
    }
}

impl<Object> Display for Statement<Object>
where
    Object: Display,
{
    /// Renders the statement body in the log format, without delimiter.
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "Op: {} Tx: {}", self.operation(), self.session())?;
        if let Some(object) = self.object() {
            write!(f, " Obj: {object}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let statement = Statement::write(3, "x");
        assert_eq!(statement.operation(), Operation::Write);
        assert_eq!(statement.session(), 3);
        assert_eq!(statement.object(), Some(&"x"));

        let statement = Statement::<&str>::commit(7);
        assert_eq!(statement.operation(), Operation::Commit);
        assert_eq!(statement.object(), None);
    }

    #[test]
    fn test_keyword_round_trip() {
        for op in [
            Operation::Begin,
            Operation::Commit,
            Operation::Read,
            Operation::Write,
        ] {
            assert_eq!(Operation::from_keyword(op.keyword()), Some(op));
        }
        assert_eq!(Operation::from_keyword("begin"), None);
        assert_eq!(Operation::from_keyword("ABORT"), None);
    }

    #[test]
    fn test_statement_debug() {
        assert_eq!(format!("{:?}", Statement::<&str>::begin(1)), "B1");
        assert_eq!(format!("{:?}", Statement::read(2, "x")), "R2(\"x\")");
        assert_eq!(format!("{:?}", Statement::write(2, 5)), "W2(5)");
    }

    #[test]
    fn test_statement_display() {
        assert_eq!(Statement::<&str>::begin(1).to_string(), "Op: BEGIN Tx: 1");
        assert_eq!(Statement::read(4, "acct").to_string(), "Op: READ Tx: 4 Obj: acct");
    }
}
