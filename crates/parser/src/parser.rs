//! Decoder for raw history logs.
//!
//! A log is free text in which statements are separated by the literal
//! delimiter `$_$_$`. Each statement carries whitespace-separated
//! `Key: value` fields:
//!
//! ```text
//! $_$_$ Op: BEGIN Tx: 12
//! $_$_$ Op: WRITE Tx: 12 Obj: account_7
//! $_$_$ Op: COMMIT Tx: 12
//! ```
//!
//! `Op` is one of `BEGIN`, `COMMIT`, `READ`, `WRITE`; `Tx` is the integer
//! session id; `Obj` is required for reads and writes and ignored otherwise.
//! A field is found by its first occurrence in the statement, the value being
//! the run of non-whitespace characters after the key.

use histiso_core::history::display::DELIMITER;
use histiso_core::history::statement::{Operation, SessionId, Statement};
use winnow::ascii::multispace0;
use winnow::prelude::*;
use winnow::token::{literal, take_till, take_until};
use winnow::ModalResult;

// ---------------------------------------------------------------------------
// Public error types
// ---------------------------------------------------------------------------

/// What is wrong with a statement that could not be decoded.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    /// No `Op:` field.
    MissingOperation,
    /// No `Tx:` field.
    MissingSession,
    /// The `Op:` value is not a known operation.
    UnknownOperation(String),
    /// The `Tx:` value is not an unsigned integer.
    InvalidSession(String),
    /// A `READ` or `WRITE` without `Obj:` field.
    MissingObject,
}

impl core::fmt::Display for Malformed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingOperation => write!(f, "missing `Op` field"),
            Self::MissingSession => write!(f, "missing `Tx` field"),
            Self::UnknownOperation(op) => write!(f, "unknown operation `{op}`"),
            Self::InvalidSession(tx) => write!(f, "invalid session id `{tx}`"),
            Self::MissingObject => write!(f, "missing `Obj` field"),
        }
    }
}

/// A malformed statement under [`Policy::Strict`].
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// 1-based position of the statement among the non-empty units.
    pub index: usize,
    pub kind: Malformed,
    /// The trimmed statement text.
    pub unit: String,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "malformed statement {}: {}: `{}`",
            self.index, self.kind, self.unit
        )
    }
}

impl std::error::Error for DecodeError {}

/// How to treat statements that cannot be decoded.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Skip the statement and keep going.
    #[default]
    Lenient,
    /// Reject the whole history.
    Strict,
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Decode the raw bytes of a history log.
///
/// Invalid UTF-8 sequences are replaced with `U+FFFD` rather than rejected.
///
/// # Errors
///
/// Under [`Policy::Strict`], returns a [`DecodeError`] for the first
/// statement that cannot be decoded. Never fails under [`Policy::Lenient`].
pub fn decode_history(bytes: &[u8], policy: Policy) -> Result<Vec<Statement<String>>, DecodeError> {
    decode_str(&String::from_utf8_lossy(bytes), policy)
}

/// Decode a history log that is already text.
///
/// # Errors
///
/// See [`decode_history`].
pub fn decode_str(text: &str, policy: Policy) -> Result<Vec<Statement<String>>, DecodeError> {
    let mut statements = Vec::new();
    let mut skipped = 0_usize;

    for (offset, unit) in split_statements(text).enumerate() {
        match parse_statement(unit) {
            Ok(statement) => statements.push(statement),
            Err(kind) => match policy {
                Policy::Lenient => {
                    tracing::debug!(index = offset + 1, %kind, "skipping malformed statement");
                    skipped += 1;
                }
                Policy::Strict => {
                    return Err(DecodeError {
                        index: offset + 1,
                        kind,
                        unit: unit.to_string(),
                    });
                }
            },
        }
    }

    tracing::debug!(statements = statements.len(), skipped, "decoded history");
    Ok(statements)
}

/// Split log text into trimmed, non-empty statement units.
pub fn split_statements(text: &str) -> impl Iterator<Item = &str> {
    text.split(DELIMITER)
        .map(str::trim)
        .filter(|unit| !unit.is_empty())
}

/// Decode a single statement unit.
///
/// # Errors
///
/// Returns the [`Malformed`] reason when a required field is missing or
/// invalid.
pub fn parse_statement(unit: &str) -> Result<Statement<String>, Malformed> {
    let op = find_field(unit, "Op:").ok_or(Malformed::MissingOperation)?;
    let tx = find_field(unit, "Tx:").ok_or(Malformed::MissingSession)?;

    let operation =
        Operation::from_keyword(op).ok_or_else(|| Malformed::UnknownOperation(op.to_string()))?;
    let session: SessionId = tx
        .parse()
        .map_err(|_| Malformed::InvalidSession(tx.to_string()))?;

    let statement = match operation {
        Operation::Begin => Statement::begin(session),
        Operation::Commit => Statement::commit(session),
        Operation::Read | Operation::Write => {
            let object = find_field(unit, "Obj:")
                .ok_or(Malformed::MissingObject)?
                .to_string();
            if operation == Operation::Read {
                Statement::read(session, object)
            } else {
                Statement::write(session, object)
            }
        }
    };
    Ok(statement)
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

/// `<anything> key <whitespace>* <non-whitespace>+`
fn field_value<'i>(input: &mut &'i str, key: &str) -> ModalResult<&'i str> {
    take_until(0.., key).void().parse_next(input)?;
    literal(key).parse_next(input)?;
    multispace0.parse_next(input)?;
    take_till(1.., |c: char| c.is_whitespace()).parse_next(input)
}

/// Value of the first `key` occurrence in `unit`.
///
/// The value may start on a later line, so an occurrence only lacks a value
/// when nothing but whitespace follows it; no later occurrence can exist then.
fn find_field<'i>(unit: &'i str, key: &str) -> Option<&'i str> {
    let mut input = unit;
    field_value(&mut input, key).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn b(session: u64) -> Statement<String> {
        Statement::begin(session)
    }
    fn c(session: u64) -> Statement<String> {
        Statement::commit(session)
    }
    fn r(session: u64, object: &str) -> Statement<String> {
        Statement::read(session, object.to_string())
    }
    fn w(session: u64, object: &str) -> Statement<String> {
        Statement::write(session, object.to_string())
    }

    // -----------------------------------------------------------------------
    // Happy-path tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_single_transaction() {
        let input = "$_$_$ Op: BEGIN Tx: 1\n$_$_$ Op: WRITE Tx: 1 Obj: x\n$_$_$ Op: COMMIT Tx: 1\n";
        let result = decode_str(input, Policy::Strict).expect("should decode");
        assert_eq!(result, vec![b(1), w(1, "x"), c(1)]);
    }

    #[test]
    fn test_fields_without_space_and_extra_fields() {
        let input = "$_$_$Op:READ  Ts: 17 Tx:\t42 Obj:k_9 Extra: yes$_$_$";
        let result = decode_str(input, Policy::Strict).expect("should decode");
        assert_eq!(result, vec![r(42, "k_9")]);
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let input = "$_$_$ Obj: y Tx: 3 Op: WRITE";
        let result = decode_str(input, Policy::Strict).expect("should decode");
        assert_eq!(result, vec![w(3, "y")]);
    }

    #[test]
    fn test_empty_units_are_dropped() {
        let input = "\n$_$_$   \n$_$_$ Op: BEGIN Tx: 2\n\n$_$_$\n$_$_$ Op: COMMIT Tx: 2";
        let result = decode_str(input, Policy::Strict).expect("should decode");
        assert_eq!(result, vec![b(2), c(2)]);
    }

    #[test]
    fn test_object_ignored_on_begin() {
        let result = parse_statement("Op: BEGIN Tx: 5 Obj: z").expect("should parse");
        assert_eq!(result, b(5));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut bytes = b"$_$_$ Op: BEGIN Tx: 1 \xff\xfe\n$_$_$ Op: READ Tx: 1 Obj: a".to_vec();
        bytes.extend_from_slice(b"\xc3\n$_$_$ Op: COMMIT Tx: 1");
        let result = decode_history(&bytes, Policy::Strict).expect("should decode");
        assert_eq!(result.len(), 3);
        assert_eq!(result[1].object().map(String::as_str), Some("a\u{fffd}"));
    }

    #[test]
    fn test_split_statements() {
        let units: Vec<&str> = split_statements("a $_$_$ b\n$_$_$$_$_$ c ").collect();
        assert_eq!(units, vec!["a", "b", "c"]);
    }

    // -----------------------------------------------------------------------
    // Malformed statements
    // -----------------------------------------------------------------------

    #[test]
    fn test_malformed_kinds() {
        assert_eq!(
            parse_statement("Tx: 1"),
            Err(Malformed::MissingOperation)
        );
        assert_eq!(
            parse_statement("Op: BEGIN"),
            Err(Malformed::MissingSession)
        );
        assert_eq!(
            parse_statement("Op: ABORT Tx: 1"),
            Err(Malformed::UnknownOperation("ABORT".to_string()))
        );
        assert_eq!(
            parse_statement("Op: BEGIN Tx: one"),
            Err(Malformed::InvalidSession("one".to_string()))
        );
        assert_eq!(
            parse_statement("Op: WRITE Tx: 1"),
            Err(Malformed::MissingObject)
        );
        assert_eq!(
            parse_statement("Op: READ Tx: 1 Obj:"),
            Err(Malformed::MissingObject)
        );
    }

    #[test]
    fn test_lenient_skips_malformed() {
        let input = "$_$_$ Op: BEGIN Tx: 1\n$_$_$ garbage\n$_$_$ Op: READ Tx: 1\n$_$_$ Op: COMMIT Tx: 1";
        let result = decode_str(input, Policy::Lenient).expect("lenient never fails");
        assert_eq!(result, vec![b(1), c(1)]);
    }

    #[test]
    fn test_strict_aborts_on_malformed() {
        let input = "$_$_$ Op: BEGIN Tx: 1\n$_$_$ garbage\n$_$_$ Op: COMMIT Tx: 1";
        let err = decode_str(input, Policy::Strict).expect_err("should fail");
        assert_eq!(err.index, 2);
        assert_eq!(err.kind, Malformed::MissingOperation);
        assert_eq!(err.unit, "garbage");
    }

    #[test]
    fn test_field_value_after_line_break() {
        assert_eq!(find_field("Op:\n  READ Tx: 1", "Op:"), Some("READ"));
        assert_eq!(find_field("Tx: 1 Op:", "Op:"), None);
        assert_eq!(
            parse_statement("Op: WRITE Tx:\n3 Obj:\tacct"),
            Ok(w(3, "acct"))
        );
    }

    #[test]
    fn test_decode_error_display() {
        let err = decode_str("$_$_$ Op: WRITE Tx: 9", Policy::Strict).expect_err("should fail");
        assert_eq!(
            err.to_string(),
            "malformed statement 1: missing `Obj` field: `Op: WRITE Tx: 9`"
        );
    }

    #[test]
    fn test_default_policy_is_lenient() {
        assert_eq!(Policy::default(), Policy::Lenient);
    }
}
