use alloc::string::String;
use core::fmt::{Display, Write};

use crate::history::statement::Statement;

/// Literal token separating statements in a history log.
pub const DELIMITER: &str = "$_$_$";

/// Format statements as a history log.
///
/// Every statement is prefixed with [`DELIMITER`] and sits on its own line,
/// so the output decodes back to the same statement sequence.
#[must_use]
pub fn format_log<Object>(statements: &[Statement<Object>]) -> String
where
    Object: Display,
{
    let mut output = String::new();
    for statement in statements {
        let _ = writeln!(output, "{DELIMITER} {statement}");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_log() {
        let statements = vec![
            Statement::begin(1),
            Statement::write(1, "x"),
            Statement::commit(1),
        ];
        assert_eq!(
            format_log(&statements),
            "$_$_$ Op: BEGIN Tx: 1\n$_$_$ Op: WRITE Tx: 1 Obj: x\n$_$_$ Op: COMMIT Tx: 1\n"
        );
    }

    #[test]
    fn test_format_log_empty() {
        let statements: Vec<Statement<&str>> = vec![];
        assert_eq!(format_log(&statements), "");
    }
}
