/// DSL macros for building test histories.
///
/// Produces `Vec<Statement<&'static str>>` in log order.
///
/// # Syntax
///
/// ```ignore
/// history![
///     b(1),        // BEGIN on session 1
///     w(1, x),     // WRITE x on session 1
///     r(2, x),     // READ x on session 2
///     c(1),        // COMMIT on session 1
/// ]
/// ```
///
/// Build a single Statement.
#[macro_export]
macro_rules! st {
    (b($session:expr)) => {
        histiso_core::history::statement::Statement::<&'static str>::begin($session)
    };
    (c($session:expr)) => {
        histiso_core::history::statement::Statement::<&'static str>::commit($session)
    };
    (r($session:expr, $object:ident)) => {
        histiso_core::history::statement::Statement::<&'static str>::read(
            $session,
            stringify!($object),
        )
    };
    (w($session:expr, $object:ident)) => {
        histiso_core::history::statement::Statement::<&'static str>::write(
            $session,
            stringify!($object),
        )
    };
}

/// Build a full history from statement shorthands.
#[macro_export]
macro_rules! history {
    ($($op:ident($($args:tt)*)),* $(,)?) => {
        vec![$($crate::st!($op($($args)*))),*]
    };
}
