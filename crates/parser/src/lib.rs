pub mod parser;

pub use parser::{
    decode_history, decode_str, parse_statement, split_statements, DecodeError, Malformed, Policy,
};
