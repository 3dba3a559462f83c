pub mod builder;
pub mod conflict;
pub mod export;
