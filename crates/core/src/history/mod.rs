pub mod display;
pub mod elle;
pub mod statement;
pub mod validate;
