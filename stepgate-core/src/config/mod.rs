//! Controller configuration

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use types::*;
