//! ABP filter rule parser.
//!
//! Turns one line of ABP filter-list text into a structured
//! [`abp_core::Filter`]. Single-pass, no regex engine, no allocation beyond
//! the owned strings the resulting filter needs to keep.

mod error;
mod parser;

pub use error::ParseError;
pub use parser::parse_rule;
