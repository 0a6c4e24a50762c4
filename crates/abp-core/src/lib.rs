//! Core types, URL match engine, and request matcher for the ABP-style
//! filtering engine.
//!
//! # Modules
//!
//! - `text`: ASCII-fast scanning primitives and the domain-suffix walker
//! - `uri`: scheme/host/path extraction over absolute URIs
//! - `headers`: case-insensitive header multimap
//! - `types`: the URL filter option bitset
//! - `fragment`: the tagged-variant match program and its evaluator
//! - `filter`: `Filter`/`UrlFilter`/`HtmlFilter`
//! - `matcher`: the five-step request matcher

pub mod filter;
pub mod fragment;
pub mod headers;
pub mod matcher;
pub mod text;
pub mod types;
pub mod uri;

pub use filter::{Filter, FilterMeta, HtmlFilter, UrlFilter};
pub use fragment::Fragment;
pub use headers::HeaderBag;
pub use types::UrlFilterOptions;
