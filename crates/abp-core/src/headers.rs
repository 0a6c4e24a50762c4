//! Case-insensitive header multimap used as the request matcher's input.
//!
//! Header names are folded to ASCII lowercase on insert and lookup; values
//! are kept verbatim. This deliberately does not model the full HTTP header
//! grammar (folding, comma-lists, etc.): the matcher only ever reads a
//! handful of well-known single-value headers.

use std::collections::HashMap;

use crate::text;

/// A case-insensitive, multi-valued header bag.
#[derive(Debug, Default, Clone)]
pub struct HeaderBag {
    entries: HashMap<String, Vec<String>>,
}

impl HeaderBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header value, appending to any existing values for the name.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// The first value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// All values for `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the first value for `name` equals `expected`, ASCII
    /// case-insensitively.
    pub fn eq_ignore_case(&self, name: &str, expected: &str) -> bool {
        match self.get(name) {
            Some(v) => text::eq(v, expected, false),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_lookup() {
        let mut h = HeaderBag::new();
        h.insert("Content-Type", "text/html");
        assert_eq!(h.get("content-type"), Some("text/html"));
        assert_eq!(h.get("CONTENT-TYPE"), Some("text/html"));
    }

    #[test]
    fn multi_value() {
        let mut h = HeaderBag::new();
        h.insert("X-Foo", "a");
        h.insert("x-foo", "b");
        assert_eq!(h.get_all("X-FOO"), &["a".to_string(), "b".to_string()]);
        assert_eq!(h.get("x-foo"), Some("a"));
    }

    #[test]
    fn eq_ignore_case_helper() {
        let mut h = HeaderBag::new();
        h.insert("X-Requested-With", "XMLHttpRequest");
        assert!(h.eq_ignore_case("x-requested-with", "xmlhttprequest"));
        assert!(!h.eq_ignore_case("x-requested-with", "fetch"));
        assert!(!h.eq_ignore_case("missing", "anything"));
    }
}
