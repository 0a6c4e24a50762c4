//! Filter objects: the parser's output and the matcher's input.
//!
//! `Filter` is a tagged union of the two rule kinds the parser can produce.
//! There is no base-class/subclass hierarchy; shared bookkeeping lives in
//! [`FilterMeta`] and is composed into each variant.

use std::collections::HashSet;

use crate::fragment::Fragment;
use crate::headers::HeaderBag;
use crate::matcher;
use crate::types::UrlFilterOptions;

/// Bookkeeping shared by every filter kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterMeta {
    pub original_rule: Option<String>,
    pub is_exception: bool,
    pub category_id: u16,
}

/// A compiled URL-matching rule.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlFilter {
    pub meta: FilterMeta,
    pub parts: Vec<Fragment>,
    pub options: UrlFilterOptions,
    pub applicable_domains: HashSet<String>,
    pub exception_domains: HashSet<String>,
    pub applicable_referers: HashSet<String>,
    pub exception_referers: HashSet<String>,
}

impl UrlFilter {
    /// Evaluate this filter against a request URI and header bag. See the
    /// request matcher for the full five-step contract.
    pub fn is_match(&self, uri: &str, headers: &HeaderBag) -> bool {
        matcher::is_match(self, uri, headers)
    }

    /// Drop data not needed once the owner (typically a domain-keyed store
    /// bucket that has already done its own domain gating) no longer needs
    /// it: the source text and all four host sets. After this call the
    /// compiled program and options still evaluate correctly for the
    /// narrower purpose the caller retained the filter for, but the filter
    /// is no longer serialisable and general `is_match` calls that rely on
    /// domain/referer gating will behave as if those sets were empty.
    ///
    /// Call this only after any domain/referer bucketing the caller needed
    /// has already happened externally; calling it earlier changes
    /// matching behaviour, not just memory footprint.
    pub fn trim_excess_data(&mut self) {
        self.meta.original_rule = None;
        self.applicable_domains.clear();
        self.exception_domains.clear();
        self.applicable_referers.clear();
        self.exception_referers.clear();
    }
}

/// A parsed element-hide rule. Parsed and stored but never evaluated by the
/// request matcher; CSS-selector rewriting is an external collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlFilter {
    pub meta: FilterMeta,
    pub css_selector: String,
    pub applicable_domains: HashSet<String>,
    pub exception_domains: HashSet<String>,
}

/// The parser's result type: either rule kind it can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Url(UrlFilter),
    Html(HtmlFilter),
}

impl Filter {
    pub fn meta(&self) -> &FilterMeta {
        match self {
            Filter::Url(f) => &f.meta,
            Filter::Html(f) => &f.meta,
        }
    }

    pub fn is_exception(&self) -> bool {
        self.meta().is_exception
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_filter() -> UrlFilter {
        let mut applicable = HashSet::new();
        applicable.insert("silly.com".to_string());
        UrlFilter {
            meta: FilterMeta {
                original_rule: Some("||silly.com^".to_string()),
                is_exception: false,
                category_id: 1,
            },
            parts: vec![Fragment::AnchoredDomain("silly.com".to_string())],
            options: UrlFilterOptions::empty(),
            applicable_domains: applicable,
            exception_domains: HashSet::new(),
            applicable_referers: HashSet::new(),
            exception_referers: HashSet::new(),
        }
    }

    #[test]
    fn trim_excess_data_clears_bookkeeping() {
        let mut f = sample_filter();
        f.trim_excess_data();
        assert!(f.meta.original_rule.is_none());
        assert!(f.applicable_domains.is_empty());
        assert!(f.exception_domains.is_empty());
        assert!(f.applicable_referers.is_empty());
        assert!(f.exception_referers.is_empty());
        // the compiled program itself is untouched
        assert_eq!(f.parts.len(), 1);
    }

    #[test]
    fn filter_enum_dispatches_meta() {
        let url_filter = Filter::Url(sample_filter());
        assert!(!url_filter.is_exception());

        let html = Filter::Html(HtmlFilter {
            meta: FilterMeta {
                original_rule: Some("example.com##.banner".to_string()),
                is_exception: false,
                category_id: 0,
            },
            css_selector: ".banner".to_string(),
            applicable_domains: HashSet::new(),
            exception_domains: HashSet::new(),
        });
        assert!(!html.is_exception());
    }
}
