//! The request matcher: a five-step ordered predicate over
//! `(compiled filter, request URI, header bag)`.
//!
//! Each step can fail outright (short-circuiting the whole evaluation) or
//! pass through to the next. The order and the quirks below are load
//! bearing; see the doc comment on [`content_class`] for the preserved
//! "content-type ladder" open question.

use crate::filter::UrlFilter;
use crate::headers::HeaderBag;
use crate::text;
use crate::types::UrlFilterOptions;
use crate::{fragment, uri};

/// Evaluate the full five-step matcher contract for `filter` against
/// `request_uri` and `headers`. Never allocates on the success path beyond
/// small transient strings (lowercased header values), never performs I/O,
/// and never panics on unparseable input: an unparseable `Referer` is
/// simply treated as absent.
pub fn is_match(filter: &UrlFilter, request_uri: &str, headers: &HeaderBag) -> bool {
    step_xhr(filter, headers)
        && step_referer(filter, request_uri, headers)
        && step_content_type(filter, headers)
        && step_request_host_sets(filter, request_uri)
        && fragment::eval_program(&filter.parts, request_uri)
}

fn step_xhr(filter: &UrlFilter, headers: &HeaderBag) -> bool {
    let opts = filter.options;
    if !opts.intersects(UrlFilterOptions::XMLHTTPREQUEST | UrlFilterOptions::NOT_XMLHTTPREQUEST) {
        return true;
    }
    let is_xhr = headers.eq_ignore_case("X-Requested-With", "XMLHttpRequest");
    let positive_ok = !opts.contains(UrlFilterOptions::XMLHTTPREQUEST) || is_xhr;
    let negative_ok = !opts.contains(UrlFilterOptions::NOT_XMLHTTPREQUEST) || !is_xhr;
    positive_ok && negative_ok
}

fn step_referer(filter: &UrlFilter, request_uri: &str, headers: &HeaderBag) -> bool {
    let opts = filter.options;
    let referer = headers.get("Referer");

    let referer_host = referer.and_then(uri::extract_host).map(text::strip_www);

    let is_third_party = match referer_host {
        None => false,
        Some(r) => {
            let request_host = uri::extract_host(request_uri).map(text::strip_www);
            Some(r) != request_host
        }
    };

    if opts.contains(UrlFilterOptions::THIRD_PARTY) && !is_third_party {
        return false;
    }
    if opts.contains(UrlFilterOptions::NOT_THIRD_PARTY) && is_third_party {
        return false;
    }

    let r = match referer_host {
        Some(r) => r,
        None => return true,
    };

    if !filter.applicable_domains.is_empty() && !filter.applicable_domains.contains(r) {
        return false;
    }
    if filter.exception_domains.contains(r) {
        return false;
    }
    if !filter.applicable_referers.is_empty() && !filter.applicable_referers.contains(r) {
        return false;
    }
    if filter.exception_referers.contains(r) {
        return false;
    }

    true
}

/// The single content-type class a `Content-Type` header value falls into,
/// under a priority ladder that can never report more than one class:
/// `script` beats `image` beats `stylesheet`. A header containing both
/// `"script"` and `"image"` substrings is classified purely as `Script`.
/// This is a preserved quirk (spec's open design question), not a bug; a
/// rule combining e.g. `script,image` in its options can structurally
/// never match such a request, since only one class bit is ever "on".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentClass {
    Script,
    Image,
    Stylesheet,
    Other,
}

fn content_class(content_type: &str) -> ContentClass {
    if text::find_from(content_type, "script", 0, false).is_some() {
        ContentClass::Script
    } else if text::find_from(content_type, "image", 0, false).is_some() {
        ContentClass::Image
    } else if text::find_from(content_type, "stylesheet", 0, false).is_some() {
        ContentClass::Stylesheet
    } else {
        ContentClass::Other
    }
}

fn step_content_type(filter: &UrlFilter, headers: &HeaderBag) -> bool {
    let opts = filter.options;
    let relevant = UrlFilterOptions::SCRIPT
        | UrlFilterOptions::NOT_SCRIPT
        | UrlFilterOptions::IMAGE
        | UrlFilterOptions::NOT_IMAGE
        | UrlFilterOptions::STYLESHEET
        | UrlFilterOptions::NOT_STYLESHEET;
    if !opts.intersects(relevant) {
        return true;
    }

    let class = match headers.get("Content-Type") {
        Some(ct) => content_class(ct),
        None => ContentClass::Other,
    };

    let is_script = class == ContentClass::Script;
    if opts.contains(UrlFilterOptions::SCRIPT) && !is_script {
        return false;
    }
    if opts.contains(UrlFilterOptions::NOT_SCRIPT) && is_script {
        return false;
    }

    let is_image = class == ContentClass::Image;
    if opts.contains(UrlFilterOptions::IMAGE) && !is_image {
        return false;
    }
    if opts.contains(UrlFilterOptions::NOT_IMAGE) && is_image {
        return false;
    }

    let is_stylesheet = class == ContentClass::Stylesheet;
    if opts.contains(UrlFilterOptions::STYLESHEET) && !is_stylesheet {
        return false;
    }
    if opts.contains(UrlFilterOptions::NOT_STYLESHEET) && is_stylesheet {
        return false;
    }

    true
}

fn step_request_host_sets(filter: &UrlFilter, request_uri: &str) -> bool {
    let host = match uri::extract_host(request_uri) {
        Some(h) => text::strip_www(h),
        None => return true,
    };

    if !filter.applicable_domains.is_empty() && !filter.applicable_domains.contains(host) {
        return false;
    }
    if filter.exception_domains.contains(host) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterMeta;
    use std::collections::HashSet;

    fn base_filter() -> UrlFilter {
        UrlFilter {
            meta: FilterMeta::default(),
            parts: vec![fragment::Fragment::AnchoredDomain("silly.com".into())],
            options: UrlFilterOptions::empty(),
            applicable_domains: HashSet::new(),
            exception_domains: HashSet::new(),
            applicable_referers: HashSet::new(),
            exception_referers: HashSet::new(),
        }
    }

    fn scenario_filter() -> UrlFilter {
        let mut f = base_filter();
        f.parts = vec![
            fragment::Fragment::AnchoredDomain("silly.com".into()),
            fragment::Fragment::Separator,
            fragment::Fragment::StringLiteral("stoopid".into(), false),
            fragment::Fragment::Separator,
            fragment::Fragment::StringLiteral("url".into(), false),
            fragment::Fragment::Separator,
            fragment::Fragment::Wildcard,
            fragment::Fragment::StringLiteral("1".into(), false),
        ];
        f.options = UrlFilterOptions::XMLHTTPREQUEST
            | UrlFilterOptions::SCRIPT
            | UrlFilterOptions::NOT_THIRD_PARTY;
        f
    }

    #[test]
    fn s1_no_referer_matches() {
        let f = scenario_filter();
        let mut h = HeaderBag::new();
        h.insert("X-Requested-With", "XmlHttpRequest");
        h.insert("Content-Type", "script");
        assert!(is_match(&f, "http://silly.com/stoopid/url&=b1", &h));
    }

    #[test]
    fn s2_same_origin_referer_matches() {
        let f = scenario_filter();
        let mut h = HeaderBag::new();
        h.insert("X-Requested-With", "XmlHttpRequest");
        h.insert("Content-Type", "script");
        h.insert("Referer", "http://silly.com/");
        assert!(is_match(&f, "http://silly.com/stoopid/url&=b1", &h));
    }

    #[test]
    fn s3_third_party_referer_fails() {
        let f = scenario_filter();
        let mut h = HeaderBag::new();
        h.insert("X-Requested-With", "XmlHttpRequest");
        h.insert("Content-Type", "script");
        h.insert("Referer", "http://other.com/");
        assert!(!is_match(&f, "http://silly.com/stoopid/url&=b1", &h));
    }

    #[test]
    fn s4_exception_referer_matches() {
        let mut f = base_filter();
        f.meta.is_exception = true;
        f.parts = vec![];
        f.applicable_referers.insert("pinterest.com".to_string());
        let mut h = HeaderBag::new();
        h.insert("Referer", "https://www.pinterest.com");
        assert!(is_match(&f, "http://silly.com/stoopid/url&=b1", &h));
    }

    #[test]
    fn s5_exception_wrong_referer_no_match() {
        let mut f = base_filter();
        f.meta.is_exception = true;
        f.parts = vec![];
        f.applicable_referers.insert("pinterest.com".to_string());
        let mut h = HeaderBag::new();
        h.insert("Referer", "https://www.silsly.com");
        assert!(!is_match(&f, "http://silly.com/stoopid/url&=b1", &h));
    }

    #[test]
    fn content_type_ladder_never_satisfies_two_bits() {
        assert_eq!(content_class("image/script-ish"), ContentClass::Script);
        assert_eq!(content_class("image/png"), ContentClass::Image);
        assert_eq!(content_class("text/stylesheet"), ContentClass::Stylesheet);
        assert_eq!(content_class("text/plain"), ContentClass::Other);
    }

    #[test]
    fn xhr_negative_bit_requires_non_xhr() {
        let mut f = base_filter();
        f.options = UrlFilterOptions::NOT_XMLHTTPREQUEST;
        f.parts = vec![];
        let h = HeaderBag::new();
        assert!(is_match(&f, "http://silly.com/x", &h));

        let mut h2 = HeaderBag::new();
        h2.insert("X-Requested-With", "XMLHttpRequest");
        assert!(!is_match(&f, "http://silly.com/x", &h2));
    }

    #[test]
    fn no_referer_implies_not_third_party() {
        let mut f = base_filter();
        f.options = UrlFilterOptions::NOT_THIRD_PARTY;
        f.parts = vec![];
        let h = HeaderBag::new();
        assert!(is_match(&f, "http://silly.com/x", &h));
    }

    #[test]
    fn request_host_set_gating() {
        let mut f = base_filter();
        f.parts = vec![];
        f.applicable_domains.insert("allowed.com".to_string());
        let h = HeaderBag::new();
        assert!(is_match(&f, "http://allowed.com/x", &h));
        assert!(!is_match(&f, "http://other.com/x", &h));
    }
}
