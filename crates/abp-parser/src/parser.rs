use std::collections::HashSet;

use abp_core::fragment::Fragment;
use abp_core::types::UrlFilterOptions;
use abp_core::uri;
use abp_core::{Filter, FilterMeta, HtmlFilter, UrlFilter};

use crate::error::ParseError;

/// Parse one line of ABP filter-list text into a [`Filter`].
///
/// `category_id` is a freeform tag the caller assigns (e.g. which
/// subscription the line came from); it is stored on the resulting filter
/// and has no parser-internal meaning.
pub fn parse_rule(line: &str, category_id: u16) -> Result<Filter, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || is_comment_line(trimmed) {
        return Err(ParseError::EmptyOrComment);
    }

    if let Some(html) = parse_element_hide(trimmed, category_id)? {
        return Ok(Filter::Html(html));
    }

    parse_url_filter(trimmed, category_id).map(Filter::Url)
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('!') || line.starts_with('[')
}

// ---------------------------------------------------------------------------
// Element-hide rules
// ---------------------------------------------------------------------------

fn parse_element_hide(line: &str, category_id: u16) -> Result<Option<HtmlFilter>, ParseError> {
    let (sentinel_start, sentinel_len, is_exception) = if let Some(idx) = line.rfind("##") {
        (idx, 2, false)
    } else if let Some(idx) = line.rfind("#@") {
        (idx, 3, true)
    } else {
        return Ok(None);
    };

    let tail_start = sentinel_start + sentinel_len;
    if tail_start > line.len() {
        return Err(ParseError::MalformedRule);
    }

    let domains_text = &line[..sentinel_start];
    let selector = line[tail_start..].trim();
    if selector.is_empty() {
        return Err(ParseError::EmptySelector);
    }

    let (applicable_domains, exception_domains) = parse_pipe_or_comma_domain_list(domains_text, ',');

    Ok(Some(HtmlFilter {
        meta: FilterMeta {
            original_rule: Some(line.to_string()),
            is_exception,
            category_id,
        },
        css_selector: selector.to_string(),
        applicable_domains,
        exception_domains,
    }))
}

// ---------------------------------------------------------------------------
// URL filter rules
// ---------------------------------------------------------------------------

fn parse_url_filter(line: &str, category_id: u16) -> Result<UrlFilter, ParseError> {
    let is_exception = line.starts_with("@@");
    let body_line = if is_exception { &line[2..] } else { line };

    let (pattern_part, options_text) = split_rule_options(body_line);

    let mut options = UrlFilterOptions::empty();
    let mut applicable_domains = HashSet::new();
    let mut exception_domains = HashSet::new();
    let mut applicable_referers = HashSet::new();
    let mut exception_referers = HashSet::new();

    if let Some(options_text) = options_text {
        for raw in options_text.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }

            if has_domain_fast_path(token) {
                let (inc, exc) = parse_pipe_or_comma_domain_list(&token[7..], '|');
                applicable_domains.extend(inc);
                exception_domains.extend(exc);
                continue;
            }
            if has_referer_fast_path(token) {
                let (inc, exc) = parse_pipe_or_comma_domain_list(&token[8..], '|');
                applicable_referers.extend(inc);
                exception_referers.extend(exc);
                continue;
            }

            let lower = token.to_ascii_lowercase();
            let (negated, name) = match lower.strip_prefix('~') {
                Some(rest) => (true, rest),
                None => (false, lower.as_str()),
            };
            if let Some(bit) = UrlFilterOptions::from_token(name, negated) {
                options |= bit;
            }
            // unrecognised tokens are silently ignored, per spec §4.1
        }
    }

    let match_case = options.contains(UrlFilterOptions::MATCH_CASE);
    let (parts, anchored_host) = compile_body(pattern_part.trim(), match_case);
    if let Some(host) = anchored_host {
        applicable_domains.insert(host);
    }

    Ok(UrlFilter {
        meta: FilterMeta {
            original_rule: Some(line.to_string()),
            is_exception,
            category_id,
        },
        parts,
        options,
        applicable_domains,
        exception_domains,
        applicable_referers,
        exception_referers,
    })
}

fn split_rule_options(line: &str) -> (&str, Option<&str>) {
    match line.rfind('$') {
        Some(pos) => (&line[..pos], Some(&line[pos + 1..])),
        None => (line, None),
    }
}

/// The `domain=` fast-path predicate from spec §4.1: `length > 7 AND first
/// byte is 'd' AND byte at index 6 is '='`. Deliberately not `starts_with`:
/// this excludes the bare literal token `"domain="` (length 7) even though
/// it visually looks like a match. Preserve as-is; see `DESIGN.md`.
fn has_domain_fast_path(token: &str) -> bool {
    let b = token.as_bytes();
    token.len() > 7 && b[0] == b'd' && b.get(6) == Some(&b'=')
}

/// The `referer=` fast-path predicate: `length > 7 AND first byte is 'r'
/// AND byte at index 7 is '='`. Unlike the `domain=` case this has no
/// off-by-one quirk in practice, since the literal token `"referer="` is
/// already 8 bytes long.
fn has_referer_fast_path(token: &str) -> bool {
    let b = token.as_bytes();
    token.len() > 7 && b[0] == b'r' && b.get(7) == Some(&b'=')
}

/// Split a `sep`-delimited host list, routing `~`-prefixed entries to the
/// exception set and the rest to the applicable set.
fn parse_pipe_or_comma_domain_list(value: &str, sep: char) -> (HashSet<String>, HashSet<String>) {
    let mut applicable = HashSet::new();
    let mut exception = HashSet::new();
    for raw in value.split(sep) {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match raw.strip_prefix('~') {
            Some(rest) if !rest.is_empty() => {
                exception.insert(rest.to_string());
            }
            Some(_) => {}
            None => {
                applicable.insert(raw.to_string());
            }
        }
    }
    (applicable, exception)
}

/// Compile a URL filter's body into a left-to-right fragment program.
/// Returns the fragments plus an optional host extracted from a leading
/// `||`/`|` anchor, to be folded into `applicable_domains`.
fn compile_body(body: &str, case_sensitive: bool) -> (Vec<Fragment>, Option<String>) {
    let bytes = body.as_bytes();
    let mut fragments = Vec::new();
    let mut extracted_host = None;
    let mut cursor;

    if let Some(rest) = body.strip_prefix("||") {
        let start = 2;
        let mut end = start;
        let rest_bytes = rest.as_bytes();
        while end - start < rest_bytes.len() && !uri::is_anchor_end(rest_bytes[end - start]) {
            end += 1;
        }
        let host = &body[start..end];
        fragments.push(Fragment::AnchoredDomain(host.to_string()));
        extracted_host = Some(host.to_string());
        cursor = end;
    } else if body.starts_with('|') {
        let start = 1;
        let mut end = start;
        while end < bytes.len() && bytes[end] != b'|' && !uri::is_anchor_end(bytes[end]) {
            end += 1;
        }
        let captured = &body[start..end];
        let consumed_end = if end < bytes.len() && bytes[end] == b'|' { end + 1 } else { end };
        fragments.push(Fragment::AnchoredAddress(captured.to_string(), case_sensitive));
        if let Some(host) = uri::extract_host(captured) {
            extracted_host = Some(host.to_string());
        }
        cursor = consumed_end;
    } else {
        cursor = 0;
    }

    let mut literal_start = cursor;
    while cursor < bytes.len() {
        match bytes[cursor] {
            b'*' => {
                flush_literal(&mut fragments, body, literal_start, cursor, case_sensitive);
                fragments.push(Fragment::Wildcard);
                literal_start = cursor + 1;
            }
            b'^' => {
                flush_literal(&mut fragments, body, literal_start, cursor, case_sensitive);
                fragments.push(Fragment::Separator);
                literal_start = cursor + 1;
            }
            _ => {}
        }
        cursor += 1;
    }
    flush_literal(&mut fragments, body, literal_start, body.len(), case_sensitive);

    (fragments, extracted_host)
}

fn flush_literal(fragments: &mut Vec<Fragment>, body: &str, start: usize, end: usize, case_sensitive: bool) {
    if end > start {
        fragments.push(Fragment::StringLiteral(body[start..end].to_string(), case_sensitive));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_comment_lines_are_rejected() {
        assert_eq!(parse_rule("", 0), Err(ParseError::EmptyOrComment));
        assert_eq!(parse_rule("   ", 0), Err(ParseError::EmptyOrComment));
        assert_eq!(parse_rule("! a comment", 0), Err(ParseError::EmptyOrComment));
        assert_eq!(parse_rule("[Adblock Plus 2.0]", 0), Err(ParseError::EmptyOrComment));
    }

    #[test]
    fn element_hide_basic() {
        let f = parse_rule("example.com##.banner", 1).unwrap();
        match f {
            Filter::Html(h) => {
                assert!(!h.meta.is_exception);
                assert_eq!(h.css_selector, ".banner");
                assert!(h.applicable_domains.contains("example.com"));
            }
            _ => panic!("expected html filter"),
        }
    }

    #[test]
    fn element_hide_exception() {
        let f = parse_rule("example.com#@#.banner", 1).unwrap();
        match f {
            Filter::Html(h) => assert!(h.meta.is_exception),
            _ => panic!("expected html filter"),
        }
    }

    #[test]
    fn element_hide_empty_selector_is_error() {
        assert_eq!(parse_rule("example.com##", 0), Err(ParseError::EmptySelector));
    }

    #[test]
    fn anchored_domain_round_trip() {
        let f = parse_rule("||host.com^path", 0).unwrap();
        match f {
            Filter::Url(u) => {
                assert!(u.applicable_domains.contains("host.com"));
                assert!(u.is_match(
                    "http://host.com/path",
                    &abp_core::HeaderBag::new()
                ));
                assert!(u.is_match(
                    "http://sub.host.com/path",
                    &abp_core::HeaderBag::new()
                ));
                assert!(!u.is_match(
                    "http://nothost.com/path",
                    &abp_core::HeaderBag::new()
                ));
            }
            _ => panic!("expected url filter"),
        }
    }

    #[test]
    fn option_token_sets_single_bit() {
        let f = parse_rule("||a.com^$script", 0).unwrap();
        match f {
            Filter::Url(u) => {
                assert_eq!(u.options, UrlFilterOptions::SCRIPT);
            }
            _ => panic!("expected url filter"),
        }
    }

    #[test]
    fn domain_fan_out_option() {
        let f = parse_rule("r$domain=a.com|b.com|~c.com", 0).unwrap();
        match f {
            Filter::Url(u) => {
                assert!(u.applicable_domains.contains("a.com"));
                assert!(u.applicable_domains.contains("b.com"));
                assert_eq!(u.exception_domains, HashSet::from(["c.com".to_string()]));
            }
            _ => panic!("expected url filter"),
        }
    }

    #[test]
    fn domain_fast_path_quirk_excludes_bare_token() {
        assert!(!has_domain_fast_path("domain="));
        assert!(has_domain_fast_path("domain=x"));
        assert!(has_referer_fast_path("referer="));
    }

    #[test]
    fn exception_rule_is_flagged() {
        let f = parse_rule("@@$referer=pinterest.com", 0).unwrap();
        match f {
            Filter::Url(u) => {
                assert!(u.meta.is_exception);
                assert!(u.applicable_referers.contains("pinterest.com"));
                assert!(u.parts.is_empty());
            }
            _ => panic!("expected url filter"),
        }
    }

    #[test]
    fn wildcard_and_separator_compile() {
        let f = parse_rule("||silly.com^stoopid^url^*1$xmlhttprequest,script,~third-party", 0).unwrap();
        match f {
            Filter::Url(u) => {
                assert!(u.is_match(
                    "http://silly.com/stoopid/url&=b1",
                    &{
                        let mut h = abp_core::HeaderBag::new();
                        h.insert("X-Requested-With", "XmlHttpRequest");
                        h.insert("Content-Type", "script");
                        h
                    }
                ));
            }
            _ => panic!("expected url filter"),
        }
    }

    #[test]
    fn address_anchor_stops_at_first_anchor_end_char() {
        // The `|` capture stops at the first anchor-end character, which
        // for a typical "http://" address is the ':' right after the
        // scheme name -- so only "http" is captured as the anchored
        // literal and the rest of the address becomes an ordinary
        // string-literal fragment walked from there.
        let f = parse_rule("|http://exact.com/x", 0).unwrap();
        match f {
            Filter::Url(u) => {
                assert_eq!(u.parts[0], Fragment::AnchoredAddress("http".to_string(), false));
                assert!(u.is_match("http://exact.com/x", &abp_core::HeaderBag::new()));
            }
            _ => panic!("expected url filter"),
        }
    }

    #[test]
    fn address_anchor_with_matching_trailing_pipe() {
        let f = parse_rule("|localhost|", 0).unwrap();
        match f {
            Filter::Url(u) => {
                assert_eq!(u.parts, vec![Fragment::AnchoredAddress("localhost".to_string(), false)]);
                assert!(u.is_match("localhost", &abp_core::HeaderBag::new()));
            }
            _ => panic!("expected url filter"),
        }
    }
}
