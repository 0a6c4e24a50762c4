//! The fragment match program: a left-to-right sequence of tagged match
//! steps evaluated against an absolute URI and its host.
//!
//! This replaces the class-hierarchy-of-fragment-types shape with a plain
//! tagged enum and a single evaluator loop; there is no virtual dispatch
//! on this hot path.

use crate::text;
use crate::uri;

/// One step of a compiled URL filter's match program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Must equal or be a suffix of the URI host at a domain boundary.
    AnchoredDomain(String),
    /// Must match the absolute URI starting at offset 0.
    AnchoredAddress(String, bool),
    /// Must appear in the absolute URI at or after the current cursor.
    StringLiteral(String, bool),
    /// Consumes at least one character from the cursor.
    Wildcard,
    /// Consumes up to and including the next separator character.
    Separator,
}

/// Evaluate a compiled fragment program against an absolute URI.
///
/// A cursor starts at 0; each fragment either advances it to a new
/// non-negative offset or fails the whole program. An empty program (no
/// fragments) trivially succeeds: such a rule matches every URI and
/// relies entirely on its option/domain/referer constraints.
pub fn eval_program(fragments: &[Fragment], uri_str: &str) -> bool {
    let mut cursor: usize = 0;

    for fragment in fragments {
        match fragment {
            Fragment::AnchoredAddress(literal, case_sensitive) => {
                if !text::starts_with(uri_str, literal, *case_sensitive) {
                    return false;
                }
                cursor = literal.len();
            }
            Fragment::AnchoredDomain(host) => {
                let request_host = match uri::extract_host(uri_str) {
                    Some(h) => h,
                    None => return false,
                };
                if !domain_suffix_match(request_host, host) {
                    return false;
                }
                cursor = match uri_str.find(request_host) {
                    Some(host_off) => host_off + request_host.len(),
                    None => return false,
                };
            }
            Fragment::StringLiteral(value, case_sensitive) => {
                match text::find_from(uri_str, value, cursor, *case_sensitive) {
                    Some(pos) => cursor = pos + value.len(),
                    None => return false,
                }
            }
            Fragment::Wildcard => {
                if cursor >= uri_str.len() {
                    return false;
                }
                cursor += 1;
            }
            Fragment::Separator => {
                let bytes = uri_str.as_bytes();
                match bytes[cursor.min(bytes.len())..]
                    .iter()
                    .position(|&b| uri::is_separator_char(b))
                {
                    Some(rel) => cursor = cursor + rel + 1,
                    None => return false,
                }
            }
        }
    }

    true
}

/// Whether `host` equals `anchor` or ends with `.{anchor}`, ASCII
/// case-insensitive, at a `.`-boundary.
fn domain_suffix_match(host: &str, anchor: &str) -> bool {
    if text::eq(host, anchor, false) {
        return true;
    }
    host.len() > anchor.len()
        && text::ends_with(host, anchor, false)
        && host.as_bytes()[host.len() - anchor.len() - 1] == b'.'
}
