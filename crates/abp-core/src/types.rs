//! Option bitset for compiled URL filters.
//!
//! Each recognised ABP option token (and its `~`-negated counterpart, where
//! one exists) maps to a single bit. Most of this universe is parsed and
//! preserved on the filter object purely for fidelity; only the subset
//! documented on [`UrlFilterOptions`] affects matcher behaviour, see
//! `matcher.rs`.

bitflags::bitflags! {
    /// Bitset over the full ABP option token universe (spec §4.2).
    ///
    /// Behavioural subset (consulted by the matcher): `XMLHTTPREQUEST` /
    /// `NOT_XMLHTTPREQUEST`, `THIRD_PARTY` / `NOT_THIRD_PARTY`, `SCRIPT` /
    /// `NOT_SCRIPT`, `IMAGE` / `NOT_IMAGE`, `STYLESHEET` / `NOT_STYLESHEET`,
    /// and `MATCH_CASE`. Every other bit here is recognised at parse time,
    /// round-trips through the filter object, and is otherwise inert.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UrlFilterOptions: u64 {
        // content type
        const SCRIPT               = 1 << 0;
        const NOT_SCRIPT           = 1 << 1;
        const IMAGE                = 1 << 2;
        const NOT_IMAGE            = 1 << 3;
        const STYLESHEET           = 1 << 4;
        const NOT_STYLESHEET       = 1 << 5;
        const OBJECT               = 1 << 6;
        const NOT_OBJECT           = 1 << 7;
        const SUBDOCUMENT          = 1 << 8;
        const NOT_SUBDOCUMENT      = 1 << 9;
        const XMLHTTPREQUEST       = 1 << 10;
        const NOT_XMLHTTPREQUEST   = 1 << 11;
        const WEBSOCKET            = 1 << 12;
        const NOT_WEBSOCKET        = 1 << 13;
        const OBJECT_SUBREQUEST    = 1 << 14;
        const NOT_OBJECT_SUBREQUEST = 1 << 15;
        const DOCUMENT             = 1 << 16;
        const NOT_DOCUMENT         = 1 << 17;
        const ELEMHIDE             = 1 << 18;
        const NOT_ELEMHIDE         = 1 << 19;
        const OTHER                = 1 << 20;
        const NOT_OTHER            = 1 << 21;
        const MEDIA                = 1 << 22;
        const NOT_MEDIA            = 1 << 23;
        const FONT                 = 1 << 24;
        const NOT_FONT             = 1 << 25;
        const PING                 = 1 << 26;
        const NOT_PING             = 1 << 27;

        // request context
        const POPUP                = 1 << 28;
        const NOT_POPUP            = 1 << 29;
        const THIRD_PARTY          = 1 << 30;
        const NOT_THIRD_PARTY      = 1 << 31;
        const DONOTTRACK           = 1 << 32;
        const GENERICHIDE          = 1 << 33;
        const GENERICBLOCK         = 1 << 34;
        const COLLAPSE             = 1 << 35;
        const NOT_COLLAPSE         = 1 << 36;

        // matching modifier
        const MATCH_CASE           = 1 << 37;
    }
}

impl UrlFilterOptions {
    /// Look up the bit for a single (already `~`-stripped) option token, or
    /// `None` for an unrecognised token. §4.1 says unrecognised tokens are
    /// ignored rather than causing a parse failure.
    ///
    /// `negated` selects the `NOT_*` variant for tokens that have one;
    /// tokens with no negated form (e.g. `matchcase`) ignore it.
    pub fn from_token(token: &str, negated: bool) -> Option<Self> {
        use UrlFilterOptions as F;
        let pair = match token {
            "script" => (F::SCRIPT, F::NOT_SCRIPT),
            "image" => (F::IMAGE, F::NOT_IMAGE),
            "stylesheet" => (F::STYLESHEET, F::NOT_STYLESHEET),
            "object" => (F::OBJECT, F::NOT_OBJECT),
            "subdocument" => (F::SUBDOCUMENT, F::NOT_SUBDOCUMENT),
            "xmlhttprequest" => (F::XMLHTTPREQUEST, F::NOT_XMLHTTPREQUEST),
            "websocket" => (F::WEBSOCKET, F::NOT_WEBSOCKET),
            "object-subrequest" => (F::OBJECT_SUBREQUEST, F::NOT_OBJECT_SUBREQUEST),
            "document" => (F::DOCUMENT, F::NOT_DOCUMENT),
            "elemhide" => (F::ELEMHIDE, F::NOT_ELEMHIDE),
            "other" => (F::OTHER, F::NOT_OTHER),
            "media" => (F::MEDIA, F::NOT_MEDIA),
            "font" => (F::FONT, F::NOT_FONT),
            "ping" => (F::PING, F::NOT_PING),
            "popup" => (F::POPUP, F::NOT_POPUP),
            "third-party" => (F::THIRD_PARTY, F::NOT_THIRD_PARTY),
            "collapse" => (F::COLLAPSE, F::NOT_COLLAPSE),
            "donottrack" => return Some(F::DONOTTRACK),
            "generichide" => return Some(F::GENERICHIDE),
            "genericblock" => return Some(F::GENERICBLOCK),
            "matchcase" => return Some(F::MATCH_CASE),
            _ => return None,
        };
        Some(if negated { pair.1 } else { pair.0 })
    }
}
