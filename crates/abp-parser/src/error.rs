/// Parser failures. Always local: the caller counts these and skips the
/// offending line rather than treating them as propagating errors (parser
/// errors are local, store errors are surfaced).
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty or comment line")]
    EmptyOrComment,
    #[error("malformed rule")]
    MalformedRule,
    #[error("empty css selector")]
    EmptySelector,
}
