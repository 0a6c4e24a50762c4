/// Store failures. Unlike parser errors these are surfaced to the caller
/// rather than counted and skipped (spec §7).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("store has already been finalized for read-only access")]
    AlreadyFinalized,
    #[error("store is read-only; call is not valid after finalize_for_read")]
    ReadOnly,
}
