/// Errors raised by the pure story rules.
///
/// The rules themselves are total over the typed vocabulary; the only way
/// to fail is to hand in a status string outside it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A word status outside `UNKNOWN`, `PARTIALLY_KNOWN`, `KNOWN`, `NOT_LEARNED`.
    #[error("invalid word status '{value}'")]
    InvalidStatus { value: String },
}
