//! Relay request errors.
//!
//! Only failures that happen before streaming starts are represented here;
//! once both branches are running, provider problems degrade to per-branch
//! status events instead.

/// Relay failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum RelayErrorKind {
    /// Prompt was missing or blank
    #[display("prompt is required")]
    InvalidPrompt,
    /// The comparison run record could not be created
    #[display("Failed to create comparison run: {}", _0)]
    RunCreation(String),
}

/// Relay error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Relay Error: {} at line {} in {}", kind, line, file)]
pub struct RelayError {
    /// The kind of error that occurred
    pub kind: RelayErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RelayError {
    /// Create a new RelayError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RelayErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
