use thiserror::Error;

/// # Summary
/// Reporter errors.
///
/// # Invariants
/// - Must derive `Error` through `thiserror`.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Building the output (chart drawing, serialization) failed
    #[error("Render error: {0}")]
    Render(String),
    /// Writing the output file failed
    #[error("I/O error: {0}")]
    Io(String),
}
