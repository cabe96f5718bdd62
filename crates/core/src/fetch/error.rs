use thiserror::Error;

/// # Summary
/// Fare fetch errors. Every variant means "no observation this cycle";
/// none of them is fatal to a run.
///
/// # Invariants
/// - Must derive `Error` through `thiserror`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    // Transport failure or non-success HTTP status
    #[error("Network error: {0}")]
    Network(String),
    // Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
    // Provider answered but flagged the request as failed
    #[error("Provider error: {0}")]
    Api(String),
    // Missing credentials or unusable search parameters
    #[error("Configuration error: {0}")]
    Config(String),
}
