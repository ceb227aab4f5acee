/// Error types for the remedy suggestion engine.
///
/// `DataLoad` is fatal: the engine has nothing to match against without its reference
/// datasets. `Computation` is recoverable per call and is routed through the engine's
/// `FailurePolicy`.

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to load reference data from {path}: {message}")]
    DataLoad { path: String, message: String },

    #[error("computation error: {0}")]
    Computation(String),
}

impl EngineError {
    pub(crate) fn data_load(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::DataLoad {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
