use graphval_api::{ConversionError, EngineStatus, ErrorKind};

/// Error surfaced by the query glue: parameter binding, execution and
/// column access.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineStatus),

    #[error("cannot bind parameter ${name}: {source}")]
    Bind { name: String, source: ConversionError },

    #[error("column {index} out of range for {count} columns")]
    ColumnOutOfRange { index: usize, count: usize },

    #[error("no column named '{0}'")]
    UnknownColumn(String),
}

impl QueryError {
    /// Conversion kind behind this error, if it came from the codec.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            QueryError::Conversion(e) | QueryError::Bind { source: e, .. } => Some(e.kind()),
            _ => None,
        }
    }

    /// Add context to the error.
    ///
    /// For conversion variants, context goes to the inner `ConversionError`.
    /// Structured variants are returned as-is.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            QueryError::Conversion(e) => QueryError::Conversion(e.with_context(ctx)),
            QueryError::Bind { name, source } => QueryError::Bind {
                name,
                source: source.with_context(ctx),
            },
            other => other,
        }
    }
}
