/// An error type for frame transform queries.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The relationship between the two frames is unavailable.
    #[error("Could not look up transform from '{source_frame}' to '{target_frame}': {reason}")]
    LookupFailure {
        /// Frame the data is expressed in.
        source_frame: String,
        /// Frame the data should be expressed in.
        target_frame: String,
        /// Why the lookup failed.
        reason: String,
    },

    /// The transform was found but could not be applied.
    #[error("Could not apply transform: {0}")]
    ApplyFailure(String),

    /// The query was abandoned because of a shutdown request.
    #[error("Transform query cancelled")]
    Cancelled,
}

impl TransformError {
    pub(crate) fn lookup(source_frame: &str, target_frame: &str, reason: impl Into<String>) -> Self {
        Self::LookupFailure {
            source_frame: source_frame.to_string(),
            target_frame: target_frame.to_string(),
            reason: reason.into(),
        }
    }
}
