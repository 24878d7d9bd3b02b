use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "Truncated payload in record {sequence} at offset {offset}: expected {expected} bytes, copied {copied}"
    )]
    TruncatedPayload {
        sequence: u32,
        offset: u64,
        expected: u64,
        copied: u64,
    },

    #[error("Cannot create output for record {sequence}: {source}")]
    SinkUnavailable {
        sequence: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write output for record {sequence}: {source}")]
    SinkWrite {
        sequence: u32,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    /// Whether the failure came from the output side rather than the source.
    #[must_use]
    pub fn is_sink_error(&self) -> bool {
        matches!(self, Self::SinkUnavailable { .. } | Self::SinkWrite { .. })
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
