//! Error taxonomy for the export pipeline.
//!
//! Every variant is fatal for the run; nothing here warrants a retry. The
//! container is staged in memory, so no variant can leave a partially
//! written file behind.

/// Error type for the export pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to load input geometry: {0}")]
    Import(String),

    #[error(
        "a single face needs {cost} quadwords worst-case, which exceeds the \
         coprocessor capacity of {capacity} quadwords"
    )]
    CapacityOverflow { capacity: usize, cost: usize },

    #[error("packet encoder failed: {0}")]
    Encoder(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
