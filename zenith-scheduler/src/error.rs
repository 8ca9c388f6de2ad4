//! Crate-wide error and result types.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the scheduling core.
///
/// Per-job errors (`MalformedJob`, `NotEnoughNodes`) are logged and do not
/// abort the batch; `Cancelled` aborts the batch; the rest are
/// chain/processor/handshake-scoped and never propagate further than the
/// request that triggered them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resource hierarchy does not satisfy the `{grid? -> clusters ->
    /// partitions* -> nodes}` shape, or an id is missing, duplicated, or of
    /// the wrong kind.
    #[error("invalid resource hierarchy: {0}")]
    InvalidHierarchy(String),

    /// A job is missing a required field (e.g. no `node` resource request,
    /// or a count < 1).
    #[error("malformed job {job_id}: {reason}")]
    MalformedJob {
        /// The offending job's id.
        job_id: String,
        /// Why the job was rejected.
        reason: String,
    },

    /// Fewer eligible nodes than requested were available for a job.
    #[error("not enough nodes for job {job_id}: requested {requested}, found {found}")]
    NotEnoughNodes {
        /// The offending job's id.
        job_id: String,
        /// Nodes requested.
        requested: usize,
        /// Nodes actually available.
        found: usize,
    },

    /// The cancellation signal was observed; the batch was aborted.
    #[error("scheduling cancelled")]
    Cancelled,

    /// A command referenced a chain id that is not in the processor's map.
    #[error("chain not found: {0}")]
    ChainNotFound(String),

    /// A SCHEDULE command reused a chain id that is still active.
    #[error("chain already exists: {0}")]
    ChainAlreadyExists(String),

    /// An exchange or interrupt handshake did not complete within its
    /// configured timeout.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(std::time::Duration),

    /// The exchange partner stopped before the handshake completed.
    #[error("exchange partner stopped")]
    PartnerStopped,

    /// No known algorithm descriptor satisfied a requested `AlgorithmSpec`.
    #[error("no algorithm matched spec: family={family}, version={version:?}, device_type={device_type:?}")]
    NoMatchingAlgorithm {
        /// Requested family.
        family: String,
        /// Requested version, if any.
        version: Option<String>,
        /// Requested device type, if any.
        device_type: Option<String>,
    },

    /// A plugin-level failure surfaced as an exception-like signal at the
    /// algorithm boundary.
    #[error("plugin fault: {0}")]
    PluginFault(String),

    /// The command input could not be read or parsed; the owning worker
    /// exits cleanly rather than retrying.
    #[error("io fault: {0}")]
    IoFault(#[from] std::io::Error),

    /// A snapshot or command payload failed to deserialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid CLI configuration.
    #[error("configuration error: {0}")]
    Config(String),
}
