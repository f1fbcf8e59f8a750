use thiserror::Error;

/// Error type for failures surfaced when a resolved [`Config`](crate::Config)
/// is used.
///
/// Resolving a configuration never fails. These errors only appear later, when
/// downstream middleware invokes a collaborator such as the span name
/// formatter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// The call context carries no RPC metadata, so the default span name
    /// formatter has no destination method to read.
    #[error("call context carries no RPC info")]
    MissingRpcInfo,
}

/// Result type alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
