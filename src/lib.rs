mod error;
mod telemetry;

// Re-export public API
pub use error::{TelemetryError, TelemetryResult};
pub use telemetry::*;

// Re-export opentelemetry so callers build capabilities against the same version
pub use opentelemetry;
