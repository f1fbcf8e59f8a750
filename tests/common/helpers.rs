use opentelemetry::Context;
use rpc_otel::{Endpoint, INSTRUMENTATION_NAME, RpcInfo, RpcInfoExt, sem_version};
use std::sync::{Arc, OnceLock};
use tracing_subscriber::EnvFilter;

use super::providers::ScopeRecord;

static LOGGING: OnceLock<()> = OnceLock::new();

/// Install a test-writer subscriber once per test binary.
/// Filter with `RUST_LOG=rpc_otel=debug`.
#[allow(dead_code)]
pub fn init_test_logging() {
    LOGGING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// The scope every tracer and meter must be requested with.
#[allow(dead_code)]
pub fn instrumentation_scope() -> ScopeRecord {
    (INSTRUMENTATION_NAME.to_string(), Some(sem_version()))
}

/// A context for a call from `gateway.Forward` to `echo-service.<method>`.
#[allow(dead_code)]
pub fn call_context(method: &str) -> Context {
    Context::new().with_rpc_info(RpcInfo::new(
        Endpoint::new("gateway", "Forward"),
        Endpoint::new("echo-service", method),
    ))
}

/// Address of the value behind an `Arc`, without trait object metadata.
#[allow(dead_code)]
pub fn addr<T: ?Sized>(arc: &Arc<T>) -> *const () {
    Arc::as_ptr(arc).cast::<()>()
}
