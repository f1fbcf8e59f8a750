//! Instrumentation configuration for RPC tracing and metrics middleware.
//!
//! This module provides:
//! - [`ConfigOption`] values and the `with_*` constructors that build them
//! - [`Config`], resolved from defaults plus an ordered list of options
//! - [`DefaultsProvider`] implementations for the OpenTelemetry globals and
//!   for fixed capability sets
//! - RPC metadata on the call context and trace context propagation helpers
//!
//! # Usage
//!
//! This module does **not** install providers or exporters. Register your
//! tracer provider, meter provider and propagator with `opentelemetry::global`
//! (or pass them through a [`StaticDefaults`]) before resolving a [`Config`].

mod config;
mod defaults;
mod option;
mod propagation;
mod rpcinfo;

pub use config::{
    Config, ConfigBuilder, INSTRUMENTATION_NAME, RPC_METHOD, RPC_SERVICE, RPC_SYSTEM,
    SOURCE_OPERATION, SOURCE_SERVICE, SpanNameFormatter, sem_version,
};
pub use defaults::{
    DefaultsProvider, GlobalDefaults, GlobalPropagator, SharedMeterProvider, SharedPropagator,
    SharedTracerProvider, StaticDefaults,
};
pub use option::*;
pub use propagation::{
    extract_trace_context, has_trace_context, inject_current_span, inject_trace_context,
};
pub use rpcinfo::{Endpoint, RpcInfo, RpcInfoExt, default_span_name};
