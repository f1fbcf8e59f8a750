//! RPC metadata carried on an OpenTelemetry [`Context`].
//!
//! Transport layers attach an [`RpcInfo`] to the call context before invoking
//! instrumentation middleware. The default span name formatter reads the
//! destination method from it.

use opentelemetry::Context;

use crate::error::{TelemetryError, TelemetryResult};

/// One side of an RPC call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    service_name: String,
    method: String,
    address: Option<String>,
}

impl Endpoint {
    pub fn new(service_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            method: method.into(),
            address: None,
        }
    }

    /// Attach the peer address (e.g. `"10.0.0.7:8888"`).
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

/// Caller and callee of a single RPC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcInfo {
    from: Endpoint,
    to: Endpoint,
}

impl RpcInfo {
    pub fn new(from: Endpoint, to: Endpoint) -> Self {
        Self { from, to }
    }

    /// The calling endpoint.
    pub fn from(&self) -> &Endpoint {
        &self.from
    }

    /// The endpoint being called.
    pub fn to(&self) -> &Endpoint {
        &self.to
    }
}

/// Access to [`RpcInfo`] stored on a [`Context`].
pub trait RpcInfoExt {
    /// Return a copy of this context carrying `info`.
    fn with_rpc_info(&self, info: RpcInfo) -> Context;

    /// The RPC metadata attached to this context, if any.
    fn rpc_info(&self) -> Option<&RpcInfo>;
}

impl RpcInfoExt for Context {
    fn with_rpc_info(&self, info: RpcInfo) -> Context {
        self.with_value(info)
    }

    fn rpc_info(&self) -> Option<&RpcInfo> {
        self.get::<RpcInfo>()
    }
}

/// Name a span after the destination method of the call.
///
/// Fails with [`TelemetryError::MissingRpcInfo`] when `cx` carries no
/// [`RpcInfo`].
pub fn default_span_name(cx: &Context) -> TelemetryResult<String> {
    cx.rpc_info()
        .map(|info| info.to().method().to_string())
        .ok_or(TelemetryError::MissingRpcInfo)
}
