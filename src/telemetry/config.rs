//! Resolved instrumentation configuration.
//!
//! A [`Config`] is produced in one pass: seed every field from a
//! [`DefaultsProvider`], apply the caller's [`ConfigOption`]s in order, then
//! derive the meter from the resulting meter provider. Nothing mutates the
//! record after that; middleware only reads it.

use std::sync::Arc;

use opentelemetry::global::{BoxedTracer, ObjectSafeTracerProvider};
use opentelemetry::metrics::{Meter, MeterProvider};
use opentelemetry::{Context, InstrumentationScope, KeyValue};

use crate::error::TelemetryResult;
use crate::telemetry::defaults::{
    DefaultsProvider, GlobalDefaults, SharedMeterProvider, SharedPropagator, SharedTracerProvider,
};
use crate::telemetry::option::{self, ConfigOption};
use crate::telemetry::rpcinfo::{RpcInfo, default_span_name};

/// Name under which tracers and meters are requested from their providers.
pub const INSTRUMENTATION_NAME: &str = env!("CARGO_PKG_NAME");

// Metric attribute keys
pub const RPC_SYSTEM: &str = "rpc.system";
pub const RPC_SERVICE: &str = "rpc.service";
pub const RPC_METHOD: &str = "rpc.method";
pub const SOURCE_SERVICE: &str = "source_service";
pub const SOURCE_OPERATION: &str = "source_operation";

const RPC_SYSTEM_VALUE: &str = "rpc";

/// Version tag shared by the tracer and the meter.
pub fn sem_version() -> String {
    format!("semver:{}", env!("CARGO_PKG_VERSION"))
}

fn instrumentation_scope() -> InstrumentationScope {
    InstrumentationScope::builder(INSTRUMENTATION_NAME)
        .with_version(sem_version())
        .build()
}

/// Maps a call context to a span name.
///
/// Formatters are only invoked by middleware at call time. A failure is
/// reported to that caller and never affects resolution.
pub type SpanNameFormatter = Arc<dyn Fn(&Context) -> TelemetryResult<String> + Send + Sync>;

/// The mutable record options are applied to.
///
/// `meter` stays unset until every option has run; [`Draft::finish`] always
/// replaces it with one derived from the resolved meter provider.
pub(crate) struct Draft {
    pub(crate) tracer: BoxedTracer,
    pub(crate) meter: Option<Meter>,

    pub(crate) tracer_provider: SharedTracerProvider,
    pub(crate) meter_provider: SharedMeterProvider,
    pub(crate) text_map_propagator: SharedPropagator,

    pub(crate) span_name_formatter: SpanNameFormatter,

    pub(crate) with_stack_trace: bool,
    pub(crate) record_source_operation: bool,
}

impl Draft {
    fn seed(defaults: &dyn DefaultsProvider) -> Self {
        let tracer_provider = defaults.tracer_provider();
        let tracer = BoxedTracer::new(tracer_provider.boxed_tracer(instrumentation_scope()));

        Self {
            tracer,
            meter: None,
            tracer_provider,
            meter_provider: defaults.meter_provider(),
            text_map_propagator: defaults.text_map_propagator(),
            span_name_formatter: Arc::new(default_span_name),
            with_stack_trace: true,
            record_source_operation: false,
        }
    }

    fn finish(self) -> Config {
        if self.meter.is_some() {
            tracing::debug!("meter option superseded by meter provider");
        }
        let meter = self.meter_provider.meter_with_scope(instrumentation_scope());

        Config {
            tracer: self.tracer,
            meter,
            tracer_provider: self.tracer_provider,
            meter_provider: self.meter_provider,
            text_map_propagator: self.text_map_propagator,
            span_name_formatter: self.span_name_formatter,
            with_stack_trace: self.with_stack_trace,
            record_source_operation: self.record_source_operation,
        }
    }
}

/// Instrumentation settings handed to RPC tracing and metrics middleware.
///
/// # Example
///
/// ```ignore
/// use rpc_otel::{Config, with_record_source_operation, with_stack_trace};
///
/// let config = Config::new([with_stack_trace(false), with_record_source_operation(true)]);
/// assert!(!config.with_stack_trace());
/// ```
pub struct Config {
    tracer: BoxedTracer,
    meter: Meter,

    tracer_provider: SharedTracerProvider,
    meter_provider: SharedMeterProvider,
    text_map_propagator: SharedPropagator,

    span_name_formatter: SpanNameFormatter,

    with_stack_trace: bool,
    record_source_operation: bool,
}

impl Config {
    /// Resolve `options` over defaults taken from the OpenTelemetry global
    /// registries.
    pub fn new(options: impl IntoIterator<Item = ConfigOption>) -> Self {
        Self::resolve_with(&GlobalDefaults, options)
    }

    /// Create a builder that collects options before resolving.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Resolve `options` over defaults taken from `defaults`.
    ///
    /// This will:
    /// 1. Seed every field from `defaults`, building the tracer eagerly
    /// 2. Apply each option in order (the last option for a field wins)
    /// 3. Derive the meter from the resolved meter provider, discarding any
    ///    meter set by an option
    pub fn resolve_with(
        defaults: &dyn DefaultsProvider,
        options: impl IntoIterator<Item = ConfigOption>,
    ) -> Self {
        let mut draft = Draft::seed(defaults);

        let mut applied = 0usize;
        for opt in options {
            tracing::debug!(field = opt.field(), "applying instrumentation option");
            opt.apply(&mut draft);
            applied += 1;
        }

        let cfg = draft.finish();
        tracing::debug!(
            options = applied,
            instrumentation = INSTRUMENTATION_NAME,
            "resolved instrumentation config"
        );
        cfg
    }

    /// Tracer used to start RPC spans.
    pub fn tracer(&self) -> &BoxedTracer {
        &self.tracer
    }

    /// Meter derived from the resolved meter provider.
    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    /// Tracer provider in effect after all options were applied.
    pub fn tracer_provider(&self) -> &SharedTracerProvider {
        &self.tracer_provider
    }

    /// Meter provider the meter was derived from.
    pub fn meter_provider(&self) -> &SharedMeterProvider {
        &self.meter_provider
    }

    /// Propagator used to carry trace context across RPC metadata.
    pub fn text_map_propagator(&self) -> &SharedPropagator {
        &self.text_map_propagator
    }

    /// Formatter behind [`span_name`](Self::span_name).
    pub fn span_name_formatter(&self) -> &SpanNameFormatter {
        &self.span_name_formatter
    }

    /// Whether stack traces are attached to error events.
    pub fn with_stack_trace(&self) -> bool {
        self.with_stack_trace
    }

    /// Whether the calling method is recorded as a metric dimension.
    pub fn record_source_operation(&self) -> bool {
        self.record_source_operation
    }

    /// Name a span for the call carried by `cx`.
    pub fn span_name(&self, cx: &Context) -> TelemetryResult<String> {
        (self.span_name_formatter)(cx)
    }

    /// Attributes to attach to RPC measurements for `info`.
    ///
    /// `source_operation` is only included when
    /// [`record_source_operation`](Self::record_source_operation) is set.
    pub fn metric_attributes(&self, info: &RpcInfo) -> Vec<KeyValue> {
        let mut attrs = vec![
            KeyValue::new(RPC_SYSTEM, RPC_SYSTEM_VALUE),
            KeyValue::new(RPC_SERVICE, info.to().service_name().to_string()),
            KeyValue::new(RPC_METHOD, info.to().method().to_string()),
            KeyValue::new(SOURCE_SERVICE, info.from().service_name().to_string()),
        ];
        if self.record_source_operation {
            attrs.push(KeyValue::new(
                SOURCE_OPERATION,
                info.from().method().to_string(),
            ));
        }
        attrs
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("text_map_propagator", &self.text_map_propagator)
            .field("with_stack_trace", &self.with_stack_trace)
            .field("record_source_operation", &self.record_source_operation)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Config`].
///
/// Each method queues one option; options are applied in call order when the
/// builder is resolved.
///
/// # Example
///
/// ```ignore
/// let config = Config::builder()
///     .stack_trace(false)
///     .text_map_propagator(Arc::new(TraceContextPropagator::new()))
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    options: Vec<ConfigOption>,
}

impl ConfigBuilder {
    /// Create a builder with no options queued.
    pub fn new() -> Self {
        Self {
            options: Vec::new(),
        }
    }

    /// Queue an already constructed option.
    pub fn option(mut self, option: ConfigOption) -> Self {
        self.options.push(option);
        self
    }

    /// Set the tracer used to start spans.
    pub fn tracer(self, tracer: BoxedTracer) -> Self {
        self.option(option::with_tracer(tracer))
    }

    /// Queue a meter override. It is replaced during resolution; see
    /// [`with_meter`](crate::with_meter).
    pub fn meter(self, meter: Meter) -> Self {
        self.option(option::with_meter(meter))
    }

    /// Set the tracer provider. The tracer itself is not rebuilt.
    pub fn tracer_provider(self, provider: SharedTracerProvider) -> Self {
        self.option(option::with_tracer_provider(provider))
    }

    /// Set the meter provider the meter is derived from.
    pub fn meter_provider(self, provider: SharedMeterProvider) -> Self {
        self.option(option::with_meter_provider(provider))
    }

    /// Set the function that names spans from the call context.
    pub fn span_name_formatter<F>(self, formatter: F) -> Self
    where
        F: Fn(&Context) -> String + Send + Sync + 'static,
    {
        self.option(option::with_span_name_formatter(formatter))
    }

    /// Set whether stack traces are attached to error events.
    pub fn stack_trace(self, stack_trace: bool) -> Self {
        self.option(option::with_stack_trace(stack_trace))
    }

    /// Set whether the calling method is recorded as a metric dimension.
    pub fn record_source_operation(self, record_source_operation: bool) -> Self {
        self.option(option::with_record_source_operation(
            record_source_operation,
        ))
    }

    /// Set the propagator used for RPC metadata.
    pub fn text_map_propagator(self, propagator: SharedPropagator) -> Self {
        self.option(option::with_text_map_propagator(propagator))
    }

    /// Resolve over the OpenTelemetry global registries.
    pub fn build(self) -> Config {
        Config::new(self.options)
    }

    /// Resolve over `defaults`.
    pub fn build_with(self, defaults: &dyn DefaultsProvider) -> Config {
        Config::resolve_with(defaults, self.options)
    }
}
