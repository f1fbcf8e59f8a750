//! Options that override individual fields of a [`Config`](crate::Config).
//!
//! Each option is a blind overwrite of one field. Options for different fields
//! are independent of each other; when several options target the same field,
//! the one applied last wins.

use std::sync::Arc;

use opentelemetry::Context;
use opentelemetry::global::BoxedTracer;
use opentelemetry::metrics::Meter;

use crate::error::TelemetryResult;
use crate::telemetry::config::{Draft, SpanNameFormatter};
use crate::telemetry::defaults::{SharedMeterProvider, SharedPropagator, SharedTracerProvider};

/// A single configuration override, applied during resolution.
///
/// Build these with the `with_*` constructors in this module rather than
/// naming variants directly.
pub enum ConfigOption {
    Tracer(BoxedTracer),
    /// Accepted but always replaced by the meter derived from the resolved
    /// meter provider.
    Meter(Meter),
    TracerProvider(SharedTracerProvider),
    MeterProvider(SharedMeterProvider),
    SpanNameFormatter(SpanNameFormatter),
    StackTrace(bool),
    RecordSourceOperation(bool),
    TextMapPropagator(SharedPropagator),
}

impl ConfigOption {
    /// Name of the configuration field this option overwrites.
    pub fn field(&self) -> &'static str {
        match self {
            ConfigOption::Tracer(_) => "tracer",
            ConfigOption::Meter(_) => "meter",
            ConfigOption::TracerProvider(_) => "tracer_provider",
            ConfigOption::MeterProvider(_) => "meter_provider",
            ConfigOption::SpanNameFormatter(_) => "span_name_formatter",
            ConfigOption::StackTrace(_) => "with_stack_trace",
            ConfigOption::RecordSourceOperation(_) => "record_source_operation",
            ConfigOption::TextMapPropagator(_) => "text_map_propagator",
        }
    }

    pub(crate) fn apply(self, cfg: &mut Draft) {
        match self {
            ConfigOption::Tracer(tracer) => cfg.tracer = tracer,
            ConfigOption::Meter(meter) => cfg.meter = Some(meter),
            ConfigOption::TracerProvider(provider) => cfg.tracer_provider = provider,
            ConfigOption::MeterProvider(provider) => cfg.meter_provider = provider,
            ConfigOption::SpanNameFormatter(formatter) => cfg.span_name_formatter = formatter,
            ConfigOption::StackTrace(enabled) => cfg.with_stack_trace = enabled,
            ConfigOption::RecordSourceOperation(enabled) => {
                cfg.record_source_operation = enabled
            }
            ConfigOption::TextMapPropagator(propagator) => cfg.text_map_propagator = propagator,
        }
    }
}

impl std::fmt::Debug for ConfigOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigOption::StackTrace(enabled) => {
                f.debug_tuple("StackTrace").field(enabled).finish()
            }
            ConfigOption::RecordSourceOperation(enabled) => {
                f.debug_tuple("RecordSourceOperation").field(enabled).finish()
            }
            ConfigOption::TextMapPropagator(propagator) => {
                f.debug_tuple("TextMapPropagator").field(propagator).finish()
            }
            other => f.debug_tuple("ConfigOption").field(&other.field()).finish(),
        }
    }
}

/// Use `tracer` for spans instead of one obtained from the tracer provider.
pub fn with_tracer(tracer: BoxedTracer) -> ConfigOption {
    ConfigOption::Tracer(tracer)
}

/// Set the meter.
///
/// Resolution always finishes by deriving the meter from the meter provider,
/// so this value never survives into the resolved [`Config`](crate::Config). Use
/// [`with_meter_provider`] to change where measurements go.
pub fn with_meter(meter: Meter) -> ConfigOption {
    ConfigOption::Meter(meter)
}

/// Replace the tracer provider.
///
/// The default tracer is built from the default provider before options are
/// applied, so pair this with [`with_tracer`] to also change the tracer.
pub fn with_tracer_provider(provider: SharedTracerProvider) -> ConfigOption {
    ConfigOption::TracerProvider(provider)
}

/// Replace the meter provider the resolved meter is derived from.
pub fn with_meter_provider(provider: SharedMeterProvider) -> ConfigOption {
    ConfigOption::MeterProvider(provider)
}

/// Name spans with `formatter` instead of the destination method name.
///
/// The formatter is not called during resolution, only later by middleware.
pub fn with_span_name_formatter<F>(formatter: F) -> ConfigOption
where
    F: Fn(&Context) -> String + Send + Sync + 'static,
{
    ConfigOption::SpanNameFormatter(Arc::new(move |cx: &Context| -> TelemetryResult<String> {
        Ok(formatter(cx))
    }))
}

/// Control whether stack traces are attached to error events (default: true).
pub fn with_stack_trace(stack_trace: bool) -> ConfigOption {
    ConfigOption::StackTrace(stack_trace)
}

/// Control whether the calling method is recorded as a metric dimension
/// (default: false).
pub fn with_record_source_operation(record_source_operation: bool) -> ConfigOption {
    ConfigOption::RecordSourceOperation(record_source_operation)
}

/// Replace the propagator used to carry trace context across calls.
pub fn with_text_map_propagator(propagator: SharedPropagator) -> ConfigOption {
    ConfigOption::TextMapPropagator(propagator)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use opentelemetry::global;
    use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
    use opentelemetry::trace::TracerProvider as _;

    #[test]
    fn test_option_field_names() {
        assert_eq!(with_stack_trace(false).field(), "with_stack_trace");
        assert_eq!(
            with_record_source_operation(true).field(),
            "record_source_operation"
        );
        assert_eq!(
            with_tracer(global::tracer_provider().tracer("other")).field(),
            "tracer"
        );
        assert_eq!(with_meter(global::meter("other")).field(), "meter");
        assert_eq!(
            with_meter_provider(global::meter_provider()).field(),
            "meter_provider"
        );
        assert_eq!(
            with_span_name_formatter(|_| "x".to_string()).field(),
            "span_name_formatter"
        );
    }

    #[test]
    fn test_span_name_formatter_is_wrapped_infallibly() {
        let option = with_span_name_formatter(|_| "custom".to_string());
        let ConfigOption::SpanNameFormatter(formatter) = option else {
            panic!("Expected span name formatter option");
        };
        assert_eq!(formatter(&Context::new()).unwrap(), "custom");
    }

    #[test]
    fn test_debug_shows_flag_values() {
        assert_eq!(
            format!("{:?}", with_stack_trace(false)),
            "StackTrace(false)"
        );
        assert_eq!(
            format!("{:?}", with_meter(global::meter("other"))),
            "ConfigOption(\"meter\")"
        );
    }

    #[test]
    fn test_text_map_propagator_option_keeps_instance() {
        let propagator: SharedPropagator = Arc::new(TextMapCompositePropagator::new(vec![]));
        let ConfigOption::TextMapPropagator(stored) =
            with_text_map_propagator(Arc::clone(&propagator))
        else {
            panic!("Expected propagator option");
        };
        assert!(Arc::ptr_eq(&stored, &propagator));
        assert_eq!(stored.fields().count(), 0);
    }
}
