//! Sources of default capabilities used to seed a [`Config`](crate::Config).
//!
//! Resolution reads its defaults through a [`DefaultsProvider`] instead of
//! reaching for the OpenTelemetry global registries directly. [`GlobalDefaults`]
//! is backed by `opentelemetry::global`; [`StaticDefaults`] returns a fixed set
//! of capabilities and never touches process-wide state.

use std::sync::{Arc, Mutex, PoisonError};

use opentelemetry::Context;
use opentelemetry::global;
use opentelemetry::global::ObjectSafeTracerProvider;
use opentelemetry::metrics::MeterProvider;
use opentelemetry::propagation::text_map_propagator::FieldIter;
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};

/// Tracer factory shared between configurations.
pub type SharedTracerProvider = Arc<dyn ObjectSafeTracerProvider + Send + Sync>;

/// Meter factory shared between configurations.
pub type SharedMeterProvider = Arc<dyn MeterProvider + Send + Sync>;

/// Trace context propagator shared between configurations.
pub type SharedPropagator = Arc<dyn TextMapPropagator + Send + Sync>;

/// Supplies the capabilities a configuration falls back to when no option
/// overrides them.
///
/// Each method is called once per resolution, so an implementation backed by
/// mutable registries may hand out different values over time.
pub trait DefaultsProvider {
    fn tracer_provider(&self) -> SharedTracerProvider;

    fn meter_provider(&self) -> SharedMeterProvider;

    fn text_map_propagator(&self) -> SharedPropagator;
}

/// Defaults read from the OpenTelemetry global registries.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalDefaults;

impl DefaultsProvider for GlobalDefaults {
    fn tracer_provider(&self) -> SharedTracerProvider {
        Arc::new(global::tracer_provider())
    }

    fn meter_provider(&self) -> SharedMeterProvider {
        global::meter_provider()
    }

    fn text_map_propagator(&self) -> SharedPropagator {
        Arc::new(GlobalPropagator::new())
    }
}

/// Handle to the globally registered text map propagator.
///
/// The global registry does not hand out owned propagators, so every method
/// is forwarded to whatever propagator is registered when it runs. A config
/// resolved before `global::set_text_map_propagator` therefore follows the
/// propagator registered later, for injection, extraction and `fields()`
/// alike.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalPropagator;

impl GlobalPropagator {
    pub fn new() -> Self {
        Self
    }
}

/// Field lists of every propagator seen through [`GlobalPropagator`].
///
/// `fields()` must hand out a borrowed slice, but the registry only lends its
/// propagator inside a callback. Each distinct list is leaked once and reused.
static INTERNED_FIELDS: Mutex<Vec<&'static [String]>> = Mutex::new(Vec::new());

fn intern_fields(fields: Vec<String>) -> &'static [String] {
    let mut interned = INTERNED_FIELDS
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = interned.iter().find(|known| **known == fields.as_slice()) {
        return *existing;
    }
    let leaked: &'static [String] = Vec::leak(fields);
    interned.push(leaked);
    leaked
}

impl TextMapPropagator for GlobalPropagator {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        global::get_text_map_propagator(|p| p.inject_context(cx, &mut *injector))
    }

    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        global::get_text_map_propagator(|p| p.extract_with_context(cx, extractor))
    }

    fn fields(&self) -> FieldIter<'_> {
        let fields =
            global::get_text_map_propagator(|p| p.fields().map(|f| f.to_string()).collect());
        FieldIter::new(intern_fields(fields))
    }
}

/// A fixed snapshot of default capabilities.
///
/// Every resolution against the same `StaticDefaults` sees the same provider
/// and propagator instances.
#[derive(Clone)]
pub struct StaticDefaults {
    tracer_provider: SharedTracerProvider,
    meter_provider: SharedMeterProvider,
    text_map_propagator: SharedPropagator,
}

impl StaticDefaults {
    pub fn new(
        tracer_provider: SharedTracerProvider,
        meter_provider: SharedMeterProvider,
        text_map_propagator: SharedPropagator,
    ) -> Self {
        Self {
            tracer_provider,
            meter_provider,
            text_map_propagator,
        }
    }
}

impl std::fmt::Debug for StaticDefaults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticDefaults")
            .field("text_map_propagator", &self.text_map_propagator)
            .finish_non_exhaustive()
    }
}

impl DefaultsProvider for StaticDefaults {
    fn tracer_provider(&self) -> SharedTracerProvider {
        Arc::clone(&self.tracer_provider)
    }

    fn meter_provider(&self) -> SharedMeterProvider {
        Arc::clone(&self.meter_provider)
    }

    fn text_map_propagator(&self) -> SharedPropagator {
        Arc::clone(&self.text_map_propagator)
    }
}
