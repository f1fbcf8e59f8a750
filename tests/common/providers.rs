//! Capability fakes that record which instrumentation scopes were requested.

#![allow(dead_code)]

use opentelemetry::metrics::{Meter, MeterProvider};
use opentelemetry::trace::TracerProvider;
use opentelemetry::trace::noop::NoopTracer;
use opentelemetry::{InstrumentationScope, global};
use rpc_otel::{SharedMeterProvider, SharedPropagator, SharedTracerProvider, StaticDefaults};
use std::sync::{Arc, Mutex};

/// Name and version of a requested instrumentation scope.
pub type ScopeRecord = (String, Option<String>);

fn record(scopes: &Mutex<Vec<ScopeRecord>>, scope: &InstrumentationScope) {
    scopes
        .lock()
        .expect("scope log poisoned")
        .push((
            scope.name().to_string(),
            scope.version().map(str::to_string),
        ));
}

/// Tracer provider handing out no-op tracers.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracerProvider {
    scopes: Arc<Mutex<Vec<ScopeRecord>>>,
}

impl RecordingTracerProvider {
    pub fn scopes(&self) -> Vec<ScopeRecord> {
        self.scopes.lock().expect("scope log poisoned").clone()
    }
}

impl TracerProvider for RecordingTracerProvider {
    type Tracer = NoopTracer;

    fn tracer_with_scope(&self, scope: InstrumentationScope) -> Self::Tracer {
        record(&self.scopes, &scope);
        NoopTracer::new()
    }
}

/// Meter provider handing out meters from the global (no-op) provider.
#[derive(Debug, Clone, Default)]
pub struct RecordingMeterProvider {
    scopes: Arc<Mutex<Vec<ScopeRecord>>>,
}

impl RecordingMeterProvider {
    pub fn scopes(&self) -> Vec<ScopeRecord> {
        self.scopes.lock().expect("scope log poisoned").clone()
    }
}

impl MeterProvider for RecordingMeterProvider {
    fn meter_with_scope(&self, scope: InstrumentationScope) -> Meter {
        record(&self.scopes, &scope);
        global::meter_provider().meter_with_scope(scope)
    }
}

/// A deterministic environment snapshot plus handles to inspect it.
pub struct FakeEnvironment {
    pub tracer_provider: RecordingTracerProvider,
    pub meter_provider: RecordingMeterProvider,
    pub propagator: SharedPropagator,
    pub defaults: StaticDefaults,
}

impl FakeEnvironment {
    pub fn new(propagator: SharedPropagator) -> Self {
        let tracer_provider = RecordingTracerProvider::default();
        let meter_provider = RecordingMeterProvider::default();
        let shared_tracer: SharedTracerProvider = Arc::new(tracer_provider.clone());
        let shared_meter: SharedMeterProvider = Arc::new(meter_provider.clone());
        let defaults = StaticDefaults::new(shared_tracer, shared_meter, Arc::clone(&propagator));

        Self {
            tracer_provider,
            meter_provider,
            propagator,
            defaults,
        }
    }
}
