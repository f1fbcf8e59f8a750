//! Trace context propagation through RPC metadata.
//!
//! Client middleware injects the caller's trace context into the outgoing
//! metadata map; server middleware extracts it to parent its own span. Both
//! directions go through the configured
//! [`text_map_propagator`](crate::Config::text_map_propagator), so the wire
//! format (W3C `traceparent`, baggage, ...) is whatever the caller chose.

use opentelemetry::Context;
use opentelemetry::propagation::{Extractor, Injector};
use std::collections::HashMap;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::telemetry::config::Config;

/// Wrapper to implement `Injector` for RPC metadata
struct MetadataInjector<'a>(&'a mut HashMap<String, String>);

impl Injector for MetadataInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        // Metadata keys are case-insensitive on the wire.
        self.0.insert(key.to_ascii_lowercase(), value);
    }
}

/// Wrapper to implement `Extractor` for RPC metadata
struct MetadataExtractor<'a>(&'a HashMap<String, String>);

impl Extractor for MetadataExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(&key.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Inject the trace context of `cx` into outgoing RPC metadata.
pub fn inject_trace_context(config: &Config, cx: &Context, metadata: &mut HashMap<String, String>) {
    let mut injector = MetadataInjector(metadata);
    config.text_map_propagator().inject_context(cx, &mut injector);
}

/// Inject the current `tracing` span's trace context into outgoing RPC
/// metadata.
///
/// # Example
///
/// ```ignore
/// let span = info_span!("rpc.client", method = "Echo");
/// let _guard = span.enter();
/// let mut metadata = HashMap::new();
/// inject_current_span(&config, &mut metadata);
/// // metadata now contains {"traceparent": "00-...-...-01"} for a W3C propagator
/// ```
pub fn inject_current_span(config: &Config, metadata: &mut HashMap<String, String>) {
    let cx = tracing::Span::current().context();
    inject_trace_context(config, &cx, metadata);
}

/// Extract the caller's trace context from incoming RPC metadata.
///
/// The returned `Context` can be used to set the parent of the server span.
/// Missing or malformed headers yield a context without a remote parent.
pub fn extract_trace_context(config: &Config, metadata: &HashMap<String, String>) -> Context {
    let extractor = MetadataExtractor(metadata);
    config
        .text_map_propagator()
        .extract_with_context(&Context::new(), &extractor)
}

/// Check if metadata contains any header the configured propagator reads.
pub fn has_trace_context(config: &Config, metadata: &HashMap<String, String>) -> bool {
    let extractor = MetadataExtractor(metadata);
    config
        .text_map_propagator()
        .fields()
        .any(|field| extractor.get(field).is_some())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_injector_lowercases_keys() {
        let mut metadata = HashMap::new();
        let mut injector = MetadataInjector(&mut metadata);
        injector.set("TraceParent", "00-abc-def-01".to_string());
        assert_eq!(metadata.get("traceparent").unwrap(), "00-abc-def-01");
    }

    #[test]
    fn test_extractor_lookup_ignores_case() {
        let mut metadata = HashMap::new();
        metadata.insert("traceparent".to_string(), "00-abc-def-01".to_string());

        let extractor = MetadataExtractor(&metadata);
        assert_eq!(extractor.get("TRACEPARENT"), Some("00-abc-def-01"));
        assert_eq!(extractor.get("baggage"), None);
    }

    #[test]
    fn test_extractor_keys() {
        let mut metadata = HashMap::new();
        metadata.insert("key1".to_string(), "value1".to_string());
        metadata.insert("key2".to_string(), "value2".to_string());

        let extractor = MetadataExtractor(&metadata);
        let keys = extractor.keys();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"key1"));
        assert!(keys.contains(&"key2"));
    }

    #[test]
    fn test_inject_current_span_without_subscriber() {
        // Without an OpenTelemetry layer there is no span context to inject.
        let config = Config::default();
        let mut metadata = HashMap::new();
        inject_current_span(&config, &mut metadata);

        let _cx = extract_trace_context(&config, &metadata);
        assert!(!has_trace_context(&config, &metadata));
    }
}
