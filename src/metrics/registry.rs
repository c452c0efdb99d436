//! Telemetry registry
//!
//! Owns a Prometheus [`Registry`] plus a name-indexed table of the instruments
//! registered in it. Instruments are addressed through cloneable
//! [`InstrumentHandle`]s; every mutation goes through the registry so kind,
//! label arity and value constraints are checked in one place.
//!
//! Individual updates are atomic (Prometheus metrics are lock-free internally);
//! the registration table sits behind a mutex that is only taken while
//! registering.

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors raised by the telemetry registry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
    /// Conflicting or invalid instrument definition (fatal at startup)
    #[error("Metric configuration error: {0}")]
    Config(String),

    /// Operation rejected at record time
    #[error("Invalid operation on metric '{metric}': {reason}")]
    InvalidOperation { metric: String, reason: String },

    /// Snapshot could not be encoded
    #[error("Failed to encode metrics snapshot: {0}")]
    Encoding(String),
}

/// Convenience type alias for registry results
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Kind of a metric instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Histogram,
    Gauge,
}

impl MetricKind {
    /// Name used in `# TYPE` lines
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
            MetricKind::Gauge => "gauge",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
enum Instrument {
    Counter(CounterVec),
    Histogram(HistogramVec),
    Gauge(GaugeVec),
}

/// Cheap, cloneable reference to a registered instrument
#[derive(Clone)]
pub struct InstrumentHandle {
    name: Arc<str>,
    kind: MetricKind,
    label_names: Arc<[String]>,
    instrument: Instrument,
}

impl InstrumentHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    fn invalid(&self, reason: impl Into<String>) -> TelemetryError {
        TelemetryError::InvalidOperation {
            metric: self.name.to_string(),
            reason: reason.into(),
        }
    }

    fn check_labels(&self, labels: &[&str]) -> TelemetryResult<()> {
        if labels.len() != self.label_names.len() {
            return Err(self.invalid(format!(
                "expected {} label value(s) for {:?}, got {}",
                self.label_names.len(),
                self.label_names,
                labels.len()
            )));
        }
        Ok(())
    }

    fn counter(&self) -> TelemetryResult<&CounterVec> {
        match &self.instrument {
            Instrument::Counter(vec) => Ok(vec),
            _ => Err(self.invalid(format!("{} is not a counter", self.kind))),
        }
    }

    fn histogram(&self) -> TelemetryResult<&HistogramVec> {
        match &self.instrument {
            Instrument::Histogram(vec) => Ok(vec),
            _ => Err(self.invalid(format!("{} is not a histogram", self.kind))),
        }
    }

    fn gauge(&self) -> TelemetryResult<&GaugeVec> {
        match &self.instrument {
            Instrument::Gauge(vec) => Ok(vec),
            _ => Err(self.invalid(format!("{} is not a gauge", self.kind))),
        }
    }
}

impl fmt::Debug for InstrumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentHandle")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("label_names", &self.label_names)
            .finish()
    }
}

/// Process-wide collection of metric instruments
pub struct TelemetryRegistry {
    registry: Registry,
    instruments: Mutex<BTreeMap<String, InstrumentHandle>>,
}

impl Default for TelemetryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRegistry {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            instruments: Mutex::new(BTreeMap::new()),
        }
    }

    /// Register an instrument, or return the existing handle for `name`
    ///
    /// Histograms registered here use the Prometheus default buckets.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::Config`] if `name` is already registered with a
    /// different kind or different label names, or if Prometheus rejects the
    /// name/labels.
    pub fn register(
        &self,
        name: &str,
        help: &str,
        kind: MetricKind,
        label_names: &[&str],
    ) -> TelemetryResult<InstrumentHandle> {
        self.register_inner(name, help, kind, label_names, None)
    }

    /// Register a histogram with explicit bucket upper bounds
    pub fn register_histogram(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: Vec<f64>,
    ) -> TelemetryResult<InstrumentHandle> {
        self.register_inner(name, help, MetricKind::Histogram, label_names, Some(buckets))
    }

    fn register_inner(
        &self,
        name: &str,
        help: &str,
        kind: MetricKind,
        label_names: &[&str],
        buckets: Option<Vec<f64>>,
    ) -> TelemetryResult<InstrumentHandle> {
        // A poisoned table is still consistent: inserts happen after registration succeeds
        let mut instruments = self
            .instruments
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(existing) = instruments.get(name) {
            if existing.kind() != kind {
                return Err(TelemetryError::Config(format!(
                    "metric '{}' already registered as {}, cannot re-register as {}",
                    name,
                    existing.kind(),
                    kind
                )));
            }
            if existing
                .label_names()
                .iter()
                .map(String::as_str)
                .ne(label_names.iter().copied())
            {
                return Err(TelemetryError::Config(format!(
                    "metric '{}' already registered with labels {:?}, cannot re-register with {:?}",
                    name,
                    existing.label_names(),
                    label_names
                )));
            }
            return Ok(existing.clone());
        }

        let config_err = |e: prometheus::Error| {
            TelemetryError::Config(format!("failed to register metric '{}': {}", name, e))
        };

        let instrument = match kind {
            MetricKind::Counter => {
                let vec = CounterVec::new(Opts::new(name, help), label_names).map_err(config_err)?;
                self.registry
                    .register(Box::new(vec.clone()))
                    .map_err(config_err)?;
                Instrument::Counter(vec)
            }
            MetricKind::Histogram => {
                let mut opts = HistogramOpts::new(name, help);
                if let Some(buckets) = buckets {
                    opts = opts.buckets(buckets);
                }
                let vec = HistogramVec::new(opts, label_names).map_err(config_err)?;
                self.registry
                    .register(Box::new(vec.clone()))
                    .map_err(config_err)?;
                Instrument::Histogram(vec)
            }
            MetricKind::Gauge => {
                let vec = GaugeVec::new(Opts::new(name, help), label_names).map_err(config_err)?;
                self.registry
                    .register(Box::new(vec.clone()))
                    .map_err(config_err)?;
                Instrument::Gauge(vec)
            }
        };

        let handle = InstrumentHandle {
            name: Arc::from(name),
            kind,
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
            instrument,
        };
        instruments.insert(name.to_string(), handle.clone());

        tracing::debug!(
            metric = handle.name(),
            kind = %handle.kind(),
            labels = ?handle.label_names(),
            "Registered metric"
        );

        Ok(handle)
    }

    /// Look up a previously registered instrument by name
    pub fn get(&self, name: &str) -> Option<InstrumentHandle> {
        self.instruments
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }

    /// Increment a counter by 1
    pub fn inc(&self, handle: &InstrumentHandle, labels: &[&str]) -> TelemetryResult<()> {
        self.increment(handle, labels, 1.0)
    }

    /// Increment a counter by `delta`
    ///
    /// # Errors
    ///
    /// [`TelemetryError::InvalidOperation`] if `delta` is negative or not
    /// finite, if `handle` is not a counter, or if the label arity is wrong.
    pub fn increment(
        &self,
        handle: &InstrumentHandle,
        labels: &[&str],
        delta: f64,
    ) -> TelemetryResult<()> {
        let counter = handle.counter()?;
        if !delta.is_finite() || delta < 0.0 {
            return Err(handle.invalid(format!(
                "counter increments must be finite and non-negative, got {}",
                delta
            )));
        }
        handle.check_labels(labels)?;
        counter
            .get_metric_with_label_values(labels)
            .map_err(|e| handle.invalid(e.to_string()))?
            .inc_by(delta);
        Ok(())
    }

    /// Record `value` into a histogram
    pub fn observe(
        &self,
        handle: &InstrumentHandle,
        labels: &[&str],
        value: f64,
    ) -> TelemetryResult<()> {
        let histogram = handle.histogram()?;
        // NaN and infinity poison the histogram sum for the rest of the process
        if !value.is_finite() {
            return Err(handle.invalid(format!("observed value must be finite, got {}", value)));
        }
        handle.check_labels(labels)?;
        histogram
            .get_metric_with_label_values(labels)
            .map_err(|e| handle.invalid(e.to_string()))?
            .observe(value);
        Ok(())
    }

    /// Set a gauge to `value`
    pub fn set(
        &self,
        handle: &InstrumentHandle,
        labels: &[&str],
        value: f64,
    ) -> TelemetryResult<()> {
        let gauge = handle.gauge()?;
        handle.check_labels(labels)?;
        gauge
            .get_metric_with_label_values(labels)
            .map_err(|e| handle.invalid(e.to_string()))?
            .set(value);
        Ok(())
    }

    /// Add `delta` (either sign) to a gauge
    pub fn add(
        &self,
        handle: &InstrumentHandle,
        labels: &[&str],
        delta: f64,
    ) -> TelemetryResult<()> {
        let gauge = handle.gauge()?;
        handle.check_labels(labels)?;
        gauge
            .get_metric_with_label_values(labels)
            .map_err(|e| handle.invalid(e.to_string()))?
            .add(delta);
        Ok(())
    }

    pub fn counter_value(
        &self,
        handle: &InstrumentHandle,
        labels: &[&str],
    ) -> TelemetryResult<f64> {
        let counter = handle.counter()?;
        handle.check_labels(labels)?;
        Ok(counter
            .get_metric_with_label_values(labels)
            .map_err(|e| handle.invalid(e.to_string()))?
            .get())
    }

    pub fn gauge_value(&self, handle: &InstrumentHandle, labels: &[&str]) -> TelemetryResult<f64> {
        let gauge = handle.gauge()?;
        handle.check_labels(labels)?;
        Ok(gauge
            .get_metric_with_label_values(labels)
            .map_err(|e| handle.invalid(e.to_string()))?
            .get())
    }

    pub fn histogram_count(
        &self,
        handle: &InstrumentHandle,
        labels: &[&str],
    ) -> TelemetryResult<u64> {
        let histogram = handle.histogram()?;
        handle.check_labels(labels)?;
        Ok(histogram
            .get_metric_with_label_values(labels)
            .map_err(|e| handle.invalid(e.to_string()))?
            .get_sample_count())
    }

    pub fn histogram_sum(
        &self,
        handle: &InstrumentHandle,
        labels: &[&str],
    ) -> TelemetryResult<f64> {
        let histogram = handle.histogram()?;
        handle.check_labels(labels)?;
        Ok(histogram
            .get_metric_with_label_values(labels)
            .map_err(|e| handle.invalid(e.to_string()))?
            .get_sample_sum())
    }

    /// Content type of [`snapshot`](Self::snapshot) output
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Encode every instrument in Prometheus text exposition format
    ///
    /// Families come out sorted by name, label combinations sorted by label
    /// values. Reading never mutates instrument state.
    pub fn snapshot(&self) -> TelemetryResult<String> {
        let metric_families = self.registry.gather();
        let metric_count = metric_families.len();

        tracing::debug!(
            metric_family_count = metric_count,
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    metric_family_count = metric_count,
                    "Prometheus text encoder failed"
                );
                TelemetryError::Encoding(format!(
                    "failed to encode {} metric families: {}",
                    metric_count, e
                ))
            })?;

        String::from_utf8(buffer).map_err(|e| {
            TelemetryError::Encoding(format!(
                "encoder produced invalid UTF-8 at byte {}",
                e.utf8_error().valid_up_to()
            ))
        })
    }
}
