//! Metrics registry for the serving runtime.
//!
//! Families are keyed by metric name; series inside a family are keyed by
//! label pairs flattened into sorted vectors. A series only exists once it has
//! been observed, so an endpoint that was never hit is absent rather than
//! zero. Export sorts families and series to keep output deterministic.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

type LabelKey = Vec<(String, String)>;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render a float so whole numbers keep a decimal point (`1.0`, not `1`).
fn fmt_float(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> Option<u64> {
        self.map
            .get(&label_key(labels))
            .map(|c| c.value().load(Ordering::Relaxed))
    }

    fn render(&self, name: &str, out: &mut String) {
        let series: BTreeMap<LabelKey, u64> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        for (key, val) in series {
            if key.is_empty() {
                let _ = writeln!(out, "{} {}", name, val);
            } else {
                let _ = writeln!(out, "{}{{{}}} {}", name, label_str(&key), val);
            }
        }
    }
}

struct AtomicHistogram {
    count: AtomicU64,
    sum_nanos: AtomicU64,
    /// Cumulative: bucket `i` counts observations `<= bounds[i]`.
    buckets: Vec<AtomicU64>,
}

impl AtomicHistogram {
    fn new(n: usize) -> Self {
        Self {
            count: AtomicU64::new(0),
            sum_nanos: AtomicU64::new(0),
            buckets: (0..n).map(|_| AtomicU64::new(0)).collect(),
        }
    }
}

/// Point-in-time view of one histogram series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub sum_seconds: f64,
    /// Cumulative counts aligned with the family bounds.
    pub buckets: Vec<u64>,
}

pub struct HistogramVec {
    bounds: Arc<[f64]>,
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    pub fn new(bounds: Arc<[f64]>) -> Self {
        Self {
            bounds,
            map: DashMap::new(),
        }
    }

    /// Observe a duration and increment cumulative buckets.
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let n = self.bounds.len();
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicHistogram::new(n));
        let secs = duration.as_secs_f64();
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum_nanos.fetch_add(nanos, Ordering::Relaxed);

        for (i, &le) in self.bounds.iter().enumerate() {
            if secs <= le {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self, labels: &[(&str, &str)]) -> Option<HistogramSnapshot> {
        self.map.get(&label_key(labels)).map(|h| HistogramSnapshot {
            count: h.count.load(Ordering::Relaxed),
            sum_seconds: h.sum_nanos.load(Ordering::Relaxed) as f64 / 1e9,
            buckets: h.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect(),
        })
    }

    fn render(&self, name: &str, out: &mut String) {
        let series: BTreeMap<LabelKey, HistogramSnapshot> = self
            .map
            .iter()
            .map(|r| {
                let h = r.value();
                let snap = HistogramSnapshot {
                    count: h.count.load(Ordering::Relaxed),
                    sum_seconds: h.sum_nanos.load(Ordering::Relaxed) as f64 / 1e9,
                    buckets: h.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect(),
                };
                (r.key().clone(), snap)
            })
            .collect();

        for (key, snap) in series {
            let labels = label_str(&key);
            let prefix = if labels.is_empty() { String::new() } else { format!("{},", labels) };

            for (le, count) in self.bounds.iter().zip(&snap.buckets) {
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, fmt_float(*le), count);
            }
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, snap.count);

            if labels.is_empty() {
                let _ = writeln!(out, "{}_sum {}", name, fmt_float(snap.sum_seconds));
                let _ = writeln!(out, "{}_count {}", name, snap.count);
            } else {
                let _ = writeln!(out, "{}_sum{{{}}} {}", name, labels, fmt_float(snap.sum_seconds));
                let _ = writeln!(out, "{}_count{{{}}} {}", name, labels, snap.count);
            }
        }
    }
}

/// Process-wide registry, constructed once and injected through `AppState`.
pub struct MetricsRegistry {
    counters: DashMap<String, CounterVec>,
    histograms: DashMap<String, HistogramVec>,
    help: DashMap<String, String>,
    latency_buckets: Arc<[f64]>,
}

impl MetricsRegistry {
    /// `latency_buckets` are histogram upper bounds in seconds, ascending.
    pub fn new(latency_buckets: &[f64]) -> Self {
        Self {
            counters: DashMap::new(),
            histograms: DashMap::new(),
            help: DashMap::new(),
            latency_buckets: Arc::from(latency_buckets),
        }
    }

    /// Attach HELP text to a family.
    pub fn describe(&self, name: &str, help: &str) {
        self.help.insert(name.to_string(), help.to_string());
    }

    /// Add 1 to the named counter series, creating it on first use.
    pub fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) {
        if let Some(family) = self.counters.get(name) {
            family.inc(labels);
            return;
        }
        self.counters.entry(name.to_string()).or_default().inc(labels);
    }

    /// Record one latency observation into the named histogram series.
    pub fn observe_latency(&self, name: &str, labels: &[(&str, &str)], duration: Duration) {
        if let Some(family) = self.histograms.get(name) {
            family.observe(labels, duration);
            return;
        }
        let bounds = Arc::clone(&self.latency_buckets);
        self.histograms
            .entry(name.to_string())
            .or_insert_with(|| HistogramVec::new(bounds))
            .observe(labels, duration);
    }

    /// Start a timer that records into `name{endpoint=...}` when dropped.
    pub fn start_timer(self: &Arc<Self>, name: &'static str, endpoint: &'static str) -> LatencyTimer {
        LatencyTimer {
            registry: Arc::clone(self),
            name,
            endpoint,
            start: Instant::now(),
        }
    }

    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<u64> {
        self.counters.get(name).and_then(|f| f.get(labels))
    }

    pub fn histogram_snapshot(&self, name: &str, labels: &[(&str, &str)]) -> Option<HistogramSnapshot> {
        self.histograms.get(name).and_then(|f| f.snapshot(labels))
    }

    /// Render every family in Prometheus text exposition format.
    ///
    /// Observations racing with the export may or may not be included.
    pub fn export_snapshot(&self) -> String {
        let mut names: Vec<(String, &'static str)> = self
            .counters
            .iter()
            .map(|r| (r.key().clone(), "counter"))
            .chain(self.histograms.iter().map(|r| (r.key().clone(), "histogram")))
            .collect();
        names.sort();

        let mut out = String::new();
        for (name, kind) in names {
            if let Some(help) = self.help.get(&name) {
                let _ = writeln!(out, "# HELP {} {}", name, help.value());
            }
            let _ = writeln!(out, "# TYPE {} {}", name, kind);
            match kind {
                "counter" => {
                    if let Some(family) = self.counters.get(&name) {
                        family.render(&name, &mut out);
                    }
                }
                _ => {
                    if let Some(family) = self.histograms.get(&name) {
                        family.render(&name, &mut out);
                    }
                }
            }
        }
        out
    }
}

/// Drop guard that records elapsed time on every exit path.
pub struct LatencyTimer {
    registry: Arc<MetricsRegistry>,
    name: &'static str,
    endpoint: &'static str,
    start: Instant,
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        self.registry
            .observe_latency(self.name, &[("endpoint", self.endpoint)], self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> MetricsRegistry {
        MetricsRegistry::new(&[0.01, 0.1, 1.0])
    }

    #[test]
    fn counter_absent_until_observed() {
        let r = registry();
        assert_eq!(r.counter_value("hits", &[("endpoint", "/a")]), None);
        assert!(!r.export_snapshot().contains("hits"));

        r.increment_counter("hits", &[("endpoint", "/a")]);
        assert_eq!(r.counter_value("hits", &[("endpoint", "/a")]), Some(1));
        assert_eq!(r.counter_value("hits", &[("endpoint", "/b")]), None);
    }

    #[test]
    fn label_order_does_not_matter() {
        let r = registry();
        r.increment_counter("errs", &[("code", "X"), ("endpoint", "/p")]);
        r.increment_counter("errs", &[("endpoint", "/p"), ("code", "X")]);
        assert_eq!(r.counter_value("errs", &[("endpoint", "/p"), ("code", "X")]), Some(2));
        assert!(r.export_snapshot().contains("errs{code=\"X\",endpoint=\"/p\"} 2\n"));
    }

    #[test]
    fn histogram_buckets_are_cumulative() {
        let r = registry();
        let l = [("endpoint", "/p")];
        r.observe_latency("lat", &l, Duration::from_millis(5));
        r.observe_latency("lat", &l, Duration::from_millis(50));
        r.observe_latency("lat", &l, Duration::from_secs(2));

        let snap = r.histogram_snapshot("lat", &l).unwrap();
        assert_eq!(snap.count, 3);
        assert_eq!(snap.buckets, vec![1, 2, 2]);
        assert!((snap.sum_seconds - 2.055).abs() < 1e-9);

        let text = r.export_snapshot();
        assert!(text.contains("# TYPE lat histogram\n"));
        assert!(text.contains("lat_bucket{endpoint=\"/p\",le=\"0.01\"} 1\n"));
        assert!(text.contains("lat_bucket{endpoint=\"/p\",le=\"1.0\"} 2\n"));
        assert!(text.contains("lat_bucket{endpoint=\"/p\",le=\"+Inf\"} 3\n"));
        assert!(text.contains("lat_count{endpoint=\"/p\"} 3\n"));
    }

    #[test]
    fn export_is_sorted_and_stable() {
        let r = registry();
        r.describe("b_total", "B things.");
        r.increment_counter("b_total", &[("endpoint", "/z")]);
        r.increment_counter("b_total", &[("endpoint", "/a")]);
        r.increment_counter("a_total", &[]);

        let text = r.export_snapshot();
        assert_eq!(text, r.export_snapshot());
        assert_eq!(
            text,
            "# TYPE a_total counter\n\
             a_total 1\n\
             # HELP b_total B things.\n\
             # TYPE b_total counter\n\
             b_total{endpoint=\"/a\"} 1\n\
             b_total{endpoint=\"/z\"} 1\n"
        );
    }

    #[test]
    fn label_values_are_escaped() {
        let r = registry();
        r.increment_counter("c", &[("k", "a\"b\\c\nd")]);
        assert!(r.export_snapshot().contains("c{k=\"a\\\"b\\\\c\\nd\"} 1\n"));
    }

    #[test]
    fn timer_records_on_drop() {
        let r = Arc::new(registry());
        {
            let _t = r.start_timer("lat", "/p");
        }
        let snap = r.histogram_snapshot("lat", &[("endpoint", "/p")]);
        assert_eq!(snap.map(|s| s.count), Some(1));
    }

    #[test]
    fn no_lost_updates_across_threads() {
        let r = Arc::new(registry());
        std::thread::scope(|s| {
            for _ in 0..8 {
                let r = Arc::clone(&r);
                s.spawn(move || {
                    for _ in 0..1_000 {
                        r.increment_counter("hits", &[("endpoint", "/p")]);
                        r.observe_latency("lat", &[("endpoint", "/p")], Duration::from_micros(10));
                    }
                });
            }
        });
        assert_eq!(r.counter_value("hits", &[("endpoint", "/p")]), Some(8_000));
        let snap = r.histogram_snapshot("lat", &[("endpoint", "/p")]);
        assert_eq!(snap.map(|s| s.count), Some(8_000));
    }
}
