pub mod metrics;

pub use metrics::MetricsStore;
