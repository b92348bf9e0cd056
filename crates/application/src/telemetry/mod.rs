mod service;

pub use service::{BatchReceipt, TelemetryService};
