//! In-process adapters backed by plain collections.
//!
//! They honor the same contracts as the Postgres adapters (ordering,
//! uniqueness, compare-and-set) and back the test suites and
//! database-less local runs.

mod actions;
mod audit;
mod devices;
mod telemetry;

pub use actions::InMemoryActionRepository;
pub use audit::InMemoryAuditSink;
pub use devices::InMemoryDeviceRepository;
pub use telemetry::InMemoryTelemetryRepository;
