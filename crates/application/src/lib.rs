//! Application layer - Use cases over the domain ports
//!
//! - [`DeviceRegistry`]: device CRUD and the single ownership check
//! - [`ActionQueue`]: per-device command lifecycle
//! - [`TelemetryService`]: sensor ingestion, queries and aggregation
//! - [`RetentionService`]: age-based purges
//!
//! Every operation takes an explicit [`domain::RequestContext`].

pub mod action;
pub mod audit;
pub mod device;
pub mod retention;
pub mod telemetry;

pub use action::ActionQueue;
pub use audit::AuditRecorder;
pub use device::DeviceRegistry;
pub use retention::{PurgeReport, RetentionPolicy, RetentionService};
pub use telemetry::{BatchReceipt, TelemetryService};
