//! Domain layer - Pure business logic with no external dependencies
//!
//! This crate contains:
//! - Entities (Device, Action, SensorReading, AuditEntry)
//! - Value Objects (MacAddress, ActionStatus, TimeBucket)
//! - The explicit per-request context
//! - Repository and collaborator interfaces (traits)
//!
//! Principles:
//! - No dependencies on infrastructure
//! - Business rules enforced at domain level
//! - Testable in isolation

pub mod action;
pub mod audit;
pub mod auth;
pub mod context;
pub mod device;
pub mod error;
pub mod telemetry;
mod validation;

// Re-export commonly used types
pub use action::{Action, ActionStatus};
pub use audit::{AuditEntry, AuditEvent};
pub use context::{RequestContext, UserId};
pub use device::{Device, DeviceStatus};
pub use error::DomainError;
pub use telemetry::{SensorReading, TimeBucket};
