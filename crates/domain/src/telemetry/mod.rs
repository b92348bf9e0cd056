mod bucket;
mod reading;
mod repository;

pub use bucket::{
    BucketAggregate, SensorStatistics, TimeBucket, aggregate_readings, summarize_by_sensor,
};
pub use reading::{NewReading, ReadingInput, ReadingQuery, SensorReading, SensorType, TimeRange};
pub use repository::TelemetryRepository;
