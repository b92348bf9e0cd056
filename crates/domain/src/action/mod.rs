mod entity;
mod repository;
mod status;

pub use entity::{Action, ActionStatistics, NewAction, StatusChange};
pub use repository::ActionRepository;
pub use status::ActionStatus;
