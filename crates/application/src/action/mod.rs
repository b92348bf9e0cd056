mod queue;

pub use queue::ActionQueue;
pub(crate) use queue::window_start;
