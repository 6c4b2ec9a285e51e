pub mod queue;

pub use queue::{JobQueue, JobQueueClient};
