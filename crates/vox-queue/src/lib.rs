//! Redis Streams job queue for the VoxOver worker.
//!
//! Delivery is at-least-once: messages are consumed through a consumer
//! group, acknowledged on success, retried via pending-claim on worker
//! crash, and dead-lettered after too many attempts.

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::GenerateVideoJob;
pub use queue::{JobQueue, QueueConfig};
