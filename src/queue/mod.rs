//! Queue registry: create, delete, info, list.

pub mod model;
pub mod registry;

pub use model::{QueueCreate, QueueInfo, QueueList};
