//! Service layer
//!
//! Concurrency machinery between the adapters and the plugin façades:
//! - TaskGroup: linked lifetime of background tasks
//! - CdcIterator: polling engine with two-stage buffering
//! - WriteBuffer: batching and acknowledgement ordering for the destination

pub mod cdc_iterator;
pub mod task_group;
pub mod write_buffer;

pub use cdc_iterator::CdcIterator;
pub use task_group::TaskGroup;
pub use write_buffer::WriteBuffer;
