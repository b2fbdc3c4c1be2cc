//! Application layer
//!
//! Plugin façades wiring configuration, adapters and services together.

pub mod destination;
pub mod source;
pub mod specification;

pub use destination::ZendeskDestination;
pub use source::ZendeskSource;
pub use specification::{specification, Parameter, Specification};
