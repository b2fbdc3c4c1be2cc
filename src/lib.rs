//! Zendesk ticket connector
//!
//! Streams Zendesk tickets out of the incremental export API as change
//! records (source) and imports buffered records through the bulk ticket
//! import API (destination).
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): records, positions, configuration, errors and ports
//! - **Adapters** (`adapters`): Zendesk HTTP cursor and bulk importer
//! - **Service Layer** (`services`): polling iterator and write buffer
//! - **Application Layer** (`application`): source and destination lifecycles
//! - **Infrastructure Layer** (`infrastructure`): config loading and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::collections::HashMap;
//! use zendesk_connector::{Source, ZendeskSource};
//!
//! let mut source = ZendeskSource::new();
//! source.configure(&settings).await?;
//! source.open(&[]).await?;
//! let record = source.read(&cancel).await?;
//! source.ack(&record.position.encode()?).await?;
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::zendesk::{BulkImporter, ZendeskClient, ZendeskCursor};
pub use application::{specification, Specification, ZendeskDestination, ZendeskSource};
pub use domain::models::{
    ChangeRecord, Config, ConnectionConfig, DestinationConfig, Operation, Position, SourceConfig,
};
pub use domain::ports::{AckFn, Destination, RecordIterator, Source, TicketCursor, TicketWriter};
pub use domain::{ConfigError, ConnectorError, ConnectorResult};
pub use infrastructure::config::ConfigLoader;
pub use services::{CdcIterator, TaskGroup, WriteBuffer};
