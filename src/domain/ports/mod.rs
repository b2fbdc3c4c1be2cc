//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interfaces the connector is built on:
//! - TicketCursor: one incremental export fetch
//! - TicketWriter: one bulk import submission
//! - RecordIterator: pull-based record stream
//! - Source / Destination: the plugin contract exposed to the pipeline runtime
//!
//! These traits let the polling engine and the write buffer run against the
//! real Zendesk adapters or against in-memory test doubles.

pub mod connector;
pub mod record_iterator;
pub mod ticket_cursor;
pub mod ticket_writer;

pub use connector::{AckFn, Destination, Source};
pub use record_iterator::RecordIterator;
pub use ticket_cursor::TicketCursor;
pub use ticket_writer::TicketWriter;
