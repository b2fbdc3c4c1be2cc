//! Zendesk native adapter.
//!
//! Incremental ticket export for the source side (`cursor`) and bulk ticket
//! import for the destination side (`importer`), both sharing one
//! authenticated HTTP client.

pub mod client;
pub mod cursor;
pub mod importer;
pub mod models;

pub use client::ZendeskClient;
pub use cursor::ZendeskCursor;
pub use importer::BulkImporter;
