pub mod config;
pub mod position;
pub mod record;

pub use config::{
    Config, ConnectionConfig, DestinationConfig, DestinationSettings, LogFormat, LoggingConfig,
    SourceConfig, SourceSettings,
};
pub use position::Position;
pub use record::{ChangeRecord, Operation, METADATA_TICKET_STATUS};
