pub mod config;
pub mod entities;
pub mod error;
pub mod events;
pub mod types;

pub use config::{Config, LedgerSettings};
pub use entities::*;
pub use error::LedgerError;
pub use events::{ChainEvent, Provenance, StakingEvent};
pub use types::*;
