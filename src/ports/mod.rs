//! Port traits: the seams between domain logic and the outside world.

pub mod config_port;
pub mod quote_source_port;
pub mod record_store_port;
