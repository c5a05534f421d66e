//! # bearly-store
//!
//! Persistence for bearly: the session state and the sleep log, each kept in
//! its own flat JSON file and always read and written as a whole.
//!
//! ## Key Types
//!
//! - [`SessionStore`] / [`LogStore`] - store traits the session controller is built on
//! - [`JsonSessionStore`] / [`JsonLogStore`] - file-backed stores
//! - [`MemorySessionStore`] / [`MemoryLogStore`] - in-memory stores for tests
//! - [`LogRecord`] / [`SessionState`] - the persisted data model

mod error;
mod memory;
mod store;
mod timestamp;
mod types;

pub use error::StorageError;
pub use memory::{MemoryLogStore, MemorySessionStore};
pub use store::{
    default_data_dir, JsonLogStore, JsonSessionStore, LogStore, SessionStore, LOG_FILE_NAME,
    SESSION_FILE_NAME,
};
pub use timestamp::parse as parse_timestamp;
pub use types::{LogRecord, SessionState, DEFAULT_RESTLESSNESS};
