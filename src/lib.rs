pub mod error;
pub mod value;
pub mod record;
pub mod time;
pub mod route;
pub mod formatter;
pub mod builder;
pub mod coerce;
pub mod reader;

pub mod store;
pub mod memory_store;

#[cfg(feature = "redis")]
pub mod redis_store;

pub mod config;
pub mod env;
pub mod backend;
pub mod device;

pub mod sink;
pub mod layer;
pub mod init;

pub use device::CappedLog;
pub use error::{Error, Result};
pub use record::{LogRecord, Severity};
pub use value::{Map, Value};
