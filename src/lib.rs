pub mod app;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod infra;
pub mod invocation;
pub mod logging;
pub mod pipeline;
pub mod server;

pub use config::Config;
pub use error::{AuditError, Result};
