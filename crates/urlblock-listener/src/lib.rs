//! # URL Blocker Listener
//!
//! Companion HTTP listener for the URL blocker browser extension. Extension
//! instances POST one report per blocked navigation; the listener keeps the
//! most recent reports in a bounded [`urlblock_core::EventLog`] and serves
//! them back on demand.
//!
//! ## Example
//!
//! ```rust,ignore
//! use urlblock_listener::{ListenerConfig, ListenerServer};
//!
//! let server = ListenerServer::new(ListenerConfig::default());
//! server.bind().await?.serve().await?;
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod protocol;
pub mod reporter;
pub mod server;

// Re-exports
pub use api::{MAX_BODY_BYTES, router};
pub use config::{ConfigOverrides, ConfigSource, DEFAULT_CONFIG_FILE, ListenerConfig};
pub use error::{ApiError, ListenerError, ListenerResult};
pub use protocol::{CleanupResponse, PingResponse, SubmitResponse};
pub use reporter::{BlockedUrlReport, ReporterClient};
pub use server::{BoundListener, ListenerServer};
