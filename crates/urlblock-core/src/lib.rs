//! # URL Blocker Core
//!
//! Bounded in-memory log of blocked-URL events reported by browser
//! extension instances.
//!
//! ## Key Types
//!
//! - [`BlockedEvent`]: An immutable, validated blocking occurrence
//! - [`Submission`]: An unvalidated report as received from a reporter
//! - [`EventLog`]: Newest-first store that evicts the oldest entry past capacity
//!
//! ## Example
//!
//! ```rust
//! use std::num::NonZeroUsize;
//! use serde_json::json;
//! use urlblock_core::{EventLog, Submission};
//!
//! let log = EventLog::new(NonZeroUsize::new(3).unwrap());
//! let total = log
//!     .submit(Submission::new(json!({"url": "https://ads.example"}), "2024-01-01T00:00:00Z"))
//!     .unwrap();
//! assert_eq!(total, 1);
//! assert_eq!(log.latest().unwrap().latest.unwrap().url(), "https://ads.example");
//! ```

pub mod error;
pub mod event;
pub mod log;

pub use error::{LogError, LogResult, ValidationError};
pub use event::{BlockedEvent, Submission};
pub use log::{DEFAULT_CAPACITY, EventLog, LatestSnapshot, LogSnapshot};
