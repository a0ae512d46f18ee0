//! Varal backend core: MQTT session management for a single clothesline
//! controller device.
//!
//! This crate owns the broker connection and mediates all traffic between
//! the device and the request layer:
//!
//! - [`Session`] connects to the broker (TLS with client certificates),
//!   subscribes to the device heartbeat topic and keeps reconnecting with
//!   bounded exponential backoff.
//! - Inbound heartbeats are decoded leniently into a [`StatusRecord`] and
//!   written into a [`StatusStore`], a single-slot last-value store safe
//!   for concurrent readers and writers.
//! - Outbound operator input is validated into a [`Command`] before it is
//!   ever published, fire-and-forget, on the command topic.
//! - [`VaralService`] is the thin facade consumed by request handlers.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use varal_session::{Session, SessionConfig, VaralService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), varal_session::Error> {
//!     let config = SessionConfig::from_env()?;
//!     let session = Arc::new(Session::new(config)?);
//!     session.start().await?;
//!
//!     let service = VaralService::new(session.clone());
//!     println!("latest: {:?}", service.latest_status());
//!     service.send_command("open").await?;
//!
//!     session.stop().await?;
//!     Ok(())
//! }
//! ```

mod command;
mod config;
mod error;
mod service;
mod session;
mod status;
mod store;

pub use command::Command;
pub use config::{SessionConfig, TlsFiles};
pub use error::{Error, Result};
pub use service::VaralService;
pub use session::{ConnectionState, Session};
pub use status::{DeviceMode, StatusRecord};
pub use store::StatusStore;
