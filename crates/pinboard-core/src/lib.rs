//! pinboard-core library.
//!
//! Remote submissions for a map annotation board, synchronized through a
//! single shared JSON document on a public gist-like service.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums ([`StoreError`], [`PinboardError`]) with
//!   stable [`ErrorCode`]s; `anyhow::Result` only for config loading.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).
//!   Credentials are never logged.

pub mod board;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod fallback;
pub mod lock;
pub mod model;
pub mod poller;
pub mod reconcile;
pub mod remote;
pub mod role;
pub mod session;

pub use error::{ErrorCode, PinboardError, StoreError};
pub use model::{Color, Event, Point};
pub use role::{ConnectionParams, Role};
pub use session::{PollOutcome, Session, SubmitOutcome};
