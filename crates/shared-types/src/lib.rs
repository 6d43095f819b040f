//! # Shared Types Crate
//!
//! This crate contains the identifiers and records that cross subsystem
//! boundaries: signer and document keys, content digests, and the
//! `Notification` record written by the lifecycle engine and pushed by the hub.
//!
//! ## Design Principles
//!
//! - **Typed Boundary**: every identifier is a newtype; loosely-typed
//!   key/value payloads stop at the transport layer.
//! - **Store-Assigned Fields**: `Notification::id`, `read` and `timestamp`
//!   are only ever set by the notification store on insert.

pub mod entities;
pub mod errors;
pub mod notification;

pub use entities::*;
pub use errors::*;
pub use notification::*;
