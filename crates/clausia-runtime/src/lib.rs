//! # Clausia Runtime Library
//!
//! Exposes the runtime wiring for the binary and for tests. The entry point
//! is `main.rs`.
//!
//! ## Tasks
//!
//! | Task | Stops on |
//! |------|----------|
//! | Change-feed pump | store close (fatal when unexpected) |
//! | Sweep driver | shutdown signal |
//! | WebSocket server | shutdown signal |

pub mod config;
pub mod endpoint;
pub mod runtime;

pub use config::{ConfigError, RuntimeConfig};
pub use endpoint::{authenticate, EndpointState, Rejection, EMAIL_HEADER, WS_PATH};
pub use runtime::{ClausiaRuntime, Lifecycle, Readiness, RuntimeError};
