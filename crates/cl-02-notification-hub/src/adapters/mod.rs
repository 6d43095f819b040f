//! # Adapters Layer
//!
//! Transport implementations for connection sessions.

pub mod ws;

pub use ws::{serve_socket, split, WsSink, WsSource};
