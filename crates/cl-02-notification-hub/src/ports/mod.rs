//! Ports module for the Notification Hub subsystem

pub mod transport;

pub use transport::{InboundMessage, InboundSource, OutboundSink};
