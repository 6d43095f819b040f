//! # cl-03-sweep-driver
//!
//! Periodic maintenance for the lifecycle service.
//!
//! Each tick runs two passes, in order:
//!
//! 1. expire `Waiting` documents whose timeout has passed
//! 2. execute due clauses on `Active` contracts
//!
//! A failing pass is logged and never stops the driver. Ticks never
//! overlap: the next tick is scheduled from the end of the previous one.

pub mod config;
pub mod driver;
pub mod error;

pub use config::{IntervalUnit, SweepConfig};
pub use driver::{SweepDriver, SweepTarget, TickReport};
pub use error::ConfigError;
