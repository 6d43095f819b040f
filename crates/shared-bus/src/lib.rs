//! # Shared Bus - Notification Store and Change Feed
//!
//! The persistence side of real-time notifications. Writers insert batches of
//! notifications; every committed insert is surfaced, in commit order, on each
//! open `ChangeFeed`.
//!
//! ```text
//! ┌──────────────────┐  insert_many()  ┌────────────────────┐
//! │ Lifecycle Engine │ ──────────────→ │ NotificationStore  │
//! └──────────────────┘                 │  (append-only log) │
//!                                      └─────────┬──────────┘
//!                                                │ watch()
//!                                                ▼
//!                                      ┌────────────────────┐
//!                                      │   ChangeFeed pump  │ ──→ Fan-out Hub
//!                                      └────────────────────┘
//! ```
//!
//! ## Delivery Guarantees
//!
//! - **Commit Order:** a feed yields events in the order inserts committed.
//! - **No Loss:** a feed never skips a committed event; slow readers simply
//!   fall behind the log instead of lagging out.
//! - **Live Only:** a feed starts at the log head at the time of `watch()`.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod feed;
pub mod memory;
pub mod store;

// Re-export main types
pub use feed::{ChangeFeed, NotificationEvent};
pub use memory::InMemoryNotificationStore;
pub use store::NotificationStore;
pub use shared_types::StoreError;

/// Default page size for notification listings.
pub const DEFAULT_LIST_LIMIT: usize = 50;
