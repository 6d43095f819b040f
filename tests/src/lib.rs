//! # Clausia Test Suite
//!
//! Cross-crate flows exercised end to end over the in-memory stores.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Wired service, store, hub and pump
//! └── integration/
//!     ├── signing_flow.rs   # upload → sign → store → pump → hub → receiver
//!     ├── delivery.rs       # buffer overflow and connection isolation
//!     └── sweep_flow.rs     # expiry and clause execution on the sweep timer
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p clausia-tests
//! cargo test -p clausia-tests integration::sweep_flow
//! ```

pub mod harness;
pub mod integration;
