//! Cross-subsystem flows.

mod delivery;
mod signing_flow;
mod sweep_flow;
