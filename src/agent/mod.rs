//! Agent-side pieces: the execute HTTP surface and the coordinator client.
//!
//! An agent announces itself with an initial `/register` call, keeps itself
//! HEALTHY in the coordinator's registry by repeating that call on a timer,
//! and serves `/execute` for the work the coordinator routes to it.

pub mod heartbeat;
pub mod server;
