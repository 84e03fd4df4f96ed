//! The chat request pipeline.
//!
//! Leaves first: `clean` normalizes model text, `dedup` fingerprints and
//! replays near-simultaneous repeats, `session` tracks last activity per
//! session label, `sink` persists exchanges best-effort, and `service`
//! orchestrates a request through all of them.

pub mod clean;
pub mod dedup;
pub mod service;
pub mod session;
pub mod sink;
