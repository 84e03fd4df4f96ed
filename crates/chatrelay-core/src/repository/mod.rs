//! Repository trait definitions implemented by `chatrelay-infra`.

pub mod exchange;
