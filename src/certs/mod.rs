//! Certificate validation, generation and lookup against the fleet manager.

pub mod fingerprint;
pub mod operations;
pub mod outcome;
pub mod query;
pub mod resolve;
pub mod tasks;
pub mod waiter;
