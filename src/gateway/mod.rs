//! Query execution gateway
//!
//! The single entry point for running a query from the console. Each
//! execution gets a fresh request id so it can be cancelled.

mod execution;
mod outcome;

pub use execution::QueryGateway;
pub use outcome::QueryOutcome;
