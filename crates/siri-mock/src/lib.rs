//! Mock SIRI peer for end-to-end tests of real-time transit services.
//!
//! A [`MockServer`](mock::MockServer) impersonates a remote SIRI partner: it
//! captures every request the system under test sends, answers CheckStatus
//! probes by itself, and plays back queued responses in order with the
//! request's `MessageIdentifier` substituted into them.

pub mod config;
pub mod mock;
pub mod process;
pub mod siri;
pub mod template;

pub use mock::{MockError, MockRegistry, MockServer};
