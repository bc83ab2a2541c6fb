//! Mock SIRI peer for end-to-end tests.
//!
//! This module provides:
//! - `MockRegistry`: named collection of mock servers, torn down after each scenario
//! - `MockServer`: one listener with its captured requests and queued responses
//! - `wait_request` and friends: synchronisation for the test driver
//!
//! ## Module Structure
//!
//! - `types`: captured requests, queued responses, endpoint, errors
//! - `core`: MockServer struct, lifecycle and request answering
//! - `handler`: HTTP glue between hyper and `MockServer::respond`
//! - `response`: HTTP/SOAP response builders
//! - `registry`: MockRegistry
//! - `wait`: wait/assert API

mod core;
mod handler;
mod registry;
mod response;
mod types;
mod wait;


pub use core::MockServer;
pub use registry::MockRegistry;
pub use response::soap_fault;
pub use types::{
    CapturedRequest, MockEndpoint, MockError, MockReply, PendingResponse, WaitPolicy,
};
