//! Cucumber acceptance suite for the mock SIRI server.

pub mod steps;
pub mod world;
