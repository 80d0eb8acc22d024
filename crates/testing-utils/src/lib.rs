//! # Fleet Testing Utils
//!
//! Shared testing utilities for the fleet dispatch workspace.
//! This crate provides probe tasks, fleet builders and testing helpers
//! that can be used across all other crates in the workspace.
//!
//! ## Features
//!
//! - **Probe Tasks**: `Task` implementations with call counters, failure and panic injection
//! - **Concurrency Probe**: Shared gauge recording how many probes are inside a cargo step
//! - **Fleet Builders**: Utilities for creating truck fleets
//! - **Test Helpers**: Tracing setup for tests
//!
//! ## Usage
//!
//! Add this crate as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! fleet-testing-utils = { path = "../testing-utils" }
//! ```
//!
//! Then use the probes in your tests:
//!
//! ```rust
//! use fleet_testing_utils::mocks::{ConcurrencyProbe, ProbeTask};
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

// Re-export commonly used items
pub use builders::*;
pub use helpers::*;
pub use mocks::*;
