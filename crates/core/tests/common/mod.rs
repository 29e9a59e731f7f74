//! Shared helpers for the conduit-core integration tests.
//!
//! - Fixtures building pipe, runner and trigger configs
//! - Mock pipes and services wired to a [`Probe`](mock_pipes::Probe)
//! - Event assertions

pub mod assertions;
pub mod fixtures;
pub mod mock_pipes;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_pipes::*;
