//! # trellis-core
//!
//! Core foundation for the trellis test harness: the explicit per-fixture
//! service container and the configuration types shared by the pipeline and
//! testing crates.

pub mod config;
pub mod container;
pub mod error;

pub use config::{TestConfig, TestEnvironment};
pub use container::{ContainerError, TestServices};
pub use error::CoreError;
