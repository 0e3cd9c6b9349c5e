//! Seatlens library
//!
//! Exposes the pipeline wiring, configuration, fixture host, and
//! presentation contract for integration testing.

pub mod config;
pub mod fixture;
pub mod pipeline;
pub mod presentation;

// Re-export commonly used types for external use
pub use config::SeatlensConfig;
pub use fixture::{FixtureHost, PageScript};
pub use pipeline::ProbePipeline;
pub use presentation::{ColorBand, ToastPayload};
