//! Seating-chart perception for the seatlens pipeline.
//!
//! The hidden seat-layout document renders its chart through a scene-graph
//! library. This crate consumes a serialized dump of that scene graph,
//! classifies seat indicators into available/total counts, and hosts the
//! poller that waits for the chart to appear before analyzing it once.

mod analyzer;
mod errors;
mod model;
mod poller;

pub use analyzer::analyze_stage;
pub use errors::ChartProbeError;
pub use model::{NodeAttrs, SceneNode};
pub use poller::{RenderPoller, StagePort, DEFAULT_POLL_INTERVAL};
