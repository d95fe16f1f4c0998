//! Feature extraction and fixed-latency decision stage
//!
//! `FeatureVector` is built from an intensity snapshot, scored by a
//! `StaticModel`, and turned into a `Decision` by `DecisionStage`, which pads
//! every call to a constant latency floor.

pub mod features;
pub mod model;
pub mod stage;

pub use features::FeatureVector;
pub use model::{Scores, StaticModel};
pub use stage::DecisionStage;
