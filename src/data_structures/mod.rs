//! GPU-side data structures: models, textures, instances and batches.
//!
//! - `model` contains mesh and material definitions
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation and attribute data
//! - `batch` pairs a model with its uploaded instances

pub mod batch;
pub mod instance;
pub mod model;
pub mod texture;
