//! Neural static evaluation for katyusha.
//!
//! A position is encoded as a 323-value [`FeatureVector`], pushed through a
//! small four-branch [`Network`] and rescaled into host score units by an
//! [`Evaluator`]. Weights come from NumPy `.npz` archives.

pub mod archive;
mod error;
pub mod evaluator;
pub mod features;
mod layer;
mod loader;
pub mod material;
mod network;
pub mod npy;
mod position;

pub use archive::{MemoryArchive, NpzArchive, NpzWriter, WeightArchive};
pub use error::EvalError;
pub use evaluator::{EvalConfig, Evaluator, EvaluatorKind};
pub use features::{FeatureGroup, FeatureVector, TOTAL_FEATURES, extract, feature_name};
pub use layer::{Activation, DenseLayer, rectified, saturating};
pub use network::{HIDDEN_LAYER, Network, OUTPUT_LAYER, Scratch};
pub use npy::NpyArray;
pub use position::PositionQuery;
