//! Four-branch feed-forward network and its forward pass.
//!
//! ```text
//! global(15) ─► branch ─┐
//! piece(164) ─► branch ─┤
//! square(128) ► branch ─┼─► concat ─► hidden (relu) ─► output (tanh) ─► [-1, 1]
//! pawn(16)   ─► branch ─┘
//! ```

use crate::error::EvalError;
use crate::features::{FeatureGroup, FeatureVector, TOTAL_FEATURES};
use crate::layer::{Activation, DenseLayer};

/// Archive name of the hidden layer.
pub const HIDDEN_LAYER: &str = "layer1";
/// Archive name of the output layer.
pub const OUTPUT_LAYER: &str = "outlayer";

/// A validated network. Immutable, so one instance can serve any number of
/// threads; each thread brings its own [`Scratch`].
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    /// One per [`FeatureGroup`], in group order.
    branches: [DenseLayer; FeatureGroup::COUNT],
    hidden: DenseLayer,
    output: DenseLayer,
}

/// Per-caller buffers for one forward pass.
#[derive(Debug, Clone, Default)]
pub struct Scratch {
    concat: Vec<f32>,
    hidden: Vec<f32>,
    output: [f32; 1],
}

impl Scratch {
    fn fit(&mut self, net: &Network) {
        if self.concat.len() != net.hidden.input_dim() {
            self.concat.resize(net.hidden.input_dim(), 0.0);
        }
        if self.hidden.len() != net.hidden.output_dim() {
            self.hidden.resize(net.hidden.output_dim(), 0.0);
        }
    }

    /// Branch outputs of the last pass, concatenated in group order.
    pub fn concatenated(&self) -> &[f32] {
        &self.concat
    }

    /// Hidden-layer outputs of the last pass.
    pub fn hidden(&self) -> &[f32] {
        &self.hidden
    }
}

impl Network {
    /// Assemble a network, checking every dimension.
    ///
    /// Branch `i` must read exactly the features of `FeatureGroup::ALL[i]`,
    /// the hidden layer must read the concatenated branch outputs and the
    /// output layer must produce a single saturated value.
    pub fn new(
        branches: [DenseLayer; FeatureGroup::COUNT],
        hidden: DenseLayer,
        output: DenseLayer,
    ) -> Result<Self, EvalError> {
        for (layer, group) in branches.iter().zip(FeatureGroup::ALL) {
            if layer.input_dim() != group.len() {
                return Err(EvalError::shape(
                    layer.name(),
                    format!(
                        "branch reads {} features but the {} group has {}",
                        layer.input_dim(),
                        group.name(),
                        group.len()
                    ),
                ));
            }
        }

        let concat: usize = branches.iter().map(DenseLayer::output_dim).sum();
        if hidden.input_dim() != concat {
            return Err(EvalError::shape(
                hidden.name(),
                format!("expects {} inputs, branches produce {concat}", hidden.input_dim()),
            ));
        }
        if output.input_dim() != hidden.output_dim() {
            return Err(EvalError::shape(
                output.name(),
                format!(
                    "expects {} inputs, hidden layer produces {}",
                    output.input_dim(),
                    hidden.output_dim()
                ),
            ));
        }
        if output.output_dim() != 1 {
            return Err(EvalError::shape(
                output.name(),
                format!("must produce one value, produces {}", output.output_dim()),
            ));
        }
        if output.activation() != Activation::Saturating {
            return Err(EvalError::shape(output.name(), "output layer must use tanh"));
        }

        Ok(Self { branches, hidden, output })
    }

    /// Buffers sized for this network.
    pub fn scratch(&self) -> Scratch {
        let mut scratch = Scratch::default();
        scratch.fit(self);
        scratch
    }

    /// Run the forward pass. The result lies in `[-1, 1]` and is from
    /// White's point of view.
    pub fn evaluate(&self, features: &FeatureVector, scratch: &mut Scratch) -> f32 {
        scratch.fit(self);

        let mut offset = 0;
        for (layer, group) in self.branches.iter().zip(FeatureGroup::ALL) {
            let end = offset + layer.output_dim();
            layer.forward(features.group(group), &mut scratch.concat[offset..end]);
            offset = end;
        }

        self.hidden.forward(&scratch.concat, &mut scratch.hidden);
        self.output.forward(&scratch.hidden, &mut scratch.output);
        scratch.output[0]
    }

    /// [`evaluate`](Self::evaluate) with throwaway buffers.
    pub fn evaluate_once(&self, features: &FeatureVector) -> f32 {
        self.evaluate(features, &mut self.scratch())
    }

    /// Evaluate raw values; fails unless exactly [`TOTAL_FEATURES`] are given.
    pub fn evaluate_slice(&self, values: &[f32]) -> Result<f32, EvalError> {
        if values.len() != TOTAL_FEATURES {
            return Err(EvalError::InputLengthMismatch {
                expected: TOTAL_FEATURES,
                found: values.len(),
            });
        }
        Ok(self.evaluate_once(&FeatureVector::from_slice(values)?))
    }

    pub fn branch(&self, group: FeatureGroup) -> &DenseLayer {
        &self.branches[group.index()]
    }

    pub fn hidden(&self) -> &DenseLayer {
        &self.hidden
    }

    pub fn output(&self) -> &DenseLayer {
        &self.output
    }

    /// Every layer in archive order: branches, hidden, output.
    pub fn layers(&self) -> impl Iterator<Item = &DenseLayer> {
        self.branches.iter().chain([&self.hidden, &self.output])
    }
}
