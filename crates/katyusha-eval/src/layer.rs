//! Fully connected layer: `f(W x + b)`.

use crate::error::EvalError;

/// Activation applied elementwise after the affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// `max(x, 0)`. NaN maps to 0.
    Rectified,
    /// `tanh(x)`, always within `[-1, 1]`.
    Saturating,
}

impl Activation {
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Rectified => rectified(x),
            Activation::Saturating => saturating(x),
        }
    }
}

#[inline]
pub fn rectified(x: f32) -> f32 {
    if x > 0.0 { x } else { 0.0 }
}

#[inline]
pub fn saturating(x: f32) -> f32 {
    x.tanh()
}

/// One affine + activation stage.
///
/// Weights are stored row-major as `[output][input]`. The layer owns no
/// output buffer: callers pass one in, so a shared layer is never written
/// during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    name: String,
    activation: Activation,
    input_dim: usize,
    output_dim: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl DenseLayer {
    /// A 0 × 0 layer waiting for [`load_rotated`](Self::load_rotated).
    pub fn unloaded(name: impl Into<String>, activation: Activation) -> Self {
        Self {
            name: name.into(),
            activation,
            input_dim: 0,
            output_dim: 0,
            weights: Vec::new(),
            biases: Vec::new(),
        }
    }

    /// Build a layer from a flat row-major `[output][input]` weight matrix.
    pub fn new(
        name: impl Into<String>,
        activation: Activation,
        input_dim: usize,
        weights: Vec<f32>,
        biases: Vec<f32>,
    ) -> Result<Self, EvalError> {
        let name = name.into();
        let output_dim = biases.len();
        let count = weight_count(&name, input_dim, output_dim)?;
        if weights.len() != count {
            return Err(EvalError::shape(
                &name,
                format!(
                    "{} weights for {output_dim} outputs x {input_dim} inputs",
                    weights.len()
                ),
            ));
        }
        Ok(Self { name, activation, input_dim, output_dim, weights, biases })
    }

    /// Build a layer from one weight row per output.
    pub fn from_rows<R: AsRef<[f32]>>(
        name: impl Into<String>,
        activation: Activation,
        rows: &[R],
        biases: Vec<f32>,
    ) -> Result<Self, EvalError> {
        let name = name.into();
        if rows.len() != biases.len() {
            return Err(EvalError::shape(
                &name,
                format!("{} weight rows but {} biases", rows.len(), biases.len()),
            ));
        }
        let input_dim = rows.first().map_or(0, |row| row.as_ref().len());
        if let Some(row) = rows.iter().find(|row| row.as_ref().len() != input_dim) {
            return Err(EvalError::shape(
                &name,
                format!("ragged weight rows: {} and {input_dim} columns", row.as_ref().len()),
            ));
        }
        let weights = rows.iter().flat_map(|row| row.as_ref().iter().copied()).collect();
        Self::new(name, activation, input_dim, weights, biases)
    }

    /// Build a layer from weights stored transposed, as `[input][output]`.
    pub fn from_rotated(
        name: impl Into<String>,
        activation: Activation,
        input_dim: usize,
        output_dim: usize,
        rotated: &[f32],
        biases: &[f32],
    ) -> Result<Self, EvalError> {
        let mut layer = Self::unloaded(name, activation);
        layer.load_rotated(input_dim, output_dim, rotated, biases)?;
        Ok(layer)
    }

    /// Size the layer and fill it from transposed `[input][output]` weights.
    ///
    /// On error the layer is left untouched.
    pub fn load_rotated(
        &mut self,
        input_dim: usize,
        output_dim: usize,
        rotated: &[f32],
        biases: &[f32],
    ) -> Result<(), EvalError> {
        let count = weight_count(&self.name, input_dim, output_dim)?;
        if biases.len() != output_dim {
            return Err(EvalError::shape(
                &self.name,
                format!("{output_dim} weight columns but {} biases", biases.len()),
            ));
        }
        if rotated.len() != count {
            return Err(EvalError::shape(
                &self.name,
                format!(
                    "{} weights for {input_dim} inputs x {output_dim} outputs",
                    rotated.len()
                ),
            ));
        }

        let mut weights = vec![0.0; count];
        for (i, column) in rotated.chunks_exact(output_dim).enumerate() {
            for (o, &w) in column.iter().enumerate() {
                weights[o * input_dim + i] = w;
            }
        }

        self.input_dim = input_dim;
        self.output_dim = output_dim;
        self.weights = weights;
        self.biases = biases.to_vec();
        Ok(())
    }

    /// Weights in the transposed `[input][output]` archive layout.
    pub fn to_rotated(&self) -> Vec<f32> {
        let mut rotated = vec![0.0; self.weights.len()];
        for (o, row) in self.rows().enumerate() {
            for (i, &w) in row.iter().enumerate() {
                rotated[i * self.output_dim + o] = w;
            }
        }
        rotated
    }

    /// Compute `f(W input + b)` into `output`.
    pub fn activate(&self, input: &[f32], output: &mut [f32]) -> Result<(), EvalError> {
        if !self.is_loaded() {
            return Err(EvalError::shape(&self.name, "layer has not been loaded"));
        }
        if input.len() != self.input_dim {
            return Err(EvalError::InputLengthMismatch {
                expected: self.input_dim,
                found: input.len(),
            });
        }
        if output.len() != self.output_dim {
            return Err(EvalError::InputLengthMismatch {
                expected: self.output_dim,
                found: output.len(),
            });
        }
        self.forward(input, output);
        Ok(())
    }

    /// Like [`activate`](Self::activate), returning a fresh vector.
    pub fn activate_owned(&self, input: &[f32]) -> Result<Vec<f32>, EvalError> {
        let mut output = vec![0.0; self.output_dim];
        self.activate(input, &mut output)?;
        Ok(output)
    }

    /// Forward pass without length checks; the caller guarantees the sizes.
    #[inline]
    pub(crate) fn forward(&self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), self.input_dim);
        debug_assert_eq!(output.len(), self.output_dim);
        for ((out, row), &bias) in output.iter_mut().zip(self.rows()).zip(&self.biases) {
            let sum: f32 = row.iter().zip(input).map(|(w, x)| w * x).sum();
            *out = self.activation.apply(sum + bias);
        }
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.weights.chunks_exact(self.input_dim.max(1))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// `false` until the layer has been sized.
    pub fn is_loaded(&self) -> bool {
        self.output_dim > 0
    }

    /// Weight connecting `input` to `output`.
    pub fn weight(&self, output: usize, input: usize) -> Option<f32> {
        if output < self.output_dim && input < self.input_dim {
            Some(self.weights[output * self.input_dim + input])
        } else {
            None
        }
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }
}

/// Number of weights in an `output_dim x input_dim` layer.
fn weight_count(name: &str, input_dim: usize, output_dim: usize) -> Result<usize, EvalError> {
    if input_dim == 0 || output_dim == 0 {
        return Err(EvalError::shape(
            name,
            format!("degenerate {output_dim} x {input_dim} layer"),
        ));
    }
    input_dim.checked_mul(output_dim).ok_or_else(|| {
        EvalError::shape(name, format!("{output_dim} x {input_dim} layer is too large"))
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sample_layer(activation: Activation) -> DenseLayer {
        DenseLayer::from_rows(
            "sample",
            activation,
            &[[1.0, 2.0, 3.0], [-1.0, 0.5, 0.0]],
            vec![0.5, -4.0],
        )
        .unwrap()
    }

    #[test]
    fn affine_then_rectify() {
        let layer = sample_layer(Activation::Rectified);
        let out = layer.activate_owned(&[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(out, vec![6.5, 0.0]);
        let out = layer.activate_owned(&[-10.0, 0.0, 0.0]).unwrap();
        assert_eq!(out, vec![0.0, 6.0]);
    }

    #[test]
    fn affine_then_tanh() {
        let layer = sample_layer(Activation::Saturating);
        let out = layer.activate_owned(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(out, vec![0.5f32.tanh(), (-4.0f32).tanh()]);
    }

    #[test]
    fn wrong_input_length_is_rejected() {
        let layer = sample_layer(Activation::Rectified);
        let err = layer.activate_owned(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, EvalError::InputLengthMismatch { expected: 3, found: 2 }));

        let mut short = [0.0; 1];
        let err = layer.activate(&[1.0, 2.0, 3.0], &mut short).unwrap_err();
        assert!(matches!(err, EvalError::InputLengthMismatch { expected: 2, found: 1 }));
    }

    #[test]
    fn unloaded_layer_refuses_to_run() {
        let layer = DenseLayer::unloaded("hidden", Activation::Rectified);
        assert!(!layer.is_loaded());
        assert!(matches!(
            layer.activate_owned(&[]),
            Err(EvalError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn overflowing_dimensions_are_rejected() {
        let mut layer = DenseLayer::unloaded("huge", Activation::Rectified);
        let err = layer.load_rotated(usize::MAX, 2, &[], &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, EvalError::ShapeMismatch { ref layer, .. } if layer == "huge"));
        assert!(!layer.is_loaded());

        let err = DenseLayer::new("huge", Activation::Rectified, usize::MAX, vec![], vec![0.0; 2])
            .unwrap_err();
        assert!(matches!(err, EvalError::ShapeMismatch { .. }));
    }

    #[test]
    fn mismatched_construction_fails() {
        let err = DenseLayer::from_rows("x", Activation::Rectified, &[[1.0, 2.0]], vec![0.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, EvalError::ShapeMismatch { .. }));

        let rows: [&[f32]; 2] = [&[1.0, 2.0], &[1.0]];
        let err = DenseLayer::from_rows("x", Activation::Rectified, &rows, vec![0.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, EvalError::ShapeMismatch { .. }));

        let err = DenseLayer::new("x", Activation::Rectified, 3, vec![0.0; 5], vec![0.0; 2])
            .unwrap_err();
        assert!(matches!(err, EvalError::ShapeMismatch { .. }));

        let err = DenseLayer::new("x", Activation::Rectified, 0, vec![], vec![0.0])
            .unwrap_err();
        assert!(matches!(err, EvalError::ShapeMismatch { .. }));
    }

    #[test]
    fn rotated_load_transposes() {
        // Two inputs, three outputs, stored input-major.
        let rotated = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let layer = DenseLayer::from_rotated(
            "t",
            Activation::Rectified,
            2,
            3,
            &rotated,
            &[0.0, 0.0, 0.0],
        )
        .unwrap();
        assert_eq!(layer.weight(0, 0), Some(1.0));
        assert_eq!(layer.weight(0, 1), Some(4.0));
        assert_eq!(layer.weight(2, 0), Some(3.0));
        assert_eq!(layer.weight(2, 1), Some(6.0));
        assert_eq!(layer.weight(3, 0), None);
        assert_eq!(layer.to_rotated(), rotated.to_vec());
    }

    #[test]
    fn failed_load_leaves_layer_untouched() {
        let mut layer = DenseLayer::unloaded("global", Activation::Rectified);
        let err = layer
            .load_rotated(15, 14, &vec![0.0; 15 * 14], &[0.0; 15])
            .unwrap_err();
        assert!(matches!(err, EvalError::ShapeMismatch { .. }));
        assert!(!layer.is_loaded());
        assert_eq!(layer.input_dim(), 0);
    }

    fn arb_layer() -> impl Strategy<Value = (DenseLayer, usize)> {
        (1usize..8, 1usize..8, prop::bool::ANY).prop_flat_map(|(inputs, outputs, tanh)| {
            (
                prop::collection::vec(-10.0f32..10.0, inputs * outputs),
                prop::collection::vec(-10.0f32..10.0, outputs),
            )
                .prop_map(move |(weights, biases)| {
                    let activation =
                        if tanh { Activation::Saturating } else { Activation::Rectified };
                    let layer = DenseLayer::new("p", activation, inputs, weights, biases)
                        .expect("generated dimensions agree");
                    (layer, inputs)
                })
        })
    }

    proptest! {
        #[test]
        fn zero_input_yields_activated_bias((layer, inputs) in arb_layer()) {
            let out = layer.activate_owned(&vec![0.0; inputs]).unwrap();
            let expected: Vec<f32> =
                layer.biases().iter().map(|&b| layer.activation().apply(b)).collect();
            prop_assert_eq!(out, expected);
        }

        #[test]
        fn rectified_is_idempotent(x in any::<f32>()) {
            let once = rectified(x);
            prop_assert_eq!(rectified(once), once);
            prop_assert!(once >= 0.0);
            if x < 0.0 {
                prop_assert_eq!(once, 0.0);
            }
        }

        #[test]
        fn saturating_is_bounded(x in -1.0e30f32..1.0e30f32) {
            let y = saturating(x);
            prop_assert!((-1.0..=1.0).contains(&y));
        }

        #[test]
        fn rotated_roundtrip_matches(
            (layer, inputs) in arb_layer(),
            seed in prop::collection::vec(-5.0f32..5.0, 8),
        ) {
            let reloaded = DenseLayer::from_rotated(
                "p",
                layer.activation(),
                layer.input_dim(),
                layer.output_dim(),
                &layer.to_rotated(),
                layer.biases(),
            )
            .unwrap();
            let input = &seed[..inputs];
            prop_assert_eq!(layer.activate_owned(input).unwrap(), reloaded.activate_owned(input).unwrap());
        }
    }
}
