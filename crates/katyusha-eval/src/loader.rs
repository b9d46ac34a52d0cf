//! Building a [`Network`] from a weight archive, and writing one back.
//!
//! Each layer `<name>` is stored as two arrays: `<name>_weights` with shape
//! `[inputs, outputs]` and `<name>_biases` with shape `[outputs]`, both
//! 4-byte floats. The weight matrix is transposed on the way in.

use std::path::Path;

use tracing::{debug, info};

use crate::archive::{MemoryArchive, NpzArchive, WeightArchive};
use crate::error::EvalError;
use crate::features::FeatureGroup;
use crate::layer::{Activation, DenseLayer};
use crate::network::{HIDDEN_LAYER, Network, OUTPUT_LAYER};
use crate::npy::NpyArray;

fn weights_name(layer: &str) -> String {
    format!("{layer}_weights")
}

fn biases_name(layer: &str) -> String {
    format!("{layer}_biases")
}

fn fetch<A: WeightArchive + ?Sized>(archive: &mut A, name: &str) -> Result<NpyArray, EvalError> {
    archive
        .array(name)?
        .ok_or_else(|| EvalError::MissingArchiveEntry { name: name.to_string() })
}

fn load_layer<A: WeightArchive + ?Sized>(
    archive: &mut A,
    name: &str,
    activation: Activation,
) -> Result<DenseLayer, EvalError> {
    let (w_name, b_name) = (weights_name(name), biases_name(name));
    let weights = fetch(archive, &w_name)?;
    let biases = fetch(archive, &b_name)?;
    let w_values = weights.to_f32(&w_name)?;
    let b_values = biases.to_f32(&b_name)?;

    let &[inputs, outputs] = weights.shape() else {
        return Err(EvalError::shape(
            name,
            format!("weights must be 2-D, found shape {:?}", weights.shape()),
        ));
    };
    let &[bias_len] = biases.shape() else {
        return Err(EvalError::shape(
            name,
            format!("biases must be 1-D, found shape {:?}", biases.shape()),
        ));
    };
    if outputs != bias_len {
        return Err(EvalError::shape(
            name,
            format!("{outputs} weight columns but {bias_len} biases"),
        ));
    }

    let layer = DenseLayer::from_rotated(name, activation, inputs, outputs, &w_values, &b_values)?;
    debug!(layer = name, inputs, outputs, ?activation, "loaded layer");
    Ok(layer)
}

impl Network {
    /// Load every layer from `archive` and validate the result.
    ///
    /// Nothing is returned unless all six layers load and fit together.
    pub fn load<A: WeightArchive + ?Sized>(archive: &mut A) -> Result<Network, EvalError> {
        let [global, piece, square, pawn] =
            FeatureGroup::ALL.map(|group| load_layer(archive, group.name(), Activation::Rectified));
        let branches = [global?, piece?, square?, pawn?];
        let hidden = load_layer(archive, HIDDEN_LAYER, Activation::Rectified)?;
        let output = load_layer(archive, OUTPUT_LAYER, Activation::Saturating)?;

        let net = Network::new(branches, hidden, output)?;
        info!(
            hidden = net.hidden().output_dim(),
            concat = net.hidden().input_dim(),
            "evaluation network ready"
        );
        Ok(net)
    }

    /// Open an `.npz` file and load from it.
    pub fn load_npz(path: impl AsRef<Path>) -> Result<Network, EvalError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading network weights");
        Network::load(&mut NpzArchive::open(path)?)
    }

    /// The archive [`load`](Self::load) would rebuild this network from.
    pub fn to_archive(&self) -> Result<MemoryArchive, EvalError> {
        let mut archive = MemoryArchive::new();
        for layer in self.layers() {
            archive.insert_f32(
                weights_name(layer.name()),
                vec![layer.input_dim(), layer.output_dim()],
                &layer.to_rotated(),
            )?;
            archive.insert_f32(biases_name(layer.name()), vec![layer.output_dim()], layer.biases())?;
        }
        Ok(archive)
    }

    /// Write the network as an `.npz` file readable by [`load_npz`](Self::load_npz).
    pub fn save_npz(&self, path: impl AsRef<Path>, compress: bool) -> Result<(), EvalError> {
        let path = path.as_ref();
        self.to_archive()?.save_npz(path, compress)?;
        debug!(path = %path.display(), compress, "saved network weights");
        Ok(())
    }
}
