//! Host-facing evaluation: pick a backend, score positions in host units.

use std::path::PathBuf;
use std::sync::Arc;

use katyusha_core::Color;
use tracing::info;

use crate::error::EvalError;
use crate::features::{FeatureVector, extract};
use crate::material::material;
use crate::network::{Network, Scratch};
use crate::position::PositionQuery;

/// Default multiplier applied to the network's `[-1, 1]` output.
pub const DEFAULT_NETWORK_SCALE: f32 = 50.0;
/// Default value of one pawn in host score units.
pub const DEFAULT_PAWN_VALUE: i32 = 100;

/// Which evaluation backs an [`Evaluator`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EvaluatorKind {
    /// Count material only.
    #[default]
    Material,
    /// Run the network stored in an `.npz` archive.
    Network { weights: PathBuf },
}

/// Evaluator settings supplied by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalConfig {
    pub kind: EvaluatorKind,
    /// Score units per unit of network output, in pawns.
    pub network_scale: f32,
    pub pawn_value: i32,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            kind: EvaluatorKind::Material,
            network_scale: DEFAULT_NETWORK_SCALE,
            pawn_value: DEFAULT_PAWN_VALUE,
        }
    }
}

impl EvalConfig {
    /// Default settings with the network loaded from `weights`.
    pub fn with_weights(weights: impl Into<PathBuf>) -> Self {
        Self { kind: EvaluatorKind::Network { weights: weights.into() }, ..Self::default() }
    }
}

#[derive(Debug)]
enum Backend {
    Material,
    Network { net: Arc<Network>, scratch: Scratch },
}

/// Scores positions for one thread.
///
/// Cloning shares the network and gives the clone its own buffers, so each
/// search thread can hold a clone.
#[derive(Debug)]
pub struct Evaluator {
    backend: Backend,
    network_scale: f32,
    pawn_value: i32,
}

impl Evaluator {
    /// Build the evaluator `config` asks for, loading weights if needed.
    pub fn new(config: &EvalConfig) -> Result<Self, EvalError> {
        match &config.kind {
            EvaluatorKind::Material => {
                info!(pawn_value = config.pawn_value, "using material evaluation");
                Ok(Self::material(config))
            }
            EvaluatorKind::Network { weights } => {
                let net = Network::load_npz(weights)?;
                info!(
                    path = %weights.display(),
                    scale = config.network_scale,
                    pawn_value = config.pawn_value,
                    "using network evaluation"
                );
                Ok(Self::with_network(Arc::new(net), config))
            }
        }
    }

    /// Material-only evaluator, whatever `config.kind` says.
    pub fn material(config: &EvalConfig) -> Self {
        Self {
            backend: Backend::Material,
            network_scale: config.network_scale,
            pawn_value: config.pawn_value,
        }
    }

    /// Evaluator over an already loaded network.
    pub fn with_network(net: Arc<Network>, config: &EvalConfig) -> Self {
        let scratch = net.scratch();
        Self {
            backend: Backend::Network { net, scratch },
            network_scale: config.network_scale,
            pawn_value: config.pawn_value,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self.backend, Backend::Network { .. })
    }

    pub fn network(&self) -> Option<&Arc<Network>> {
        match &self.backend {
            Backend::Network { net, .. } => Some(net),
            Backend::Material => None,
        }
    }

    /// Score relative to the side to move, in host units.
    pub fn evaluate<P: PositionQuery + ?Sized>(&mut self, pos: &P) -> i32 {
        let white_pov = match self.raw(pos) {
            Some(raw) => self.rescale(raw),
            None => material(pos, self.pawn_value),
        };
        match pos.side_to_move() {
            Color::White => white_pov,
            Color::Black => white_pov.saturating_neg(),
        }
    }

    /// Network output in `[-1, 1]` from White's point of view, `None` when
    /// evaluating by material.
    pub fn raw<P: PositionQuery + ?Sized>(&mut self, pos: &P) -> Option<f32> {
        match &mut self.backend {
            Backend::Network { net, scratch } => Some(net.evaluate(&extract(pos), scratch)),
            Backend::Material => None,
        }
    }

    /// The features the network would see for `pos`.
    pub fn features<P: PositionQuery + ?Sized>(&self, pos: &P) -> FeatureVector {
        extract(pos)
    }

    /// Truncates toward zero and saturates at the `i32` bounds.
    fn rescale(&self, raw: f32) -> i32 {
        (raw * self.network_scale * self.pawn_value as f32) as i32
    }
}

impl Clone for Evaluator {
    fn clone(&self) -> Self {
        let backend = match &self.backend {
            Backend::Material => Backend::Material,
            Backend::Network { net, .. } => Backend::Network {
                net: Arc::clone(net),
                scratch: net.scratch(),
            },
        };
        Self { backend, network_scale: self.network_scale, pawn_value: self.pawn_value }
    }
}
