//! Shared fixture network for the integration tests.

#![allow(dead_code)]

use katyusha_eval::{
    Activation, DenseLayer, FeatureGroup, HIDDEN_LAYER, MemoryArchive, Network, OUTPUT_LAYER,
};

pub const POSITIONS: [&str; 5] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
    "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2",
    "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3",
    "8/8/8/3k4/8/3K4/4P3/8 w - - 0 1",
];

/// Archive for a network with two outputs per branch, as the training
/// pipeline would export it: weights stored `[inputs, outputs]`.
pub fn fixture_archive() -> MemoryArchive {
    let mut archive = MemoryArchive::new();
    let branch_biases = [[0.5, -0.5], [0.25, 1.0], [-1.0, 0.75], [0.125, -2.0]];
    for group in FeatureGroup::ALL {
        let rotated: Vec<f32> = (0..group.len() * 2)
            .map(|k| ((k * 13) % 17) as f32 / 100.0 - 0.08)
            .collect();
        archive
            .insert_f32(format!("{}_weights", group.name()), vec![group.len(), 2], &rotated)
            .unwrap();
        archive
            .insert_f32(format!("{}_biases", group.name()), vec![2], &branch_biases[group.index()])
            .unwrap();
    }

    // Hidden: output 0 sums everything, output 1 subtracts everything.
    let hidden: Vec<f32> = (0..8).flat_map(|_| [1.0, -1.0]).collect();
    archive.insert_f32("layer1_weights", vec![8, 2], &hidden).unwrap();
    archive.insert_f32("layer1_biases", vec![2], &[-2.0, 0.5]).unwrap();
    archive.insert_f32("outlayer_weights", vec![2, 1], &[0.8, 3.0]).unwrap();
    archive.insert_f32("outlayer_biases", vec![1], &[0.0]).unwrap();
    archive
}

/// The same network built directly from `[output][input]` rows.
pub fn fixture_by_rows() -> Network {
    let archive = fixture_archive();
    let layer = |name: &str, activation: Activation| {
        let weights = archive.get(&format!("{name}_weights")).unwrap();
        let biases = archive.get(&format!("{name}_biases")).unwrap();
        let (inputs, outputs) = (weights.shape()[0], weights.shape()[1]);
        let rotated = weights.to_f32(name).unwrap();
        let rows: Vec<Vec<f32>> = (0..outputs)
            .map(|o| (0..inputs).map(|i| rotated[i * outputs + o]).collect())
            .collect();
        DenseLayer::from_rows(name, activation, &rows, biases.to_f32(name).unwrap()).unwrap()
    };
    let branches = FeatureGroup::ALL.map(|g| layer(g.name(), Activation::Rectified));
    Network::new(
        branches,
        layer(HIDDEN_LAYER, Activation::Rectified),
        layer(OUTPUT_LAYER, Activation::Saturating),
    )
    .unwrap()
}
