//! Plain material count, used when no network is configured.

use katyusha_core::{Color, PieceKind};

use crate::position::PositionQuery;

/// Piece values in centipawns, indexed by [`PieceKind::index()`].
///
/// | Piece  | value |
/// |--------|-------|
/// | Pawn   | 100   |
/// | Knight | 320   |
/// | Bishop | 330   |
/// | Rook   | 500   |
/// | Queen  | 900   |
/// | King   | 0     |
pub const MATERIAL_VALUE: [i32; PieceKind::COUNT] = [100, 320, 330, 500, 900, 0];

/// Material balance from White's point of view, with a pawn worth `pawn_value`.
///
/// Saturates instead of overflowing for very large `pawn_value`.
pub fn material<P: PositionQuery + ?Sized>(pos: &P, pawn_value: i32) -> i32 {
    let centipawns: i32 = PieceKind::ALL
        .into_iter()
        .map(|kind| {
            let white = pos.count(Color::White, kind) as i32;
            let black = pos.count(Color::Black, kind) as i32;
            MATERIAL_VALUE[kind.index()] * (white - black)
        })
        .sum();
    centipawns.saturating_mul(pawn_value) / 100
}
