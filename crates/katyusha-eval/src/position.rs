//! The queries feature extraction asks of a position.

use katyusha_core::{Bitboard, Board, CastleSide, Color, PieceKind, Square};

/// Read-only view of a chess position.
///
/// Anything that can answer these questions can be evaluated; [`Board`] is
/// the implementation used by the rest of the workspace.
pub trait PositionQuery {
    fn side_to_move(&self) -> Color;

    fn can_castle(&self, color: Color, side: CastleSide) -> bool;

    /// Pieces of one color and kind. Iterates in ascending square order.
    fn pieces_of(&self, color: Color, kind: PieceKind) -> Bitboard;

    fn count(&self, color: Color, kind: PieceKind) -> u32 {
        self.pieces_of(color, kind).count()
    }

    fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces_of(color, PieceKind::King).lsb()
    }

    /// Least valuable piece of `by` attacking `sq`.
    fn weakest_attacker(&self, sq: Square, by: Color) -> Option<PieceKind>;

    /// Number of squares a `kind` of `color` on `sq` attacks.
    fn mobility(&self, kind: PieceKind, color: Color, sq: Square) -> u32;

    /// Pawns of `color` on `file` (0 = a).
    fn pawns_on_file(&self, color: Color, file: u8) -> u32 {
        (self.pieces_of(color, PieceKind::Pawn) & Bitboard::file(file)).count()
    }
}

impl PositionQuery for Board {
    #[inline]
    fn side_to_move(&self) -> Color {
        Board::side_to_move(self)
    }

    #[inline]
    fn can_castle(&self, color: Color, side: CastleSide) -> bool {
        Board::can_castle(self, color, side)
    }

    #[inline]
    fn pieces_of(&self, color: Color, kind: PieceKind) -> Bitboard {
        Board::pieces_of(self, color, kind)
    }

    fn weakest_attacker(&self, sq: Square, by: Color) -> Option<PieceKind> {
        Board::weakest_attacker(self, sq, by)
    }

    fn mobility(&self, kind: PieceKind, color: Color, sq: Square) -> u32 {
        self.attacks_from(kind, color, sq).count()
    }
}

#[cfg(test)]
mod tests {
    use katyusha_core::{Board, CastleSide, Color, PieceKind, Square};

    use super::PositionQuery;

    fn query(board: &Board) -> &dyn PositionQuery {
        board
    }

    #[test]
    fn board_answers_through_trait() {
        let board = Board::starting_position();
        let q = query(&board);
        assert_eq!(q.side_to_move(), Color::White);
        assert!(q.can_castle(Color::White, CastleSide::KingSide));
        assert_eq!(q.count(Color::Black, PieceKind::Knight), 2);
        assert_eq!(q.king_square(Color::Black), Some(Square::E8));
        assert_eq!(q.weakest_attacker(Square::C3, Color::White), Some(PieceKind::Pawn));
        assert_eq!(q.mobility(PieceKind::Rook, Color::White, Square::A1), 2);
    }

    #[test]
    fn pawns_by_file() {
        let board: Board = "4k3/8/8/2P5/2P5/8/P7/4K3 w - - 0 1".parse().unwrap();
        let q = query(&board);
        assert_eq!(q.pawns_on_file(Color::White, 0), 1);
        assert_eq!(q.pawns_on_file(Color::White, 2), 2);
        assert_eq!(q.pawns_on_file(Color::White, 7), 0);
        assert_eq!(q.pawns_on_file(Color::Black, 2), 0);
    }
}
