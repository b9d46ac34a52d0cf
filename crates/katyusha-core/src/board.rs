//! Piece placement plus the game-state fields carried by FEN.

use std::fmt;

use crate::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::castle_rights::{CastleRights, CastleSide};
use crate::color::Color;
use crate::error::BoardError;
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// A chess position. Immutable once built.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Board {
    /// Indexed by [`PieceKind::index()`], both colors.
    pieces: [Bitboard; PieceKind::COUNT],
    /// Indexed by [`Color::index()`].
    sides: [Bitboard; Color::COUNT],
    side_to_move: Color,
    castling: CastleRights,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    fullmove_number: u16,
}

impl Board {
    /// The standard starting position.
    pub fn starting_position() -> Board {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        let mut pieces = [Bitboard::EMPTY; PieceKind::COUNT];
        let mut sides = [Bitboard::EMPTY; Color::COUNT];
        for (color, back, front) in [(Color::White, 0u8, 1u8), (Color::Black, 7, 6)] {
            for file in 0..8u8 {
                for (rank, kind) in [(back, BACK_RANK[file as usize]), (front, PieceKind::Pawn)] {
                    if let Some(sq) = Square::from_coords(rank, file) {
                        pieces[kind.index()] = pieces[kind.index()].with(sq);
                        sides[color.index()] = sides[color.index()].with(sq);
                    }
                }
            }
        }

        Board::from_parts(pieces, sides, Color::White, CastleRights::ALL, None, 0, 1)
    }

    pub(crate) fn from_parts(
        pieces: [Bitboard; PieceKind::COUNT],
        sides: [Bitboard; Color::COUNT],
        side_to_move: Color,
        castling: CastleRights,
        en_passant: Option<Square>,
        halfmove_clock: u16,
        fullmove_number: u16,
    ) -> Board {
        Board {
            pieces,
            sides,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        }
    }

    /// Both colors' pieces of one kind.
    #[inline]
    pub fn pieces(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()]
    }

    /// Every piece of one color.
    #[inline]
    pub fn side(&self, color: Color) -> Bitboard {
        self.sides[color.index()]
    }

    /// Pieces of one color and kind.
    #[inline]
    pub fn pieces_of(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces(kind) & self.side(color)
    }

    /// Number of pieces of one color and kind.
    #[inline]
    pub fn count(&self, color: Color, kind: PieceKind) -> u32 {
        self.pieces_of(color, kind).count()
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.sides[0] | self.sides[1]
    }

    pub fn piece_on(&self, sq: Square) -> Option<PieceKind> {
        PieceKind::ALL
            .into_iter()
            .find(|&kind| self.pieces(kind).contains(sq))
    }

    pub fn color_on(&self, sq: Square) -> Option<Color> {
        Color::ALL.into_iter().find(|&color| self.side(color).contains(sq))
    }

    /// The king of `color`, `None` on a board without one.
    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces_of(color, PieceKind::King).lsb()
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling(&self) -> CastleRights {
        self.castling
    }

    #[inline]
    pub fn can_castle(&self, color: Color, side: CastleSide) -> bool {
        self.castling.has(color, side)
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// Squares a piece of `kind` and `color` on `sq` attacks, under the current occupancy.
    ///
    /// The square does not need to hold that piece.
    pub fn attacks_from(&self, kind: PieceKind, color: Color, sq: Square) -> Bitboard {
        let occupied = self.occupied();
        match kind {
            PieceKind::Pawn => pawn_attacks(color, sq),
            PieceKind::Knight => knight_attacks(sq),
            PieceKind::Bishop => bishop_attacks(sq, occupied),
            PieceKind::Rook => rook_attacks(sq, occupied),
            PieceKind::Queen => queen_attacks(sq, occupied),
            PieceKind::King => king_attacks(sq),
        }
    }

    /// Every piece of either color attacking `sq`. No x-rays, pins are ignored.
    pub fn attackers_to(&self, sq: Square) -> Bitboard {
        let occupied = self.occupied();
        let rook_like = self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen);
        let bishop_like = self.pieces(PieceKind::Bishop) | self.pieces(PieceKind::Queen);

        (knight_attacks(sq) & self.pieces(PieceKind::Knight))
            | (king_attacks(sq) & self.pieces(PieceKind::King))
            | (rook_attacks(sq, occupied) & rook_like)
            | (bishop_attacks(sq, occupied) & bishop_like)
            | (pawn_attacks(Color::Black, sq) & self.pieces_of(Color::White, PieceKind::Pawn))
            | (pawn_attacks(Color::White, sq) & self.pieces_of(Color::Black, PieceKind::Pawn))
    }

    /// The least valuable piece of `by` attacking `sq`.
    pub fn weakest_attacker(&self, sq: Square, by: Color) -> Option<PieceKind> {
        let attackers = self.attackers_to(sq) & self.side(by);
        if attackers.is_empty() {
            return None;
        }
        PieceKind::ALL
            .into_iter()
            .find(|&kind| (attackers & self.pieces(kind)).is_nonempty())
    }

    /// Check that the position is structurally sound.
    pub fn validate(&self) -> Result<(), BoardError> {
        for color in Color::ALL {
            let count = self.count(color, PieceKind::King);
            if count != 1 {
                return Err(BoardError::InvalidKingCount { color, count });
            }
        }

        if (self.pieces(PieceKind::Pawn) & (Bitboard::RANK_1 | Bitboard::RANK_8)).is_nonempty() {
            return Err(BoardError::PawnsOnBackRank);
        }

        let mut seen = Bitboard::EMPTY;
        for bb in self.pieces {
            if (seen & bb).is_nonempty() {
                return Err(BoardError::OverlappingPieces);
            }
            seen |= bb;
        }
        if (self.sides[0] & self.sides[1]).is_nonempty() || seen != self.occupied() {
            return Err(BoardError::OverlappingPieces);
        }

        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::starting_position()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board(\"{self}\")")
    }
}

#[cfg(test)]
mod tests {
    use super::Board;
    use crate::castle_rights::CastleSide;
    use crate::color::Color;
    use crate::fen::STARTING_FEN;
    use crate::piece_kind::PieceKind;
    use crate::square::Square;

    #[test]
    fn starting_position_matches_fen() {
        let parsed: Board = STARTING_FEN.parse().unwrap();
        assert_eq!(Board::starting_position(), parsed);
        Board::starting_position().validate().unwrap();
    }

    #[test]
    fn starting_position_counts() {
        let board = Board::starting_position();
        assert_eq!(board.count(Color::White, PieceKind::Pawn), 8);
        assert_eq!(board.count(Color::Black, PieceKind::Rook), 2);
        assert_eq!(board.count(Color::Black, PieceKind::Queen), 1);
        assert_eq!(board.occupied().count(), 32);
        assert_eq!(board.king_square(Color::White), Some(Square::E1));
        assert_eq!(board.king_square(Color::Black), Some(Square::E8));
        assert!(board.can_castle(Color::Black, CastleSide::QueenSide));
    }

    #[test]
    fn piece_and_color_on() {
        let board = Board::starting_position();
        assert_eq!(board.piece_on(Square::D1), Some(PieceKind::Queen));
        assert_eq!(board.color_on(Square::D1), Some(Color::White));
        assert_eq!(board.piece_on(Square::G8), Some(PieceKind::Knight));
        assert_eq!(board.color_on(Square::G8), Some(Color::Black));
        assert_eq!(board.piece_on(Square::E4), None);
    }

    #[test]
    fn weakest_attacker_prefers_pawns() {
        let board = Board::starting_position();
        // a3 is covered by the b2 pawn and the b1 knight.
        assert_eq!(board.weakest_attacker(Square::A3, Color::White), Some(PieceKind::Pawn));
        // f3 is covered by the e2/g2 pawns and the g1 knight.
        assert_eq!(board.weakest_attacker(Square::F3, Color::White), Some(PieceKind::Pawn));
        assert_eq!(board.weakest_attacker(Square::E4, Color::White), None);
        assert_eq!(board.weakest_attacker(Square::A6, Color::Black), Some(PieceKind::Pawn));
    }

    #[test]
    fn weakest_attacker_of_occupied_squares() {
        let board = Board::starting_position();
        // Only the king guards d1; the queen does not attack its own square.
        assert_eq!(board.weakest_attacker(Square::D1, Color::White), Some(PieceKind::King));
        assert_eq!(board.weakest_attacker(Square::A1, Color::White), None);
        assert_eq!(board.weakest_attacker(Square::D1, Color::Black), None);
    }

    #[test]
    fn attacks_from_uses_occupancy() {
        let board = Board::starting_position();
        assert_eq!(board.attacks_from(PieceKind::Queen, Color::White, Square::D1).count(), 5);
        assert_eq!(board.attacks_from(PieceKind::Rook, Color::White, Square::A1).count(), 2);
        assert_eq!(board.attacks_from(PieceKind::Bishop, Color::Black, Square::C8).count(), 2);
    }

    #[test]
    fn slider_attack_through_open_file() {
        let board: Board = "4k3/8/8/8/8/8/8/R3K3 w - - 0 1".parse().unwrap();
        assert_eq!(board.weakest_attacker(Square::A8, Color::White), Some(PieceKind::Rook));
        assert_eq!(board.weakest_attacker(Square::E8, Color::White), None);
        assert_eq!(board.weakest_attacker(Square::D2, Color::White), Some(PieceKind::King));
    }
}
