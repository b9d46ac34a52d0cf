//! Attack sets for every piece kind.
//!
//! Leaper attacks come from tables built at compile time. Slider attacks are
//! walked ray by ray against the occupancy; feature extraction touches each
//! square a handful of times per position, so there are no magic tables.

use crate::bitboard::Bitboard;
use crate::color::Color;
use crate::square::Square;

type Delta = (i8, i8);

const KNIGHT_DELTAS: [Delta; 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

const KING_DELTAS: [Delta; 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

const WHITE_PAWN_DELTAS: [Delta; 2] = [(1, -1), (1, 1)];
const BLACK_PAWN_DELTAS: [Delta; 2] = [(-1, -1), (-1, 1)];

const ROOK_DIRECTIONS: [Delta; 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [Delta; 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Offset `sq` by `(rank, file)`, `None` if the result leaves the board.
#[inline]
const fn offset(sq: usize, delta: Delta) -> Option<usize> {
    let rank = (sq / 8) as i8 + delta.0;
    let file = (sq % 8) as i8 + delta.1;
    if rank >= 0 && rank < 8 && file >= 0 && file < 8 {
        Some(rank as usize * 8 + file as usize)
    } else {
        None
    }
}

const fn leaper_table<const N: usize>(deltas: &[Delta; N]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut sq = 0;
    while sq < 64 {
        let mut bits = 0u64;
        let mut d = 0;
        while d < N {
            if let Some(target) = offset(sq, deltas[d]) {
                bits |= 1u64 << target;
            }
            d += 1;
        }
        table[sq] = Bitboard::new(bits);
        sq += 1;
    }
    table
}

static KNIGHT_ATTACKS: [Bitboard; 64] = leaper_table(&KNIGHT_DELTAS);
static KING_ATTACKS: [Bitboard; 64] = leaper_table(&KING_DELTAS);
static PAWN_ATTACKS: [[Bitboard; 64]; 2] = [
    leaper_table(&WHITE_PAWN_DELTAS),
    leaper_table(&BLACK_PAWN_DELTAS),
];

/// Walk each ray from `sq` until the edge or the first occupied square (included).
fn slide(sq: Square, occupied: Bitboard, directions: &[Delta; 4]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &dir in directions {
        let mut cur = sq.index();
        while let Some(next) = offset(cur, dir) {
            let target = Square::from_index_unchecked(next as u8);
            attacks = attacks.with(target);
            if occupied.contains(target) {
                break;
            }
            cur = next;
        }
    }
    attacks
}

#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_ATTACKS[sq.index()]
}

#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    KING_ATTACKS[sq.index()]
}

/// Squares a pawn of `color` standing on `sq` captures on.
#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    PAWN_ATTACKS[color.index()][sq.index()]
}

pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    slide(sq, occupied, &ROOK_DIRECTIONS)
}

pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    slide(sq, occupied, &BISHOP_DIRECTIONS)
}

pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knight_counts() {
        assert_eq!(knight_attacks(Square::E4).count(), 8);
        assert_eq!(knight_attacks(Square::A1).count(), 2);
        assert!(knight_attacks(Square::G1).contains(Square::F3));
    }

    #[test]
    fn king_counts() {
        assert_eq!(king_attacks(Square::E4).count(), 8);
        assert_eq!(king_attacks(Square::H8).count(), 3);
    }

    #[test]
    fn pawns_do_not_wrap() {
        let a4 = pawn_attacks(Color::White, Square::A4);
        assert_eq!(a4.count(), 1);
        assert!(a4.contains(Square::B5));

        let h5 = pawn_attacks(Color::Black, Square::H5);
        assert_eq!(h5.count(), 1);
        assert!(h5.contains(Square::G4));

        assert!(pawn_attacks(Color::White, Square::E8).is_empty());
    }

    #[test]
    fn rook_on_empty_board_sees_fourteen() {
        for sq in Square::all() {
            assert_eq!(rook_attacks(sq, Bitboard::EMPTY).count(), 14, "rook on {sq}");
        }
    }

    #[test]
    fn bishop_center_and_corner() {
        assert_eq!(bishop_attacks(Square::D4, Bitboard::EMPTY).count(), 13);
        assert_eq!(bishop_attacks(Square::A1, Bitboard::EMPTY).count(), 7);
    }

    #[test]
    fn blockers_stop_rays() {
        let occupied = Square::E6.bitboard() | Square::C4.bitboard();
        let attacks = rook_attacks(Square::E4, occupied);
        assert!(attacks.contains(Square::E6));
        assert!(!attacks.contains(Square::E7));
        assert!(attacks.contains(Square::C4));
        assert!(!attacks.contains(Square::B4));
        assert_eq!(attacks.count(), 2 + 3 + 2 + 3);
    }

    #[test]
    fn queen_is_union() {
        let occ = Square::D5.bitboard();
        assert_eq!(
            queen_attacks(Square::D4, occ),
            rook_attacks(Square::D4, occ) | bishop_attacks(Square::D4, occ)
        );
    }
}
