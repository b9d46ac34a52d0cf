//! Board squares, indexed rank-major from a1 = 0 to h8 = 63.

use std::fmt;

use crate::bitboard::Bitboard;

/// A square on the board. `index = rank * 8 + file`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

impl Square {
    /// Total number of squares.
    pub const COUNT: usize = 64;

    /// Build a square from zero-based rank and file, `None` if either is off the board.
    #[inline]
    pub const fn from_coords(rank: u8, file: u8) -> Option<Square> {
        if rank < 8 && file < 8 {
            Some(Square(rank * 8 + file))
        } else {
            None
        }
    }

    /// Build a square from its index, `None` if `index >= 64`.
    #[inline]
    pub const fn from_index(index: u8) -> Option<Square> {
        if index < 64 { Some(Square(index)) } else { None }
    }

    #[inline]
    pub(crate) const fn from_index_unchecked(index: u8) -> Square {
        debug_assert!(index < 64);
        Square(index)
    }

    /// Parse algebraic notation such as `"e4"`.
    pub fn from_algebraic(s: &str) -> Option<Square> {
        match s.as_bytes() {
            &[f @ b'a'..=b'h', r @ b'1'..=b'8'] => Square::from_coords(r - b'1', f - b'a'),
            _ => None,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Zero-based rank (0 = rank 1).
    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 / 8
    }

    /// Zero-based file (0 = file a).
    #[inline]
    pub const fn file(self) -> u8 {
        self.0 % 8
    }

    #[inline]
    pub const fn bitboard(self) -> Bitboard {
        Bitboard::new(1u64 << self.0)
    }

    /// All squares from a1 to h8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0u8..64).map(Square)
    }
}

macro_rules! named_squares {
    ($($rank:literal => $a:ident $b:ident $c:ident $d:ident $e:ident $f:ident $g:ident $h:ident;)*) => {
        impl Square {
            $(
                pub const $a: Square = Square($rank * 8);
                pub const $b: Square = Square($rank * 8 + 1);
                pub const $c: Square = Square($rank * 8 + 2);
                pub const $d: Square = Square($rank * 8 + 3);
                pub const $e: Square = Square($rank * 8 + 4);
                pub const $f: Square = Square($rank * 8 + 5);
                pub const $g: Square = Square($rank * 8 + 6);
                pub const $h: Square = Square($rank * 8 + 7);
            )*
        }
    };
}

named_squares! {
    0 => A1 B1 C1 D1 E1 F1 G1 H1;
    1 => A2 B2 C2 D2 E2 F2 G2 H2;
    2 => A3 B3 C3 D3 E3 F3 G3 H3;
    3 => A4 B4 C4 D4 E4 F4 G4 H4;
    4 => A5 B5 C5 D5 E5 F5 G5 H5;
    5 => A6 B6 C6 D6 E6 F6 G6 H6;
    6 => A7 B7 C7 D7 E7 F7 G7 H7;
    7 => A8 B8 C8 D8 E8 F8 G8 H8;
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, self.rank() + 1)
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({self})")
    }
}
