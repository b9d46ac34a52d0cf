//! FEN parsing and printing for [`Board`].

use std::fmt;
use std::str::FromStr;

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::castle_rights::CastleRights;
use crate::color::Color;
use crate::error::FenError;
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Accepts full six-field FEN and four-field EPD-style placement
/// (move counters then default to `0 1`).
impl FromStr for Board {
    type Err = FenError;

    fn from_str(fen: &str) -> Result<Board, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(FenError::WrongFieldCount { found: fields.len() });
        }

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::WrongRankCount { found: ranks.len() });
        }

        let mut pieces = [Bitboard::EMPTY; PieceKind::COUNT];
        let mut sides = [Bitboard::EMPTY; Color::COUNT];

        for (rank_index, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_index as u8;
            let mut file: u8 = 0;

            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(FenError::InvalidPieceChar { character: c });
                    }
                    file += skip as u8;
                    if file > 8 {
                        return Err(FenError::BadRankLength { rank_index, length: file as usize });
                    }
                    continue;
                }

                let kind = PieceKind::from_fen_char(c)
                    .ok_or(FenError::InvalidPieceChar { character: c })?;
                let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
                let sq = Square::from_coords(rank, file).ok_or(FenError::BadRankLength {
                    rank_index,
                    length: file as usize + 1,
                })?;

                pieces[kind.index()] |= sq.bitboard();
                sides[color.index()] |= sq.bitboard();
                file += 1;
            }

            if file != 8 {
                return Err(FenError::BadRankLength { rank_index, length: file as usize });
            }
        }

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidColor { found: other.to_string() }),
        };

        let castling = CastleRights::from_fen(fields[2])?;

        let en_passant = match fields[3] {
            "-" => None,
            s => Some(
                Square::from_algebraic(s)
                    .ok_or_else(|| FenError::InvalidEnPassant { found: s.to_string() })?,
            ),
        };

        let counter = |index: usize, field: &'static str, default: u16| match fields.get(index) {
            None => Ok(default),
            Some(s) => s
                .parse::<u16>()
                .map_err(|_| FenError::InvalidMoveCounter { field, found: s.to_string() }),
        };
        let halfmove_clock = counter(4, "halfmove clock", 0)?;
        let fullmove_number = counter(5, "fullmove number", 1)?;

        let board = Board::from_parts(
            pieces,
            sides,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        );
        board.validate()?;
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            let mut empty = 0u8;
            for file in 0..8u8 {
                let Some(sq) = Square::from_coords(rank, file) else {
                    continue;
                };
                match (self.piece_on(sq), self.color_on(sq)) {
                    (Some(kind), Some(color)) => {
                        if empty > 0 {
                            write!(f, "{empty}")?;
                            empty = 0;
                        }
                        let c = kind.fen_char();
                        let c = if color == Color::White { c.to_ascii_uppercase() } else { c };
                        write!(f, "{c}")?;
                    }
                    _ => empty += 1,
                }
            }
            if empty > 0 {
                write!(f, "{empty}")?;
            }
            if rank > 0 {
                f.write_str("/")?;
            }
        }

        write!(f, " {} {}", self.side_to_move(), self.castling())?;
        match self.en_passant() {
            Some(sq) => write!(f, " {sq}")?,
            None => f.write_str(" -")?,
        }
        write!(f, " {} {}", self.halfmove_clock(), self.fullmove_number())
    }
}
