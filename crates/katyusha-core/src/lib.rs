//! Read-only chess position used as the host for feature extraction.
//!
//! Positions are built from FEN and answer occupancy, castling and attack
//! queries. There is no move generation here.

mod attacks;
mod bitboard;
mod board;
mod castle_rights;
mod color;
mod error;
mod fen;
mod piece_kind;
mod square;

pub use attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks};
pub use bitboard::Bitboard;
pub use board::Board;
pub use castle_rights::{CastleRights, CastleSide};
pub use color::Color;
pub use error::{BoardError, FenError};
pub use fen::STARTING_FEN;
pub use piece_kind::PieceKind;
pub use square::Square;
