//! Errors raised while building positions.

/// Errors from parsing a FEN string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("expected 4 to 6 FEN fields, found {found}")]
    WrongFieldCount { found: usize },

    #[error("expected 8 ranks in piece placement, found {found}")]
    WrongRankCount { found: usize },

    /// `rank_index` counts from the top of the FEN (0 = rank 8).
    #[error("rank {rank_index} describes {length} squares, expected 8")]
    BadRankLength { rank_index: usize, length: usize },

    #[error("invalid piece character: '{character}'")]
    InvalidPieceChar { character: char },

    #[error("invalid active color: \"{found}\"")]
    InvalidColor { found: String },

    #[error("invalid castling character: '{character}'")]
    InvalidCastlingChar { character: char },

    #[error("invalid en passant square: \"{found}\"")]
    InvalidEnPassant { found: String },

    #[error("invalid {field}: \"{found}\"")]
    InvalidMoveCounter { field: &'static str, found: String },

    #[error("invalid board: {source}")]
    InvalidBoard {
        #[from]
        source: BoardError,
    },
}

/// Structural problems found by [`Board::validate`](crate::Board::validate).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("expected 1 king for {color}, found {count}")]
    InvalidKingCount { color: crate::Color, count: u32 },

    #[error("pawns found on back rank")]
    PawnsOnBackRank,

    #[error("two pieces claim the same square")]
    OverlappingPieces,
}

#[cfg(test)]
mod tests {
    use super::{BoardError, FenError};
    use crate::Color;

    #[test]
    fn display() {
        let err = FenError::WrongFieldCount { found: 2 };
        assert_eq!(err.to_string(), "expected 4 to 6 FEN fields, found 2");
        let err = BoardError::InvalidKingCount { color: Color::Black, count: 0 };
        assert_eq!(err.to_string(), "expected 1 king for b, found 0");
    }

    #[test]
    fn board_error_converts() {
        let err: FenError = BoardError::PawnsOnBackRank.into();
        assert!(matches!(err, FenError::InvalidBoard { .. }));
    }
}
