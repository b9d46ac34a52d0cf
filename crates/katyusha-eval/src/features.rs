//! The 323-value position encoding fed to the network.
//!
//! The vector is split into four contiguous groups, each consumed by its own
//! branch layer:
//!
//! | group    | offset | len | contents                                        |
//! |----------|--------|-----|-------------------------------------------------|
//! | `global` | 0      | 15  | side to move, castling rights, material counts  |
//! | `piece`  | 15     | 164 | king coordinates, then one slot per roster piece|
//! | `square` | 179    | 128 | weakest attacker per square, both sides         |
//! | `pawn`   | 307    | 16  | pawns per file, White then Black                |
//!
//! Every index has a fixed meaning. Missing pieces leave their slot zeroed
//! and never shift later entries.

use std::ops::{Index, Range};

use katyusha_core::{CastleSide, Color, PieceKind, Square};

use crate::error::EvalError;
use crate::position::PositionQuery;

pub const GLOBAL_FEATURES: usize = 15;
pub const PIECE_FEATURES: usize = 164;
pub const SQUARE_FEATURES: usize = 128;
pub const PAWN_FEATURES: usize = 16;
pub const TOTAL_FEATURES: usize =
    GLOBAL_FEATURES + PIECE_FEATURES + SQUARE_FEATURES + PAWN_FEATURES;

/// One of the four contiguous slices of a [`FeatureVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureGroup {
    Global,
    Piece,
    Square,
    Pawn,
}

impl FeatureGroup {
    pub const COUNT: usize = 4;

    /// Groups in vector (and branch) order.
    pub const ALL: [FeatureGroup; 4] = [
        FeatureGroup::Global,
        FeatureGroup::Piece,
        FeatureGroup::Square,
        FeatureGroup::Pawn,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn offset(self) -> usize {
        match self {
            FeatureGroup::Global => 0,
            FeatureGroup::Piece => GLOBAL_FEATURES,
            FeatureGroup::Square => GLOBAL_FEATURES + PIECE_FEATURES,
            FeatureGroup::Pawn => GLOBAL_FEATURES + PIECE_FEATURES + SQUARE_FEATURES,
        }
    }

    pub const fn len(self) -> usize {
        match self {
            FeatureGroup::Global => GLOBAL_FEATURES,
            FeatureGroup::Piece => PIECE_FEATURES,
            FeatureGroup::Square => SQUARE_FEATURES,
            FeatureGroup::Pawn => PAWN_FEATURES,
        }
    }

    pub const fn range(self) -> Range<usize> {
        self.offset()..self.offset() + self.len()
    }

    /// Name of the branch layer reading this group, as used in weight archives.
    pub const fn name(self) -> &'static str {
        match self {
            FeatureGroup::Global => "global",
            FeatureGroup::Piece => "piece",
            FeatureGroup::Square => "square",
            FeatureGroup::Pawn => "pawn",
        }
    }
}

/// A field of a piece slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotField {
    /// 1 when the slot is filled.
    Exists,
    Rank,
    File,
    /// Weakest piece of the owner's color attacking the square.
    MinDefender,
    /// Weakest piece of the opposing color attacking the square.
    MinAttacker,
    /// Squares attacked under the current occupancy. Sliders only.
    Squares,
}

impl SlotField {
    const ALL: [SlotField; 6] = [
        SlotField::Exists,
        SlotField::Rank,
        SlotField::File,
        SlotField::MinDefender,
        SlotField::MinAttacker,
        SlotField::Squares,
    ];

    const fn label(self) -> &'static str {
        match self {
            SlotField::Exists => "EXISTS",
            SlotField::Rank => "RANK",
            SlotField::File => "FILE",
            SlotField::MinDefender => "MIN_DEFENDER",
            SlotField::MinAttacker => "MIN_ATTACKER",
            SlotField::Squares => "SQUARES",
        }
    }
}

/// Tracked pieces per color, in slot order.
const ROSTER: [(PieceKind, usize); 5] = [
    (PieceKind::Queen, 1),
    (PieceKind::Rook, 2),
    (PieceKind::Bishop, 2),
    (PieceKind::Knight, 2),
    (PieceKind::Pawn, 8),
];

/// Material counted in the global group, per color.
const COUNTED: [PieceKind; 5] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Pawn,
];

/// `WK_RANK, WK_FILE, BK_RANK, BK_FILE` at the head of the piece group.
const KING_FIELDS: usize = 4;
const SIDE_BLOCK: usize = 80;

const fn slot_width(kind: PieceKind) -> usize {
    if kind.is_slider() { 6 } else { 5 }
}

const GLOBAL_NAMES: [&str; GLOBAL_FEATURES] = [
    "SIDE_TO_MOVE",
    "WCASTLE_OO",
    "WCASTLE_OOO",
    "BCASTLE_OO",
    "BCASTLE_OOO",
    "NUM_WQ",
    "NUM_WR",
    "NUM_WB",
    "NUM_WN",
    "NUM_WP",
    "NUM_BQ",
    "NUM_BR",
    "NUM_BB",
    "NUM_BN",
    "NUM_BP",
];

const KING_NAMES: [&str; KING_FIELDS] = ["WK_RANK", "WK_FILE", "BK_RANK", "BK_FILE"];

/// Absolute index of `field` in the `n`-th (0-based) slot of `color`'s `kind`.
///
/// `None` for kings, slots beyond the roster and `Squares` on non-sliders.
pub fn piece_feature(color: Color, kind: PieceKind, n: usize, field: SlotField) -> Option<usize> {
    if field == SlotField::Squares && !kind.is_slider() {
        return None;
    }
    let mut offset = FeatureGroup::Piece.offset() + KING_FIELDS + color.index() * SIDE_BLOCK;
    for (roster_kind, slots) in ROSTER {
        let width = slot_width(roster_kind);
        if roster_kind == kind {
            return (n < slots).then(|| offset + n * width + field as usize);
        }
        offset += slots * width;
    }
    None
}

/// Diagnostic name of the feature at `index`, e.g. `WR1_SQUARES`.
pub fn feature_name(index: usize) -> Option<String> {
    let group = FeatureGroup::ALL.into_iter().find(|g| g.range().contains(&index))?;
    let local = index - group.offset();
    let name = match group {
        FeatureGroup::Global => GLOBAL_NAMES[local].to_string(),
        FeatureGroup::Piece => piece_name(local)?,
        FeatureGroup::Square => {
            let prefix = if local < Square::COUNT { "ATTACK" } else { "DEFEND" };
            let sq = Square::from_index((local % Square::COUNT) as u8)?;
            format!("{prefix}_SQ_{}", sq.to_string().to_ascii_uppercase())
        }
        FeatureGroup::Pawn => {
            let side = if local < 8 { "WHITE" } else { "BLACK" };
            let file = char::from(b'A' + (local % 8) as u8);
            format!("{side}_PAWN_FILE_{file}")
        }
    };
    Some(name)
}

fn piece_name(local: usize) -> Option<String> {
    if local < KING_FIELDS {
        return Some(KING_NAMES[local].to_string());
    }
    let color = Color::ALL[(local - KING_FIELDS) / SIDE_BLOCK];
    let mut rest = (local - KING_FIELDS) % SIDE_BLOCK;
    for (kind, slots) in ROSTER {
        let width = slot_width(kind);
        if rest < slots * width {
            return Some(format!(
                "{}{}{}_{}",
                color.letter(),
                kind.fen_char().to_ascii_uppercase(),
                rest / width + 1,
                SlotField::ALL[rest % width].label()
            ));
        }
        rest -= slots * width;
    }
    None
}

/// The encoded position. Always exactly [`TOTAL_FEATURES`] long.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f32; TOTAL_FEATURES],
}

impl FeatureVector {
    pub fn zeroed() -> Self {
        Self { values: [0.0; TOTAL_FEATURES] }
    }

    /// Wrap externally produced values, e.g. from a training dump.
    pub fn from_slice(values: &[f32]) -> Result<Self, EvalError> {
        let values = values.try_into().map_err(|_| EvalError::InputLengthMismatch {
            expected: TOTAL_FEATURES,
            found: values.len(),
        })?;
        Ok(Self { values })
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// The contiguous slice belonging to `group`.
    #[inline]
    pub fn group(&self, group: FeatureGroup) -> &[f32] {
        &self.values[group.range()]
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// `(name, value)` pairs in index order.
    pub fn named(&self) -> impl Iterator<Item = (String, f32)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| feature_name(i).map(|name| (name, v)))
    }

    fn group_mut(&mut self, group: FeatureGroup) -> &mut [f32] {
        &mut self.values[group.range()]
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl Index<usize> for FeatureVector {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.values[index]
    }
}

/// Encode `pos`. Pure: the same position always gives the same bits.
pub fn extract<P: PositionQuery + ?Sized>(pos: &P) -> FeatureVector {
    let mut features = FeatureVector::zeroed();
    write_global(pos, features.group_mut(FeatureGroup::Global));
    write_pieces(pos, features.group_mut(FeatureGroup::Piece));
    write_squares(pos, features.group_mut(FeatureGroup::Square));
    write_pawns(pos, features.group_mut(FeatureGroup::Pawn));
    features
}

#[inline]
fn flag(b: bool) -> f32 {
    if b { 1.0 } else { 0.0 }
}

#[inline]
fn code(kind: Option<PieceKind>) -> f32 {
    kind.map_or(0.0, |k| f32::from(k.code()))
}

fn write_global<P: PositionQuery + ?Sized>(pos: &P, out: &mut [f32]) {
    out[0] = pos.side_to_move().index() as f32;

    let rights = Color::ALL
        .into_iter()
        .flat_map(|c| [(c, CastleSide::KingSide), (c, CastleSide::QueenSide)]);
    for (slot, (color, side)) in out[1..5].iter_mut().zip(rights) {
        *slot = flag(pos.can_castle(color, side));
    }

    let material = Color::ALL
        .into_iter()
        .flat_map(|c| COUNTED.into_iter().map(move |k| (c, k)));
    for (slot, (color, kind)) in out[5..].iter_mut().zip(material) {
        *slot = pos.count(color, kind) as f32;
    }
}

fn write_pieces<P: PositionQuery + ?Sized>(pos: &P, out: &mut [f32]) {
    for color in Color::ALL {
        if let Some(sq) = pos.king_square(color) {
            out[color.index() * 2] = f32::from(sq.rank());
            out[color.index() * 2 + 1] = f32::from(sq.file());
        }
    }

    for color in Color::ALL {
        let mut offset = KING_FIELDS + color.index() * SIDE_BLOCK;
        for (kind, slots) in ROSTER {
            let width = slot_width(kind);
            // Ascending square order; anything past the roster is dropped.
            let mut squares = pos.pieces_of(color, kind);
            for _ in 0..slots {
                if let Some(sq) = squares.next() {
                    write_slot(pos, color, kind, sq, &mut out[offset..offset + width]);
                }
                offset += width;
            }
        }
    }
}

fn write_slot<P: PositionQuery + ?Sized>(
    pos: &P,
    color: Color,
    kind: PieceKind,
    sq: Square,
    slot: &mut [f32],
) {
    slot[SlotField::Exists as usize] = 1.0;
    slot[SlotField::Rank as usize] = f32::from(sq.rank());
    slot[SlotField::File as usize] = f32::from(sq.file());
    slot[SlotField::MinDefender as usize] = code(pos.weakest_attacker(sq, color));
    slot[SlotField::MinAttacker as usize] = code(pos.weakest_attacker(sq, !color));
    if kind.is_slider() {
        slot[SlotField::Squares as usize] = pos.mobility(kind, color, sq) as f32;
    }
}

fn write_squares<P: PositionQuery + ?Sized>(pos: &P, out: &mut [f32]) {
    let us = pos.side_to_move();
    let (attacked, defended) = out.split_at_mut(Square::COUNT);
    for sq in Square::all() {
        attacked[sq.index()] = code(pos.weakest_attacker(sq, !us));
        defended[sq.index()] = code(pos.weakest_attacker(sq, us));
    }
}

fn write_pawns<P: PositionQuery + ?Sized>(pos: &P, out: &mut [f32]) {
    for color in Color::ALL {
        for file in 0..8u8 {
            out[color.index() * 8 + file as usize] = pos.pawns_on_file(color, file) as f32;
        }
    }
}
