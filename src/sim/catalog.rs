//! Piece catalog
//!
//! The seven tetrominoes, their shape matrices, and color resolution against the
//! player's equipped skin.

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::account::AccountFacade;
use crate::shop::{self, CosmeticKind, DEFAULT_ITEM};

/// Packed 0xRRGGBB color tag stored in board cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    /// Grey used when no skin applies
    pub const NEUTRAL: Color = Color(0x888888);

    /// CSS hex form, e.g. `#00f0f0`
    pub fn to_css(self) -> String {
        format!("#{:06x}", self.0 & 0xFF_FFFF)
    }
}

/// Rectangular occupancy matrix, indexed `[row][col]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape(Vec<Vec<bool>>);

impl Shape {
    /// Build from rows of 0/1. Panics on ragged input (catalog data is static).
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let width = rows.first().map_or(0, |r| r.len());
        assert!(
            rows.iter().all(|r| r.len() == width),
            "shape rows must have equal width"
        );
        Self(
            rows.iter()
                .map(|r| r.iter().map(|&c| c != 0).collect())
                .collect(),
        )
    }

    pub fn height(&self) -> usize {
        self.0.len()
    }

    pub fn width(&self) -> usize {
        self.0.first().map_or(0, Vec::len)
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.0
    }

    /// Offsets `(x = col, y = row)` of occupied sub-cells
    pub fn offsets(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.0.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(c, _)| IVec2::new(c as i32, r as i32))
        })
    }

    pub fn cell_count(&self) -> usize {
        self.0.iter().flatten().filter(|c| **c).count()
    }

    /// Clockwise quarter turn: transpose, then reverse each new row
    pub fn rotated(&self) -> Self {
        let (h, w) = (self.height(), self.width());
        Self(
            (0..w)
                .map(|c| (0..h).rev().map(|r| self.0[r][c]).collect())
                .collect(),
        )
    }
}

/// The seven canonical tetrominoes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Fresh copy of the spawn orientation
    pub fn shape(self) -> Shape {
        match self {
            PieceKind::I => Shape::from_rows(&[&[1, 1, 1, 1]]),
            PieceKind::O => Shape::from_rows(&[&[1, 1], &[1, 1]]),
            PieceKind::T => Shape::from_rows(&[&[0, 1, 0], &[1, 1, 1]]),
            PieceKind::S => Shape::from_rows(&[&[0, 1, 1], &[1, 1, 0]]),
            PieceKind::Z => Shape::from_rows(&[&[1, 1, 0], &[0, 1, 1]]),
            PieceKind::J => Shape::from_rows(&[&[1, 0, 0], &[1, 1, 1]]),
            PieceKind::L => Shape::from_rows(&[&[0, 0, 1], &[1, 1, 1]]),
        }
    }

    /// Canonical guideline color (skins override it for display)
    pub fn base_color(self) -> Color {
        match self {
            PieceKind::I => Color(0x00F0F0),
            PieceKind::O => Color(0xF0F000),
            PieceKind::T => Color(0xA000F0),
            PieceKind::S => Color(0x00F000),
            PieceKind::Z => Color(0xF00000),
            PieceKind::J => Color(0x0000F0),
            PieceKind::L => Color(0xF0A000),
        }
    }
}

/// A piece instance: owned shape, display color, and board-relative anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub color: Color,
    /// Top-left anchor (x = column, y = row)
    pub pos: IVec2,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            color,
            pos: IVec2::ZERO,
        }
    }

    /// Board coordinates of occupied sub-cells
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.shape.offsets().map(move |o| self.pos + o)
    }

    pub fn with_pos(mut self, pos: IVec2) -> Self {
        self.pos = pos;
        self
    }
}

/// Color pieces take for the given account
///
/// The equipped skin applies only if it is owned and is not the default skin.
pub fn resolve_color<A: AccountFacade + ?Sized>(account: &A) -> Color {
    match account.equipped_cosmetic(CosmeticKind::Skin) {
        Some(id) if id != DEFAULT_ITEM && account.is_owned(CosmeticKind::Skin, id) => {
            shop::skin_color(id)
        }
        _ => Color::NEUTRAL,
    }
}

/// Draw a piece uniformly from the catalog
pub fn random_piece<R, A>(rng: &mut R, account: &A) -> Piece
where
    R: Rng + ?Sized,
    A: AccountFacade + ?Sized,
{
    let kind = PieceKind::ALL[rng.random_range(0..PieceKind::ALL.len())];
    Piece::new(kind, resolve_color(account))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountBook, Guest};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_every_shape_is_a_tetromino() {
        for kind in PieceKind::ALL {
            let shape = kind.shape();
            assert_eq!(shape.cell_count(), 4, "{kind:?}");
            assert!(shape.rows().iter().all(|r| r.len() == shape.width()));
        }
    }

    #[test]
    fn test_rotation_is_clockwise() {
        let t = PieceKind::T.shape().rotated();
        let expected = Shape::from_rows(&[&[1, 0], &[1, 1], &[1, 0]]);
        assert_eq!(t, expected);

        let i = PieceKind::I.shape().rotated();
        assert_eq!((i.width(), i.height()), (1, 4));
    }

    #[test]
    fn test_full_turn_restores_shape() {
        for kind in PieceKind::ALL {
            let shape = kind.shape();
            let turned = shape.rotated().rotated().rotated().rotated();
            assert_eq!(turned, shape, "{kind:?}");
        }
    }

    #[test]
    fn test_pieces_never_alias_catalog() {
        let mut piece = Piece::new(PieceKind::L, Color::NEUTRAL);
        piece.shape = piece.shape.rotated();
        assert_eq!(PieceKind::L.shape(), Shape::from_rows(&[&[0, 0, 1], &[1, 1, 1]]));
    }

    #[test]
    fn test_cells_are_offset_by_anchor() {
        let piece = Piece::new(PieceKind::O, Color::NEUTRAL).with_pos(IVec2::new(3, 5));
        let cells: Vec<_> = piece.cells().collect();
        assert_eq!(
            cells,
            vec![
                IVec2::new(3, 5),
                IVec2::new(4, 5),
                IVec2::new(3, 6),
                IVec2::new(4, 6)
            ]
        );
    }

    #[test]
    fn test_guest_gets_neutral_color() {
        let mut rng = Pcg32::seed_from_u64(1);
        let piece = random_piece(&mut rng, &Guest);
        assert_eq!(piece.color, Color::NEUTRAL);
        assert_eq!(piece.pos, IVec2::ZERO);
    }

    #[test]
    fn test_owned_skin_colors_pieces() {
        let mut book = AccountBook::new();
        book.create_account("ana", "1234").unwrap();
        book.login("ana", "1234").unwrap();
        book.report_xp(xp_for_level(5));
        book.buy(CosmeticKind::Skin, 1).unwrap();

        // Owned but not equipped yet
        assert_eq!(resolve_color(&book), Color::NEUTRAL);

        book.equip(CosmeticKind::Skin, 1).unwrap();
        assert_eq!(resolve_color(&book), shop::skin_color(1));
    }

    fn xp_for_level(level: u32) -> u64 {
        crate::progression::xp_required_for_level(level)
    }

    #[test]
    fn test_draws_cover_catalog() {
        let mut rng = Pcg32::seed_from_u64(99);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(random_piece(&mut rng, &Guest).kind);
        }
        assert_eq!(seen.len(), PieceKind::ALL.len());
    }

    #[test]
    fn test_css_color() {
        assert_eq!(Color(0x00F0F0).to_css(), "#00f0f0");
        assert_eq!(Color::NEUTRAL.to_css(), "#888888");
        assert_eq!(PieceKind::L.base_color().to_css(), "#f0a000");
    }
}
