//! Legality oracle seam.
//!
//! The engine never implements chess rules itself. Everything it needs from a rules engine
//! (applying a move, side to move, checkmate detection, portable positions and SAN labels) goes
//! through [`LegalityOracle`]. [`ShakmatyOracle`] is the production implementation.

use blindchess_types::{Color, Piece, PieceKind, Square};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{
    attacks, Board, CastlingMode, Chess, EnPassantMode, File, FromSetup, Move, Position, Role,
};
use thiserror::Error;

/// Promotion applied to every pawn that reaches the last rank.
pub const DEFAULT_PROMOTION: PieceKind = PieceKind::Queen;

/// The oracle could not provide a usable position. Nothing in the engine can run without it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("legality oracle unavailable: {0}")]
    Unavailable(String),
}

pub trait LegalityOracle {
    type Position: Clone;
    type Move;

    /// Standard starting position.
    fn starting_position(&self) -> Result<Self::Position, OracleError>;

    /// Apply `from -> to` if legal. On refusal the position is left untouched.
    fn apply_move(
        &self,
        position: &mut Self::Position,
        from: Square,
        to: Square,
        promotion: PieceKind,
    ) -> Option<Self::Move>;

    fn side_to_move(&self, position: &Self::Position) -> Color;

    /// Copy of `position` with `color` to move, or `None` if that position would be invalid
    /// (for example, the side not to move would be in check).
    fn with_side_to_move(&self, position: &Self::Position, color: Color) -> Option<Self::Position>;

    /// Apply `from -> to` for `mover` whoever is to move, handing the turn over first. Must
    /// accept every move that is legal for `mover` on this board, including while the other
    /// king stands in check. On success the other side is to move; on refusal the position
    /// is left untouched.
    fn apply_move_as(
        &self,
        position: &mut Self::Position,
        mover: Color,
        from: Square,
        to: Square,
        promotion: PieceKind,
    ) -> Option<Self::Move>;

    fn is_checkmate(&self, position: &Self::Position) -> bool;

    fn piece_at(&self, position: &Self::Position, square: Square) -> Option<Piece>;

    fn to_portable_position(&self, position: &Self::Position) -> String;

    fn to_algebraic_label(&self, mv: &Self::Move) -> String;

    fn is_capture(&self, mv: &Self::Move) -> bool;
}

/// Standard chess rules backed by `shakmaty`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShakmatyOracle;

/// A move accepted by [`ShakmatyOracle`], labelled against the position it was played from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShakmatyMove {
    label: String,
    capture: bool,
}

fn to_square(square: Square) -> shakmaty::Square {
    shakmaty::Square::new(u32::from(square.index()))
}

fn to_color(color: Color) -> shakmaty::Color {
    match color {
        Color::White => shakmaty::Color::White,
        Color::Black => shakmaty::Color::Black,
    }
}

fn from_color(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

fn to_role(kind: PieceKind) -> Role {
    match kind {
        PieceKind::Pawn => Role::Pawn,
        PieceKind::Knight => Role::Knight,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Rook => Role::Rook,
        PieceKind::Queen => Role::Queen,
        PieceKind::King => Role::King,
    }
}

fn from_role(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

/// Square the moving piece lands on. Castling is encoded king-takes-rook internally, so map
/// it back to the king's destination (g- or c-file).
fn destination(mv: &Move) -> shakmaty::Square {
    match *mv {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            shakmaty::Square::from_coords(file, king.rank())
        }
        _ => mv.to(),
    }
}

fn pawn_reaches(board: &Board, mover: shakmaty::Color, from: Square, to: Square, capture: bool) -> bool {
    let (forward, home) = match mover {
        shakmaty::Color::White => (1i8, 1u8),
        shakmaty::Color::Black => (-1i8, 6u8),
    };
    let files = to.file() as i8 - from.file() as i8;
    let ranks = to.rank() as i8 - from.rank() as i8;
    if capture {
        return files.abs() == 1 && ranks == forward;
    }
    if files != 0 {
        return false;
    }
    if ranks == forward {
        return true;
    }
    ranks == 2 * forward
        && from.rank() == home
        && Square::from_coords(from.file(), (from.rank() as i8 + forward) as u8)
            .is_some_and(|middle| board.piece_at(to_square(middle)).is_none())
}

/// SAN-style label for a move played by [`play_over_check`], where `shakmaty` has no
/// position to derive it from. The check mark describes the position after the move.
fn over_check_label(
    board: &Board,
    piece: shakmaty::Piece,
    from: shakmaty::Square,
    to: shakmaty::Square,
    capture: bool,
    promotion: Option<Role>,
    after: &Chess,
) -> String {
    let mut label = String::new();
    if piece.role == Role::Pawn {
        if capture {
            label.push(from.file().char());
            label.push('x');
        }
        label.push_str(&to.to_string());
        if let Some(role) = promotion {
            label.push('=');
            label.push(role.upper_char());
        }
    } else {
        label.push(piece.role.upper_char());
        let rivals: Vec<shakmaty::Square> = (board.by_role(piece.role) & board.by_color(piece.color))
            .into_iter()
            .filter(|&sq| sq != from && attacks::attacks(sq, piece, board.occupied()).contains(to))
            .collect();
        if !rivals.is_empty() {
            if rivals.iter().all(|sq| sq.file() != from.file()) {
                label.push(from.file().char());
            } else if rivals.iter().all(|sq| sq.rank() != from.rank()) {
                label.push(from.rank().char());
            } else {
                label.push_str(&from.to_string());
            }
        }
        if capture {
            label.push('x');
        }
        label.push_str(&to.to_string());
    }
    if after.is_checkmate() {
        label.push('#');
    } else if after.is_check() {
        label.push('+');
    }
    label
}

/// Play `from -> to` for `mover` while the other king stands in check. `shakmaty` refuses
/// to hand the move over in that position, so the move is checked against the board
/// directly: the piece must reach the square and the mover's own king must be safe
/// afterwards. Kings are never captured. Castling and en passant are unavailable here.
fn play_over_check(
    position: &Chess,
    mover: shakmaty::Color,
    from: Square,
    to: Square,
    promotion: Role,
) -> Option<(Chess, ShakmatyMove)> {
    let board = position.board();
    let (from_sq, to_sq) = (to_square(from), to_square(to));
    let piece = board.piece_at(from_sq).filter(|piece| piece.color == mover)?;
    let captured = board.piece_at(to_sq);
    if captured.is_some_and(|target| target.color == mover || target.role == Role::King) {
        return None;
    }
    let capture = captured.is_some();
    let reaches = match piece.role {
        Role::Pawn => pawn_reaches(board, mover, from, to, capture),
        _ => attacks::attacks(from_sq, piece, board.occupied()).contains(to_sq),
    };
    if !reaches {
        return None;
    }
    let last_rank = match mover {
        shakmaty::Color::White => 7,
        shakmaty::Color::Black => 0,
    };
    let promoted = (piece.role == Role::Pawn && to.rank() == last_rank).then_some(promotion);

    let mut after = board.clone();
    after.discard_piece_at(from_sq);
    after.set_piece_at(
        to_sq,
        shakmaty::Piece {
            color: mover,
            role: promoted.unwrap_or(piece.role),
        },
    );
    let king = after.king_of(mover)?;
    if after.attacks_to(king, !mover, after.occupied()).any() {
        return None;
    }

    let mut setup = position.clone().into_setup(EnPassantMode::Legal);
    setup.board = after;
    setup.turn = !mover;
    setup.ep_square = None;
    setup.castling_rights.discard(from_sq);
    setup.castling_rights.discard(to_sq);
    setup.halfmoves = if piece.role == Role::Pawn || capture {
        0
    } else {
        setup.halfmoves.saturating_add(1)
    };
    if mover == shakmaty::Color::Black {
        setup.fullmoves = setup.fullmoves.saturating_add(1);
    }
    let next = Chess::from_setup(setup, CastlingMode::Standard)
        .or_else(|err| err.ignore_invalid_castling_rights())
        .or_else(|err| err.ignore_impossible_check())
        .ok()?;
    let label = over_check_label(board, piece, from_sq, to_sq, capture, promoted, &next);
    Some((next, ShakmatyMove { label, capture }))
}

impl LegalityOracle for ShakmatyOracle {
    type Position = Chess;
    type Move = ShakmatyMove;

    fn starting_position(&self) -> Result<Chess, OracleError> {
        Ok(Chess::default())
    }

    fn apply_move(
        &self,
        position: &mut Chess,
        from: Square,
        to: Square,
        promotion: PieceKind,
    ) -> Option<ShakmatyMove> {
        let from = to_square(from);
        let to = to_square(to);
        let promotion = to_role(promotion);
        let mv = position
            .legal_moves()
            .iter()
            .find(|m| {
                m.from() == Some(from)
                    && destination(m) == to
                    && m.promotion().map_or(true, |role| role == promotion)
            })
            .cloned()?;
        let capture = mv.is_capture();
        let label = SanPlus::from_move_and_play_unchecked(position, &mv).to_string();
        Some(ShakmatyMove { label, capture })
    }

    fn side_to_move(&self, position: &Chess) -> Color {
        from_color(position.turn())
    }

    fn with_side_to_move(&self, position: &Chess, color: Color) -> Option<Chess> {
        let turn = to_color(color);
        if position.turn() == turn {
            return Some(position.clone());
        }
        let mut setup = position.clone().into_setup(EnPassantMode::Legal);
        setup.turn = turn;
        setup.ep_square = None;
        Chess::from_setup(setup, CastlingMode::Standard).ok()
    }

    fn apply_move_as(
        &self,
        position: &mut Chess,
        mover: Color,
        from: Square,
        to: Square,
        promotion: PieceKind,
    ) -> Option<ShakmatyMove> {
        if position.turn() == to_color(mover) {
            return self.apply_move(position, from, to, promotion);
        }
        if let Some(mut flipped) = self.with_side_to_move(position, mover) {
            let mv = self.apply_move(&mut flipped, from, to, promotion)?;
            *position = flipped;
            return Some(mv);
        }
        let (next, mv) = play_over_check(position, to_color(mover), from, to, to_role(promotion))?;
        *position = next;
        Some(mv)
    }

    fn is_checkmate(&self, position: &Chess) -> bool {
        position.is_checkmate()
    }

    fn piece_at(&self, position: &Chess, square: Square) -> Option<Piece> {
        position
            .board()
            .piece_at(to_square(square))
            .map(|piece| Piece::new(from_color(piece.color), from_role(piece.role)))
    }

    fn to_portable_position(&self, position: &Chess) -> String {
        Fen::from_position(position.clone(), EnPassantMode::Legal).to_string()
    }

    fn to_algebraic_label(&self, mv: &ShakmatyMove) -> String {
        mv.label.clone()
    }

    fn is_capture(&self, mv: &ShakmatyMove) -> bool {
        mv.capture
    }
}
