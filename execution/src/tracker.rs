//! Per-player piece identity and quota tracking.
//!
//! A piece is identified by where it was first seen. The tracker keys identities by the
//! square the piece currently stands on and re-keys on every move, so the same physical
//! piece keeps one identity across hops while two different pieces never share one.

use std::collections::BTreeMap;

use blindchess_types::{Piece, PieceIdentity, PieceKind, Square};

/// One move attributed to a tracked identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackedMove {
    pub identity: PieceIdentity,
    pub from: Square,
    pub to: Square,
    pub move_number: u8,
}

#[derive(Clone, Debug)]
pub struct PieceMoveTracker {
    max_moves_per_piece: u8,
    // current square -> identity of the piece standing there
    identities: BTreeMap<Square, PieceIdentity>,
    counts: BTreeMap<PieceIdentity, u8>,
    history: Vec<TrackedMove>,
}

impl PieceMoveTracker {
    pub fn new(max_moves_per_piece: u8) -> Self {
        Self {
            max_moves_per_piece,
            identities: BTreeMap::new(),
            counts: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    pub fn max_moves_per_piece(&self) -> u8 {
        self.max_moves_per_piece
    }

    /// Identity of `piece` standing on `square`. A square seen for the first time is
    /// treated as the piece's origin.
    pub fn resolve(&self, piece: Piece, square: Square) -> PieceIdentity {
        self.identities
            .get(&square)
            .copied()
            .unwrap_or_else(|| PieceIdentity::first_seen(piece, square))
    }

    /// Moves recorded so far for `identity`.
    pub fn moves_of(&self, identity: &PieceIdentity) -> u8 {
        self.counts.get(identity).copied().unwrap_or(0)
    }

    /// False once the piece on `square` has used its quota.
    pub fn can_move(&self, piece: Piece, square: Square) -> bool {
        self.moves_of(&self.resolve(piece, square)) < self.max_moves_per_piece
    }

    /// Attribute `from -> to` to the piece that stood on `from` before the move.
    pub fn record_move(
        &mut self,
        piece: Piece,
        from: Square,
        to: Square,
        move_number: u8,
    ) -> PieceIdentity {
        let identity = self
            .identities
            .remove(&from)
            .unwrap_or_else(|| PieceIdentity::first_seen(piece, from));
        self.identities.insert(to, identity);
        *self.counts.entry(identity).or_insert(0) += 1;
        self.history.push(TrackedMove {
            identity,
            from,
            to,
            move_number,
        });

        // Castling also relocates the rook; follow it without charging it a move.
        if piece.kind == PieceKind::King && from.file().abs_diff(to.file()) == 2 {
            let rank = from.rank();
            let (rook_from, rook_to) = if to.file() > from.file() {
                (Square::from_coords(7, rank), Square::from_coords(5, rank))
            } else {
                (Square::from_coords(0, rank), Square::from_coords(3, rank))
            };
            if let (Some(rook_from), Some(rook_to)) = (rook_from, rook_to) {
                let rook = Piece::new(piece.color, PieceKind::Rook);
                let rook_identity = self
                    .identities
                    .remove(&rook_from)
                    .unwrap_or_else(|| PieceIdentity::first_seen(rook, rook_from));
                self.identities.insert(rook_to, rook_identity);
            }
        }

        identity
    }

    pub fn total_moves(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &[TrackedMove] {
        &self.history
    }

    pub fn reset(&mut self) {
        self.identities.clear();
        self.counts.clear();
        self.history.clear();
    }
}
