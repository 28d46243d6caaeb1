use std::fmt;
use std::ops::Not;
use std::str::FromStr;

use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum SquareParseError {
    #[error("square must be two characters (got {0:?})")]
    Length(String),
    #[error("file out of range a-h (got {0:?})")]
    File(char),
    #[error("rank out of range 1-8 (got {0:?})")]
    Rank(char),
}

/// A board square, indexed `a1 = 0 .. h8 = 63` (rank-major).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square(u8);

impl Square {
    pub const COUNT: u8 = 64;

    pub fn new(index: u8) -> Option<Self> {
        (index < Self::COUNT).then_some(Self(index))
    }

    pub fn from_coords(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Self(rank * 8 + file))
        } else {
            None
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// File, 0 = a.
    pub fn file(self) -> u8 {
        self.0 % 8
    }

    /// Rank, 0 = first rank.
    pub fn rank(self) -> u8 {
        self.0 / 8
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.file()) as char,
            (b'1' + self.rank()) as char
        )
    }
}

impl FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(SquareParseError::Length(s.to_string()));
        };
        let file_idx = match file.to_ascii_lowercase() {
            c @ 'a'..='h' => c as u8 - b'a',
            _ => return Err(SquareParseError::File(file)),
        };
        let rank_idx = match rank {
            c @ '1'..='8' => c as u8 - b'1',
            _ => return Err(SquareParseError::Rank(rank)),
        };
        Ok(Self(rank_idx * 8 + file_idx))
    }
}

impl TryFrom<String> for Square {
    type Error = SquareParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(value: Square) -> Self {
        value.to_string()
    }
}

impl Write for Square {
    fn write(&self, writer: &mut impl BufMut) {
        self.0.write(writer);
    }
}

impl Read for Square {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        Square::new(value).ok_or(Error::Invalid("Square", "index out of range"))
    }
}

impl EncodeSize for Square {
    fn encode_size(&self) -> usize {
        u8::SIZE
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    /// Seat index (white = 0, black = 1).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

impl Not for Color {
    type Output = Color;

    fn not(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for Color {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Color::White),
            1 => Ok(Color::Black),
            _ => Err(()),
        }
    }
}

impl Write for Color {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Color {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        Color::try_from(value).map_err(|_| Error::InvalidEnum(value))
    }
}

impl EncodeSize for Color {
    fn encode_size(&self) -> usize {
        u8::SIZE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }
}

/// Identity of one physical piece: colour, type at first sighting, and origin square.
///
/// The identity is stable across moves of the same piece, so a knight that travels
/// b1 -> c3 -> e4 is `white-knight-b1` throughout. A pawn keeps its pawn identity
/// after promotion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceIdentity {
    pub color: Color,
    pub kind: PieceKind,
    pub origin: Square,
}

impl PieceIdentity {
    /// Identity of a piece first seen on `origin`.
    pub fn first_seen(piece: Piece, origin: Square) -> Self {
        Self {
            color: piece.color,
            kind: piece.kind,
            origin,
        }
    }
}

impl fmt::Display for PieceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.color, self.kind.as_str(), self.origin)
    }
}

/// A queued blind move: squares only, the mover is resolved against the board at
/// submission time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlindMove {
    pub from: Square,
    pub to: Square,
}

impl BlindMove {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }

    /// Parse a move from two square names, e.g. `("e2", "e4")`.
    pub fn parse(from: &str, to: &str) -> Result<Self, SquareParseError> {
        Ok(Self {
            from: from.parse()?,
            to: to.parse()?,
        })
    }

    /// Coordinate label used for moves the legality oracle refused.
    pub fn label(&self) -> String {
        format!("{}-{}", self.from, self.to)
    }
}

impl fmt::Display for BlindMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

impl Write for BlindMove {
    fn write(&self, writer: &mut impl BufMut) {
        self.from.write(writer);
        self.to.write(writer);
    }
}

impl Read for BlindMove {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            from: Square::read(reader)?,
            to: Square::read(reader)?,
        })
    }
}

impl EncodeSize for BlindMove {
    fn encode_size(&self) -> usize {
        self.from.encode_size() + self.to.encode_size()
    }
}

/// An accepted blind move, immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub from: Square,
    pub to: Square,
    #[serde(rename = "san")]
    pub san_label: String,
    #[serde(rename = "moveNumber")]
    pub move_number: u8,
}
