use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};

/// Lifecycle of one blind game.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Waiting = 0,
    Blind = 1,
    Reveal = 2,
    AnimatedReveal = 3,
    Live = 4,
    /// Reconciliation ended in checkmate; there is no live play.
    Complete = 5,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Waiting => "waiting",
            GamePhase::Blind => "blind",
            GamePhase::Reveal => "reveal",
            GamePhase::AnimatedReveal => "animated_reveal",
            GamePhase::Live => "live",
            GamePhase::Complete => "complete",
        }
    }

    /// True once reconciliation has run.
    pub fn is_revealed(&self) -> bool {
        !matches!(self, GamePhase::Waiting | GamePhase::Blind)
    }
}

impl TryFrom<u8> for GamePhase {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GamePhase::Waiting),
            1 => Ok(GamePhase::Blind),
            2 => Ok(GamePhase::Reveal),
            3 => Ok(GamePhase::AnimatedReveal),
            4 => Ok(GamePhase::Live),
            5 => Ok(GamePhase::Complete),
            _ => Err(()),
        }
    }
}

impl Write for GamePhase {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for GamePhase {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        GamePhase::try_from(value).map_err(|_| Error::InvalidEnum(value))
    }
}

impl EncodeSize for GamePhase {
    fn encode_size(&self) -> usize {
        u8::SIZE
    }
}
