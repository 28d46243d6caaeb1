use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use serde::{Deserialize, Serialize};

use super::{
    read_string, string_encode_size, write_string, Color, MAX_LABEL_LENGTH, MAX_MOVE_LOG_LENGTH,
    MAX_POSITION_LENGTH,
};

/// One entry of the reconciled timeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLogItem {
    /// 1-based position in the log.
    pub ply: u16,
    pub player: Color,
    /// SAN for accepted moves, `from-to` for refused ones.
    pub label: String,
    #[serde(rename = "isInvalid")]
    pub is_invalid: bool,
    #[serde(rename = "isCapture")]
    pub is_capture: bool,
    /// The move was applied out of natural turn order.
    #[serde(rename = "isForced")]
    pub is_forced: bool,
    /// Portable position after this entry, for playback.
    #[serde(rename = "positionAfter")]
    pub position_after: String,
}

impl Write for MoveLogItem {
    fn write(&self, writer: &mut impl BufMut) {
        self.ply.write(writer);
        self.player.write(writer);
        write_string(&self.label, writer);
        self.is_invalid.write(writer);
        self.is_capture.write(writer);
        self.is_forced.write(writer);
        write_string(&self.position_after, writer);
    }
}

impl Read for MoveLogItem {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            ply: u16::read(reader)?,
            player: Color::read(reader)?,
            label: read_string(reader, MAX_LABEL_LENGTH)?,
            is_invalid: bool::read(reader)?,
            is_capture: bool::read(reader)?,
            is_forced: bool::read(reader)?,
            position_after: read_string(reader, MAX_POSITION_LENGTH)?,
        })
    }
}

impl EncodeSize for MoveLogItem {
    fn encode_size(&self) -> usize {
        self.ply.encode_size()
            + self.player.encode_size()
            + string_encode_size(&self.label)
            + self.is_invalid.encode_size()
            + self.is_capture.encode_size()
            + self.is_forced.encode_size()
            + string_encode_size(&self.position_after)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkmate {
    pub winner: Color,
}

impl Write for Checkmate {
    fn write(&self, writer: &mut impl BufMut) {
        self.winner.write(writer);
    }
}

impl Read for Checkmate {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            winner: Color::read(reader)?,
        })
    }
}

impl EncodeSize for Checkmate {
    fn encode_size(&self) -> usize {
        self.winner.encode_size()
    }
}

/// The triple handed to the economy ledger once per game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    #[serde(rename = "whiteReward")]
    pub white_reward: u64,
    #[serde(rename = "blackReward")]
    pub black_reward: u64,
    #[serde(rename = "remainingPot")]
    pub remaining_pot: u64,
    pub commission: u64,
}

/// Output of reconciling both blind sequences. Computed once per game, immutable after.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    #[serde(rename = "finalPosition")]
    pub final_position: String,
    #[serde(rename = "moveLog")]
    pub move_log: Vec<MoveLogItem>,
    #[serde(rename = "whiteReward")]
    pub white_reward: u64,
    #[serde(rename = "blackReward")]
    pub black_reward: u64,
    #[serde(rename = "remainingPot")]
    pub remaining_pot: u64,
    pub commission: u64,
    #[serde(rename = "totalPot")]
    pub total_pot: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkmate: Option<Checkmate>,
}

impl ReconciliationResult {
    pub fn reward_for(&self, color: Color) -> u64 {
        match color {
            Color::White => self.white_reward,
            Color::Black => self.black_reward,
        }
    }

    pub fn settlement(&self) -> Settlement {
        Settlement {
            white_reward: self.white_reward,
            black_reward: self.black_reward,
            remaining_pot: self.remaining_pot,
            commission: self.commission,
        }
    }

    /// Number of log entries contributed by `color`.
    pub fn moves_by(&self, color: Color) -> usize {
        self.move_log.iter().filter(|m| m.player == color).count()
    }
}

impl Write for ReconciliationResult {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.final_position, writer);
        self.move_log.write(writer);
        self.white_reward.write(writer);
        self.black_reward.write(writer);
        self.remaining_pot.write(writer);
        self.commission.write(writer);
        self.total_pot.write(writer);
        self.checkmate.write(writer);
    }
}

impl Read for ReconciliationResult {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let final_position = read_string(reader, MAX_POSITION_LENGTH)?;
        let move_log = Vec::<MoveLogItem>::read_range(reader, 0..=MAX_MOVE_LOG_LENGTH)?;
        let white_reward = u64::read(reader)?;
        let black_reward = u64::read(reader)?;
        let remaining_pot = u64::read(reader)?;
        let commission = u64::read(reader)?;
        let total_pot = u64::read(reader)?;
        let checkmate = Option::<Checkmate>::read(reader)?;

        Ok(Self {
            final_position,
            move_log,
            white_reward,
            black_reward,
            remaining_pot,
            commission,
            total_pot,
            checkmate,
        })
    }
}

impl EncodeSize for ReconciliationResult {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.final_position)
            + self.move_log.encode_size()
            + self.white_reward.encode_size()
            + self.black_reward.encode_size()
            + self.remaining_pot.encode_size()
            + self.commission.encode_size()
            + self.total_pot.encode_size()
            + self.checkmate.encode_size()
    }
}
