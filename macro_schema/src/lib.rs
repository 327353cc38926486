use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Milliseconds = u32;

pub const PACKET_LEN: usize = 8;

/// Fixed 8-byte controller input report.
///
/// Layout: `[buttons_hi, buttons_lo, dpad, lx, ly, rx, ry, reserved]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Packet([u8; PACKET_LEN]);

impl Packet {
    pub const DPAD_NEUTRAL: u8 = 8;
    pub const STICK_CENTER: u8 = 128;

    pub const NEUTRAL: Packet = Packet([
        0,
        0,
        Self::DPAD_NEUTRAL,
        Self::STICK_CENTER,
        Self::STICK_CENTER,
        Self::STICK_CENTER,
        Self::STICK_CENTER,
        0,
    ]);

    pub const fn from_bytes(bytes: [u8; PACKET_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_parts(buttons: u16, dpad: u8, left: (u8, u8), right: (u8, u8)) -> Self {
        let [hi, lo] = buttons.to_be_bytes();
        Self([hi, lo, dpad, left.0, left.1, right.0, right.1, 0])
    }

    pub fn as_bytes(&self) -> &[u8; PACKET_LEN] {
        &self.0
    }

    pub fn buttons(&self) -> u16 {
        u16::from_be_bytes([self.0[0], self.0[1]])
    }

    pub fn dpad(&self) -> u8 {
        self.0[2]
    }

    pub fn left_stick(&self) -> (u8, u8) {
        (self.0[3], self.0[4])
    }

    pub fn right_stick(&self) -> (u8, u8) {
        (self.0[5], self.0[6])
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub timestamp_ms: Milliseconds,
    pub packet: Packet,
}

impl Frame {
    pub fn new(timestamp_ms: Milliseconds, packet: Packet) -> Self {
        Self {
            timestamp_ms,
            packet,
        }
    }

    pub fn neutral(timestamp_ms: Milliseconds) -> Self {
        Self::new(timestamp_ms, Packet::NEUTRAL)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("frame sequence is empty")]
    Empty,
    #[error("frame {index} goes back in time ({timestamp_ms}ms < {previous_ms}ms)")]
    OutOfOrder {
        index: usize,
        timestamp_ms: Milliseconds,
        previous_ms: Milliseconds,
    },
}

/// Non-empty, time-ordered frame sequence for one top-level macro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Frame>", into = "Vec<Frame>")]
pub struct CompiledMacro {
    frames: Vec<Frame>,
}

impl CompiledMacro {
    pub fn new(frames: Vec<Frame>) -> Result<Self, SequenceError> {
        if frames.is_empty() {
            return Err(SequenceError::Empty);
        }
        for (i, pair) in frames.windows(2).enumerate() {
            if pair[1].timestamp_ms < pair[0].timestamp_ms {
                return Err(SequenceError::OutOfOrder {
                    index: i + 1,
                    timestamp_ms: pair[1].timestamp_ms,
                    previous_ms: pair[0].timestamp_ms,
                });
            }
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Never true for a constructed sequence.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn total_duration_ms(&self) -> Milliseconds {
        self.last().timestamp_ms
    }

    pub fn last(&self) -> &Frame {
        // `new` guarantees at least one frame.
        &self.frames[self.frames.len() - 1]
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Frame the firmware player would be outputting `elapsed_ms` after start.
    ///
    /// A one-shot macro holds its last frame forever. A looped macro restarts
    /// from frame 0 once playback reaches the last frame's timestamp.
    pub fn frame_at(&self, elapsed_ms: Milliseconds, looped: bool) -> &Frame {
        let total = self.total_duration_ms();
        let t = if looped && total > 0 {
            elapsed_ms % total
        } else {
            elapsed_ms
        };
        let idx = self.frames.partition_point(|f| f.timestamp_ms <= t);
        &self.frames[idx.saturating_sub(1)]
    }
}

impl TryFrom<Vec<Frame>> for CompiledMacro {
    type Error = SequenceError;

    fn try_from(frames: Vec<Frame>) -> Result<Self, Self::Error> {
        Self::new(frames)
    }
}

impl From<CompiledMacro> for Vec<Frame> {
    fn from(m: CompiledMacro) -> Self {
        m.frames
    }
}

/// One record of the pre-DSL recording format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyFrame {
    #[serde(rename = "TimestampMs")]
    pub timestamp_ms: Milliseconds,
    #[serde(rename = "Packet")]
    pub packet: LegacyPacket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyPacket {
    Bytes(Vec<u8>),
    Base64(String),
}
