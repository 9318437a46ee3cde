//! Decoding of strobed external event words
//!
//! A strobed word is the 16-bit payload of an event on the strobed channel.
//! The low 15 bits hold the value presented on the digital input board; the
//! high bit records which DSP section the board sits on (0 for the first
//! section). The device service only sets the high bit when configured to,
//! so with a single strobed board it is normally 0.

use serde::{Deserialize, Serialize};

use crate::bit::BitOps;

const SECTION_BIT: usize = 15;
const VALUE_BITS: usize = 15;

/// A strobed word split into its value and section flag.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct DecodedWord {
    /// Low 15 bits of the payload
    pub value: u16,
    /// True if the word came from a board outside the first DSP section
    pub high_flag: bool,
    /// Device ticks
    pub timestamp: u64,
}

/// Decode a strobed payload. Every 16-bit input is valid.
pub fn decode(unit: u16, timestamp: u64) -> DecodedWord {
    DecodedWord {
        value: unit.low_bits(VALUE_BITS),
        high_flag: unit.check(SECTION_BIT),
        timestamp,
    }
}
