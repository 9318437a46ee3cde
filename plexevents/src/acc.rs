//! Timing-windowed accumulation of strobed words into composite packets
//!
//! An external tracker emits each position update as a quick burst of
//! strobed words. Nothing in the stream marks where one burst ends, so the
//! accumulator infers packet boundaries from inter-arrival time: a word that
//! arrives within `acceptable_delay` ticks of the last admitted word joins the
//! packet in progress, and a later word closes it.
//!
//! ```text
//!            admit                 admit (delay <= acceptable)
//!   Empty ----------> Accumulating ---------------------------> Accumulating/Ready
//!     ^                    |  delay > acceptable                      |
//!     |                    v                                          |
//!     +---- reset <-- [flush if mode known] <-------------------------+
//!            and admit the rejected word
//! ```
//!
//! Staleness is only noticed when the next word arrives (or the stream ends);
//! there is no independent timer.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::strobe::DecodedWord;

/// Classifies the words of an in-progress packet.
///
/// The byte-level layout of a packet belongs to the tracking system; the
/// accumulator only needs to know whether the admitted words form something
/// decodable yet.
pub trait PacketDecoder {
    type Mode: Copy + Eq + Debug;

    /// Mode of the packet formed by `words`, or `None` while still unknown
    fn classify(&self, words: &[DecodedWord]) -> Option<Self::Mode>;
}

/// Decoder for packets of a fixed number of words: the mode is known as soon
/// as that many words have been admitted.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct FixedLength {
    pub words: usize,
}

impl PacketDecoder for FixedLength {
    type Mode = usize;

    fn classify(&self, words: &[DecodedWord]) -> Option<usize> {
        if words.len() >= self.words {
            Some(self.words)
        } else {
            None
        }
    }
}

/// A packet emitted by the accumulator
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct CompositePacket<M> {
    pub mode: M,
    pub words: Vec<DecodedWord>,
}

impl<M> CompositePacket<M> {
    /// Timestamp of the first word, in ticks
    pub fn start(&self) -> u64 {
        self.words.first().map(|w| w.timestamp).unwrap_or_default()
    }

    /// Timestamp of the last word, in ticks
    pub fn end(&self) -> u64 {
        self.words.last().map(|w| w.timestamp).unwrap_or_default()
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum AccState {
    /// No words admitted
    Empty,
    /// Words admitted, mode still unknown
    Accumulating,
    /// Words admitted and classified
    Ready,
}

/// Result of offering one word to the accumulator
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Admission<M> {
    /// The word joined the packet in progress (or started a new one)
    Accepted,
    /// The word arrived too late; the previous packet was closed and the word
    /// now starts the next one
    Rejected {
        /// The previous packet, if its mode was known
        flushed: Option<CompositePacket<M>>,
        /// Words dropped because the previous packet was never classified
        discarded: usize,
    },
}

pub struct Accumulator<D: PacketDecoder> {
    decoder: D,
    acceptable_delay: u64,
    words: Vec<DecodedWord>,
    mode: Option<D::Mode>,
    last_admitted: Option<u64>,
}

impl<D: PacketDecoder> Accumulator<D> {
    pub fn new(decoder: D, acceptable_delay: u64) -> Self {
        Accumulator {
            decoder,
            acceptable_delay,
            words: Vec::new(),
            mode: None,
            last_admitted: None,
        }
    }

    pub fn acceptable_delay(&self) -> u64 {
        self.acceptable_delay
    }

    pub fn mode(&self) -> Option<D::Mode> {
        self.mode
    }

    pub fn words(&self) -> &[DecodedWord] {
        &self.words
    }

    pub fn state(&self) -> AccState {
        match (self.words.is_empty(), self.mode) {
            (true, _) => AccState::Empty,
            (false, None) => AccState::Accumulating,
            (false, Some(_)) => AccState::Ready,
        }
    }

    /// Admit `word` if it belongs to the packet in progress. An empty
    /// accumulator always admits. Returns false, leaving the state untouched,
    /// when the word arrives more than `acceptable_delay` ticks after the
    /// last admitted one.
    pub fn accept(&mut self, word: DecodedWord) -> bool {
        if let Some(last) = self.last_admitted {
            let delay = word.timestamp.saturating_sub(last);
            if delay > self.acceptable_delay {
                return false;
            }
        }
        self.words.push(word);
        self.last_admitted = Some(word.timestamp);
        // Unknown packets are reconsidered with every new word
        self.mode = self.decoder.classify(&self.words);
        true
    }

    /// Reset to the empty state
    pub fn clear(&mut self) {
        self.words.clear();
        self.mode = None;
        self.last_admitted = None;
    }

    /// Offer the next strobed word, closing the packet in progress if the
    /// word is too late to belong to it. A rejected word is never lost: it
    /// seeds the next packet.
    pub fn push(&mut self, word: DecodedWord) -> Admission<D::Mode> {
        if self.accept(word) {
            return Admission::Accepted;
        }
        let (flushed, discarded) = match self.take() {
            Some(packet) => (Some(packet), 0),
            None => (None, self.words.len()),
        };
        self.clear();
        self.accept(word);
        Admission::Rejected { flushed, discarded }
    }

    /// Take the packet in progress if its mode is known, leaving the
    /// accumulator empty. An unclassified packet is left in place.
    pub fn take(&mut self) -> Option<CompositePacket<D::Mode>> {
        let mode = self.mode?;
        let words = std::mem::take(&mut self.words);
        self.clear();
        Some(CompositePacket { mode, words })
    }

    /// Final flush at the end of the stream
    pub fn finish(mut self) -> Option<CompositePacket<D::Mode>> {
        self.take()
    }
}
