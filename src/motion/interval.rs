//! Extended-delay encoding.
//!
//! A delay of `D` timer ticks may be far longer than the compare register can
//! hold. It is split into a number of coarse chunks of `K = 2^(W-2)` ticks and
//! a fine remainder below `2K`, so that every register advance stays within
//! the counter's native range.

/// Largest coarse count the sequencer will chain.
pub const MAX_COARSE: u32 = u16::MAX as u32;

/// A delay split into coarse chunks and a fine remainder.
///
/// When `coarse > 0` the remainder carries the chunk bit, standing for the
/// one chunk that is folded into the final advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncodedInterval {
    /// Chunk-sized advances before the final one.
    pub coarse: u32,
    /// Final advance, in ticks.
    pub fine: u32,
}

impl EncodedInterval {
    /// Interval that needs no chunking.
    #[inline]
    pub const fn direct(ticks: u32) -> Self {
        Self { coarse: 0, fine: ticks }
    }

    /// Whether the interval chains chunk advances before the final edge.
    #[inline]
    pub const fn is_extended(&self) -> bool {
        self.coarse > 0
    }

    /// Total ticks represented, given the encoder's chunk size.
    #[inline]
    pub fn total_ticks(&self, chunk: u32) -> u64 {
        self.coarse as u64 * chunk as u64 + self.fine as u64
    }
}

/// Encoder for a counter of a given width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IntervalEncoder {
    counter_bits: u8,
    chunk: u32,
}

impl IntervalEncoder {
    /// Create an encoder for a `counter_bits` wide counter.
    ///
    /// Widths are clamped to 8..=32 bits.
    pub const fn new(counter_bits: u8) -> Self {
        let bits = if counter_bits < 8 {
            8
        } else if counter_bits > 32 {
            32
        } else {
            counter_bits
        };
        Self {
            counter_bits: bits,
            chunk: 1u32 << (bits - 2),
        }
    }

    /// Counter width in bits.
    #[inline]
    pub const fn counter_bits(&self) -> u8 {
        self.counter_bits
    }

    /// Coarse chunk size `K`, in ticks.
    #[inline]
    pub const fn chunk(&self) -> u32 {
        self.chunk
    }

    /// Number of ticks in one full counter wrap.
    #[inline]
    pub const fn counter_range(&self) -> u64 {
        1u64 << self.counter_bits
    }

    /// Longest delay the encoder can represent.
    #[inline]
    pub const fn max_ticks(&self) -> u64 {
        (MAX_COARSE as u64 + 2) * self.chunk as u64 - 1
    }

    /// Split a delay into coarse and fine parts.
    ///
    /// Delays are saturated to `1..=max_ticks()`; a zero advance would put the
    /// next match a full counter wrap away.
    pub fn encode(&self, ticks: u64) -> EncodedInterval {
        let ticks = ticks.clamp(1, self.max_ticks());
        let chunk = self.chunk as u64;
        let x = ticks / chunk;
        if x > 1 {
            EncodedInterval {
                coarse: (x - 1) as u32,
                fine: ((ticks % chunk) as u32) | self.chunk,
            }
        } else {
            EncodedInterval::direct(ticks as u32)
        }
    }

    /// Slowest step rate whose delay can be encoded at `clock_hz`.
    #[inline]
    pub fn minimum_speed(&self, clock_hz: u32) -> f32 {
        clock_hz as f32 / self.max_ticks() as f32
    }
}

impl Default for IntervalEncoder {
    fn default() -> Self {
        Self::new(16)
    }
}
