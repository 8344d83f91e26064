//! Channel vectors and the state codes derived from them.

/// Largest number of channels a [`ChannelVector`] may track.
pub const MAX_CHANNELS: usize = 16;

/// An integer label decoded from a channel vector.
///
/// Every value in `[0, 2^N)` is a valid code for `N` tracked channels, whether
/// or not a label table assigns it text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateCode(u16);

impl StateCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn get(self) -> u16 {
        self.0
    }
}

impl core::fmt::Display for StateCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

/// Simultaneous readings of `N` tracked digital lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelVector<const N: usize>(pub [bool; N]);

impl<const N: usize> ChannelVector<N> {
    /// Read the tracked lines out of one little-endian sample unit.
    ///
    /// Channel `b` is bit `b % 8` of byte `b / 8`. Bits beyond the end of the
    /// unit read as low.
    pub fn from_unit(unit: &[u8], channels: &[u8; N]) -> Self {
        Self(core::array::from_fn(|i| {
            let b = channels[i];
            unit.get(b as usize / 8)
                .is_some_and(|byte| byte & (1 << (b % 8)) != 0)
        }))
    }

    /// Weighted sum of the lines, bit `i` contributing `2^i`.
    pub fn code(&self) -> StateCode {
        const { assert!(N <= MAX_CHANNELS, "At most 16 channels may be tracked.") };

        let code = self
            .0
            .iter()
            .enumerate()
            .fold(0, |acc, (i, &line)| acc | (line as u16) << i);

        StateCode(code)
    }

    /// Whether any channel selected by `mask` differs between two readings.
    pub fn differs(&self, other: &Self, mask: ChannelMask) -> bool {
        (0..N).any(|i| mask.contains(i) && self.0[i] != other.0[i])
    }
}

/// A set of channel indices to watch for edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelMask(u16);

impl ChannelMask {
    /// Watch the first `n` channels.
    pub const fn all(n: usize) -> Self {
        if n >= MAX_CHANNELS {
            Self(u16::MAX)
        } else {
            Self((1 << n) - 1)
        }
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn contains(self, channel: usize) -> bool {
        channel < MAX_CHANNELS && self.0 & (1 << channel) != 0
    }
}
