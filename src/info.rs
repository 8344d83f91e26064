//! Static metadata published once to the host.

use crate::table::{StateLabel, TableError};

/// A tracked digital line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub desc: &'static str,
}

/// Identity and configuration surface of a decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub longname: &'static str,
    pub desc: &'static str,
    pub license: &'static str,
    pub inputs: &'static [&'static str],
    pub outputs: &'static [&'static str],
    pub tags: &'static [&'static str],
    /// Tracked lines, least significant bit of the state code first.
    pub channels: &'static [ChannelInfo],
}

impl DecoderInfo {
    /// Verify the declared channels match those `S` is decoded from.
    pub fn verify<S: StateLabel>(&self) -> Result<(), TableError> {
        if self.channels.len() != S::CHANNELS as usize {
            Err(TableError::DeclaredChannels {
                declared: self.channels.len(),
                channels: S::CHANNELS,
            })?;
        }

        Ok(())
    }
}
