//! Slice-based sampler implementation.

use core::{convert::Infallible, num::NonZeroUsize};

use thiserror::Error;

use crate::sans::lines::{ChannelMask, ChannelVector};

use super::{
    AnnotationSink, Layout, SampleSource, Session, Wake,
    session::{self, DecodeError},
};

/// Errors occurring while decoding from a slice.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Sample units must hold at least one byte.
    #[error("Sample units must hold at least one byte.")]
    EmptyUnit,
    #[error(transparent)]
    Session(#[from] session::Error),
}

/// Edge sampler over captured logic data held in memory.
///
/// Positions are unit indices into the slice. Optionally, the slice can be
/// treated as a sequence of fixed-size chunks, reporting a chunk boundary at
/// the start of each one as a host delivering data block by block would.
#[derive(Debug)]
pub struct SliceSource<'a, const N: usize> {
    r: &'a [u8],
    layout: Layout<N>,
    chunk: Option<NonZeroUsize>,
    samplerate: Option<u64>,
    next: usize,
    reported: usize,
    last: Option<ChannelVector<N>>,
}

impl<'a, const N: usize> SliceSource<'a, N> {
    pub fn new(r: &'a [u8], layout: Layout<N>) -> Result<Self, Error> {
        if layout.unitsize == 0 {
            Err(Error::EmptyUnit)?;
        }

        let trailing = r.len() % layout.unitsize;
        if trailing != 0 {
            tracing::warn!(bytes = trailing, "Ignoring truncated trailing sample unit.");
        }

        Ok(Self {
            r: &r[..r.len() - trailing],
            layout,
            chunk: None,
            samplerate: None,
            next: 0,
            reported: 0,
            last: None,
        })
    }

    /// Report a chunk boundary every `units` sample units.
    pub fn with_chunks(mut self, units: NonZeroUsize) -> Self {
        self.chunk = Some(units);
        self
    }

    pub fn with_samplerate(mut self, rate: u64) -> Self {
        self.samplerate = Some(rate);
        self
    }

    fn units(&self) -> usize {
        self.r.len() / self.layout.unitsize
    }

    fn lines(&self, i: usize) -> ChannelVector<N> {
        let size = self.layout.unitsize;
        self.layout.lines(&self.r[i * size..][..size])
    }
}

impl<const N: usize> SampleSource<N> for SliceSource<'_, N> {
    type Error = Infallible;

    fn first(&mut self) -> Result<Wake<N>, Self::Error> {
        if self.units() == 0 {
            return Ok(Wake::End);
        }

        let lines = self.lines(0);
        self.last = Some(lines);
        self.next = 1;

        Ok(Wake::Sample { position: 0, lines })
    }

    fn wait(&mut self, mask: ChannelMask) -> Result<Wake<N>, Self::Error> {
        loop {
            if self.next >= self.units() {
                return Ok(Wake::End);
            }

            if let Some(chunk) = self.chunk {
                if self.next % chunk == 0 && self.reported != self.next {
                    self.reported = self.next;
                    return Ok(Wake::Chunk {
                        position: self.next as u64,
                    });
                }
            }

            let position = self.next as u64;
            let lines = self.lines(self.next);
            self.next += 1;

            if self.last.is_none_or(|last| lines.differs(&last, mask)) {
                self.last = Some(lines);
                return Ok(Wake::Sample { position, lines });
            }
        }
    }

    fn end_position(&self) -> u64 {
        self.units() as u64
    }

    fn samplerate(&self) -> Option<u64> {
        self.samplerate
    }
}

/// Decode intervals from a slice of captured logic data, publishing to the
/// sink registered with a session.
///
/// This method is also re-exported as `fsmtap::avec::decode_slice`.
pub fn decode<S: AnnotationSink, const N: usize, const CODES: usize>(
    r: &[u8],
    layout: Layout<N>,
    session: &mut Session<'_, S, N, CODES>,
) -> Result<(), Error> {
    let mut source = SliceSource::new(r, layout)?;

    session.decode(&mut source).map_err(|err| match err {
        DecodeError::Source(never) => match never {},
        DecodeError::Session(err) => Error::Session(err),
    })
}
