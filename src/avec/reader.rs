//! Reader-based sampler implementation.
//!
//! _Requires Cargo feature `std`._

use std::{
    io::{self, Read},
    vec::Vec,
};

use thiserror::Error;

use crate::sans::lines::{ChannelMask, ChannelVector};

use super::{
    AnnotationSink, Layout, SampleSource, Session, Wake,
    session::{self, DecodeError},
};

extern crate std;

/// Default number of sample units read per block.
pub const DEFAULT_BLOCK: usize = 4096;

/// Errors occurring while decoding from a reader.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Sample units must hold at least one byte.
    #[error("Sample units must hold at least one byte.")]
    EmptyUnit,
    /// Blocks must hold at least one sample unit.
    #[error("Blocks must hold at least one sample unit.")]
    EmptyBlock,
    /// The block size in bytes does not fit in memory addresses.
    #[error("A block of {block} units of {unitsize} bytes is too large.")]
    OversizedBlock { block: usize, unitsize: usize },
    #[error(transparent)]
    Session(#[from] session::Error),
}

/// Edge sampler over captured logic data read block by block.
///
/// A chunk boundary is reported at the start of every block after the first.
/// Only the current block is held in memory.
#[derive(Debug)]
pub struct ReaderSource<R, const N: usize> {
    reader: R,
    layout: Layout<N>,
    block: u64, // Bytes read per block.
    samplerate: Option<u64>,
    buf: Vec<u8>,
    base: u64, // Position of the first unit in the buffer.
    len: usize,
    next: usize,
    last: Option<ChannelVector<N>>,
}

impl<R: Read, const N: usize> ReaderSource<R, N> {
    /// Create a sampler reading `block` sample units at a time.
    pub fn new(reader: R, layout: Layout<N>, block: usize) -> Result<Self, Error> {
        if layout.unitsize == 0 {
            Err(Error::EmptyUnit)?;
        }

        if block == 0 {
            Err(Error::EmptyBlock)?;
        }

        let bytes = block
            .checked_mul(layout.unitsize)
            .and_then(|bytes| u64::try_from(bytes).ok())
            .ok_or(Error::OversizedBlock {
                block,
                unitsize: layout.unitsize,
            })?;

        Ok(Self {
            reader,
            layout,
            block: bytes,
            samplerate: None,
            buf: Vec::new(),
            base: 0,
            len: 0,
            next: 0,
            last: None,
        })
    }

    pub fn with_samplerate(mut self, rate: u64) -> Self {
        self.samplerate = Some(rate);
        self
    }

    /// Replace the buffer with the next block, returning whether any sample
    /// units were read.
    fn fill(&mut self) -> Result<bool, Error> {
        let size = self.layout.unitsize;

        self.base += self.len as u64;
        self.buf.clear();

        (&mut self.reader)
            .take(self.block)
            .read_to_end(&mut self.buf)?;

        let trailing = self.buf.len() % size;
        if trailing != 0 {
            tracing::warn!(bytes = trailing, "Ignoring truncated trailing sample unit.");
            self.buf.truncate(self.buf.len() - trailing);
        }

        self.len = self.buf.len() / size;
        self.next = 0;

        Ok(self.len != 0)
    }

    fn lines(&self, i: usize) -> ChannelVector<N> {
        let size = self.layout.unitsize;
        self.layout.lines(&self.buf[i * size..][..size])
    }
}

impl<R: Read, const N: usize> SampleSource<N> for ReaderSource<R, N> {
    type Error = Error;

    fn first(&mut self) -> Result<Wake<N>, Self::Error> {
        if !self.fill()? {
            return Ok(Wake::End);
        }

        let lines = self.lines(0);
        self.last = Some(lines);
        self.next = 1;

        Ok(Wake::Sample {
            position: self.base,
            lines,
        })
    }

    fn wait(&mut self, mask: ChannelMask) -> Result<Wake<N>, Self::Error> {
        loop {
            if self.next >= self.len {
                if !self.fill()? {
                    return Ok(Wake::End);
                }

                return Ok(Wake::Chunk {
                    position: self.base,
                });
            }

            let position = self.base + self.next as u64;
            let lines = self.lines(self.next);
            self.next += 1;

            if self.last.is_none_or(|last| lines.differs(&last, mask)) {
                self.last = Some(lines);
                return Ok(Wake::Sample { position, lines });
            }
        }
    }

    fn end_position(&self) -> u64 {
        self.base + self.len as u64
    }

    fn samplerate(&self) -> Option<u64> {
        self.samplerate
    }
}

/// Decode intervals from a reader of captured logic data, publishing to the
/// sink registered with a session.
///
/// This method is also re-exported as `fsmtap::avec::decode_reader`.
///
/// _Requires Cargo feature `std`._
pub fn decode<S: AnnotationSink, const N: usize, const CODES: usize>(
    r: &mut impl Read,
    layout: Layout<N>,
    session: &mut Session<'_, S, N, CODES>,
) -> Result<(), Error> {
    let mut source = ReaderSource::new(r, layout, DEFAULT_BLOCK)?;

    session.decode(&mut source).map_err(|err| match err {
        DecodeError::Source(err) => err,
        DecodeError::Session(err) => Error::Session(err),
    })
}
