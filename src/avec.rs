//! Convenience interfaces for driving the segmenter.
//!
//! A [`Session`] pulls observations from a [`SampleSource`], runs them through
//! the [`crate::sans`] state machine, and publishes labeled intervals to an
//! [`AnnotationSink`].
//!
//! Two samplers over captured logic data are provided: [`slice::SliceSource`]
//! for data in memory, and (with the `std` feature) [`reader::ReaderSource`]
//! for data read block by block.

#[cfg(feature = "std")]
pub mod reader;
pub mod session;
pub mod slice;

#[cfg(feature = "std")]
pub use reader::decode as decode_reader;
pub use session::Session;
pub use slice::decode as decode_slice;

use crate::{
    sans::lines::{ChannelMask, ChannelVector},
    table::{Annotation, Row},
};

/// Receive labeled intervals.
///
/// The sink owns rendering and storage. Intervals arrive in stream order and
/// each one starts where the previous one ended.
pub trait AnnotationSink {
    /// Add an annotation spanning `[start, end)`.
    fn put(&mut self, start: u64, end: u64, row: Row, annotation: &Annotation);
}

impl<T: AnnotationSink + ?Sized> AnnotationSink for &mut T {
    fn put(&mut self, start: u64, end: u64, row: Row, annotation: &Annotation) {
        (**self).put(start, end, row, annotation)
    }
}

/// Produce observations of `N` tracked lines.
///
/// Both waiting methods block until they have something to report. How they
/// wait (polling, interrupts, replaying a buffer) is up to the implementation.
pub trait SampleSource<const N: usize> {
    type Error;

    /// Wait for the first available sample.
    fn first(&mut self) -> Result<Wake<N>, Self::Error>;

    /// Wait for any channel in `mask` to change.
    fn wait(&mut self, mask: ChannelMask) -> Result<Wake<N>, Self::Error>;

    /// Absolute position at which the stream ended.
    fn end_position(&self) -> u64;

    /// Sampling rate in hertz, if known.
    fn samplerate(&self) -> Option<u64> {
        None
    }
}

/// A report from a [`SampleSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wake<const N: usize> {
    /// The lines were sampled at `position`.
    Sample {
        position: u64,
        lines: ChannelVector<N>,
    },
    /// A new chunk of samples began at `position`, with no change.
    Chunk { position: u64 },
    /// The stream ended. See [`SampleSource::end_position`].
    End,
}

/// Out-of-band facts reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metadata {
    SampleRate(u64),
}

/// Placement of the tracked lines within captured sample units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout<const N: usize> {
    /// Bytes per sample unit.
    pub unitsize: usize,
    /// Bit index of each tracked channel within a unit, least significant
    /// code bit first.
    pub channels: [u8; N],
}

impl<const N: usize> Layout<N> {
    /// Read the tracked lines out of one sample unit.
    pub fn lines(&self, unit: &[u8]) -> ChannelVector<N> {
        ChannelVector::from_unit(unit, &self.channels)
    }
}
