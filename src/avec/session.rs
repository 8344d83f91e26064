//! Host-facing decode session.

use core::mem;

use either::Either::{Left, Right};
use thiserror::Error;

use crate::{
    sans::{
        Segmenter,
        lines::{ChannelMask, ChannelVector},
        segment::{Event, Flushed, Interval, SegmentError, Streaming},
    },
    table::{LabelTable, TableError},
};

use super::{AnnotationSink, Metadata, SampleSource, Wake};

/// Errors occurring while running a session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Observations arrived out of order.
    #[error(transparent)]
    Segment(#[from] SegmentError),
    /// No annotation sink has been registered.
    #[error("No annotation sink has been registered.")]
    NotStarted,
    /// The session was flushed or failed, and must be reset.
    #[error("The session has finished and must be reset.")]
    Finished,
}

/// Errors occurring while decoding from a sample source.
#[derive(Debug, Error)]
pub enum DecodeError<E> {
    /// An error from the supplied sample source.
    #[error("Sample source failed: {0}")]
    Source(E),
    #[error(transparent)]
    Session(#[from] Error),
}

/// Lifecycle state of a [`Session`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Awaiting the first observation.
    Uninitialized,
    /// Holding an open interval.
    Streaming,
    /// The final interval has been emitted.
    Flushed,
    /// A sequencing error ended the session.
    Failed,
}

enum Phase {
    Uninitialized(Segmenter),
    Streaming(Streaming),
    Flushed(Flushed),
    Failed,
}

/// A decode session over `N` tracked lines, labeled by a table of `CODES`
/// entries.
///
/// The session owns its segmenter state exclusively. Hooks mirror those a
/// host calls: [`start`](Self::start) once to register the sink,
/// [`reset`](Self::reset) between streams, [`metadata`](Self::metadata) for
/// out-of-band facts, [`decode`](Self::decode) to run the blocking loop, and
/// [`flush`](Self::flush) to drain the final interval. Hosts pushing
/// observations call [`sample`](Self::sample) and [`chunk`](Self::chunk) in
/// place of `decode`.
pub struct Session<'t, S, const N: usize, const CODES: usize> {
    table: &'t LabelTable<CODES>,
    sink: Option<S>,
    phase: Phase,
    samplerate: Option<u64>,
}

impl<'t, S: AnnotationSink, const N: usize, const CODES: usize> Session<'t, S, N, CODES> {
    /// Create a session labeling intervals from `table`.
    ///
    /// Fails if the table was built for a different number of channels.
    pub fn new(table: &'t LabelTable<CODES>) -> Result<Self, TableError> {
        if table.channels() as usize != N {
            Err(TableError::DeclaredChannels {
                declared: N,
                channels: table.channels(),
            })?;
        }

        Ok(Self {
            table,
            sink: None,
            phase: Phase::Uninitialized(Segmenter::default()),
            samplerate: None,
        })
    }

    /// Register the annotation sink.
    pub fn start(&mut self, sink: S) {
        if self.sink.replace(sink).is_some() {
            tracing::debug!("Replaced a previously registered annotation sink.");
        }
    }

    /// Clear the segmenter state for a new stream, keeping the sink.
    pub fn reset(&mut self) {
        tracing::debug!("Resetting session.");
        self.phase = Phase::Uninitialized(Segmenter::default());
    }

    /// Receive an out-of-band fact from the host.
    pub fn metadata(&mut self, metadata: Metadata) {
        match metadata {
            Metadata::SampleRate(rate) => {
                tracing::debug!(rate, "Received sample rate.");
                self.samplerate = Some(rate);
            }
        }
    }

    /// Consume observations from a source until it ends, then flush.
    pub fn decode<Src: SampleSource<N>>(
        &mut self,
        source: &mut Src,
    ) -> Result<(), DecodeError<Src::Error>> {
        if self.sink.is_none() {
            Err(Error::NotStarted)?;
        }

        if let (None, Some(rate)) = (self.samplerate, source.samplerate()) {
            self.samplerate = Some(rate);
        }

        loop {
            let wake = match self.phase {
                Phase::Uninitialized(_) => source.first(),
                Phase::Streaming(_) => source.wait(ChannelMask::all(N)),
                Phase::Flushed(_) | Phase::Failed => Err(Error::Finished)?,
            }
            .map_err(DecodeError::Source)?;

            match wake {
                Wake::Sample { position, lines } => self.sample(position, lines)?,
                Wake::Chunk { position } => self.chunk(position)?,
                Wake::End => {
                    self.flush(source.end_position())?;
                    return Ok(());
                }
            }
        }
    }

    /// Record the lines sampled at `position`, for hosts pushing
    /// observations rather than lending a [`SampleSource`].
    pub fn sample(&mut self, position: u64, lines: ChannelVector<N>) -> Result<(), Error> {
        if self.sink.is_none() {
            Err(Error::NotStarted)?;
        }

        let code = lines.code();
        self.observe(Event::Edge { position, code })
    }

    /// Record the start of a new chunk of samples at `position`.
    pub fn chunk(&mut self, position: u64) -> Result<(), Error> {
        if self.sink.is_none() {
            Err(Error::NotStarted)?;
        }

        tracing::debug!(position, "Chunk boundary.");
        self.observe(Event::Chunk { position })
    }

    /// Emit the final pending interval, ending the stream at `end`.
    ///
    /// Flushing before any observation, or a second time, emits nothing.
    pub fn flush(&mut self, end: u64) -> Result<(), Error> {
        if self.sink.is_none() {
            Err(Error::NotStarted)?;
        }

        match mem::replace(&mut self.phase, Phase::Failed) {
            Phase::Uninitialized(state) => {
                tracing::debug!(end, "Flushed before any observation.");
                self.phase = Phase::Uninitialized(state);
            }
            Phase::Streaming(state) => self.observe_streaming(state, Event::End { position: end })?,
            Phase::Flushed(state) => self.phase = Phase::Flushed(state),
            Phase::Failed => Err(Error::Finished)?,
        }

        Ok(())
    }

    /// Retrieve the lifecycle state.
    pub fn state(&self) -> State {
        match self.phase {
            Phase::Uninitialized(_) => State::Uninitialized,
            Phase::Streaming(_) => State::Streaming,
            Phase::Flushed(_) => State::Flushed,
            Phase::Failed => State::Failed,
        }
    }

    /// Sampling rate in hertz, if reported.
    pub fn samplerate(&self) -> Option<u64> {
        self.samplerate
    }

    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }

    pub fn sink_mut(&mut self) -> Option<&mut S> {
        self.sink.as_mut()
    }

    pub fn into_sink(self) -> Option<S> {
        self.sink
    }

    fn observe(&mut self, event: Event) -> Result<(), Error> {
        match mem::replace(&mut self.phase, Phase::Failed) {
            Phase::Uninitialized(state) => {
                self.phase = match event {
                    Event::Edge { position, code } => {
                        Phase::Streaming(state.advance(position, code))
                    }
                    Event::Chunk { .. } | Event::End { .. } => Phase::Uninitialized(state),
                };
            }
            Phase::Streaming(state) => self.observe_streaming(state, event)?,
            Phase::Flushed(state) => {
                self.phase = Phase::Flushed(state);
                Err(Error::Finished)?;
            }
            Phase::Failed => Err(Error::Finished)?,
        }

        Ok(())
    }

    /// Advance an open interval. The phase is left failed on error.
    fn observe_streaming(&mut self, state: Streaming, event: Event) -> Result<(), Error> {
        let (closed, successor) = state.step(event)?;

        for interval in closed {
            self.emit(interval)?;
        }

        self.phase = match successor {
            Left(state) => Phase::Streaming(state),
            Right(state) => Phase::Flushed(state),
        };

        Ok(())
    }

    fn emit(&mut self, interval: Interval) -> Result<(), Error> {
        let Interval { start, end, code } = interval;

        let table = self.table;
        let sink = self.sink.as_mut().ok_or(Error::NotStarted)?;

        let annotation = table.lookup(code);
        if annotation.is_unmapped() {
            tracing::warn!(start, end, code = code.get(), "Emitting unmapped state code.");
        }

        tracing::trace!(start, end, code = code.get(), "Emitting interval.");
        sink.put(start, end, table.row(), annotation);

        Ok(())
    }
}
