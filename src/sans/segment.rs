//! States segmenting observations into labeled intervals.

use either::Either::{self, Left, Right};
use thiserror::Error;

use super::lines::StateCode;

/// An error advancing the segmenter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    /// An observation or the end of the stream arrived before the previous
    /// observation.
    #[error("Observation at {found} precedes the previous observation at {previous}.")]
    OutOfOrder { previous: u64, found: u64 },
}

/// A half-open span of stream positions during which one state code was
/// continuously observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
    pub code: StateCode,
}

/// Intervals closed by one transition, in stream order.
///
/// An observation closes at most one interval. Ending the stream may close two:
/// the interval held back by a change at the latest observed position, and the
/// open interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Closed {
    held: Option<Interval>,
    last: Option<Interval>,
}

impl Iterator for Closed {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        self.held.take().or_else(|| self.last.take())
    }
}

impl From<Option<Interval>> for Closed {
    fn from(last: Option<Interval>) -> Self {
        Self { held: None, last }
    }
}

/// An input to a [`Streaming`] state token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// The tracked lines were sampled, carrying the given code.
    Edge { position: u64, code: StateCode },
    /// A new chunk of samples began. The value has not changed.
    Chunk { position: u64 },
    /// The stream ended.
    End { position: u64 },
}

/// State token awaiting the first observation of a session.
#[derive(Debug, Default)]
pub struct Uninitialized;

impl Uninitialized {
    /// Transition to another state by recording the first observation.
    ///
    /// Nothing precedes the first observation, so nothing is emitted. Returns
    /// the successor state token, holding an interval open from the stream
    /// origin, position 0, labeled with `code`.
    pub fn advance(self, position: u64, code: StateCode) -> Streaming {
        Streaming {
            start: 0,
            cursor: position,
            code,
            held: None,
        }
    }
}

/// State token holding an open interval.
///
/// A change closes the open interval, but the closed interval is held back
/// until an observation at a later position settles it. Another observation at
/// the same position may still revert the change, in which case the held
/// interval is reopened.
#[derive(Debug)]
pub struct Streaming {
    start: u64,
    cursor: u64,
    code: StateCode,
    held: Option<Interval>,
}

impl Streaming {
    /// Start of the open interval.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Position of the latest observation.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Label of the open interval.
    pub fn code(&self) -> StateCode {
        self.code
    }

    /// Closed interval not yet settled by a later observation.
    pub fn held(&self) -> Option<Interval> {
        self.held
    }

    /// Transition to another state by recording an observation.
    ///
    /// Returns the interval settled by the observation, if any, and the
    /// successor state token. An unchanged code keeps the established start, so
    /// a run of one state is never split. Observations at one position
    /// supersede each other: the latest decides the label from that position
    /// on, and an empty interval is never closed.
    pub fn advance(
        self,
        position: u64,
        code: StateCode,
    ) -> Result<(Option<Interval>, Self), SegmentError> {
        let mut successor = self.seek(position)?;
        let mut settled = None;

        if let Some(held) = successor.held {
            if held.end != position {
                settled = successor.held.take();
            } else if code == held.code {
                successor.start = held.start;
                successor.code = held.code;
                successor.held = None;
                return Ok((None, successor));
            }
        }

        if code == successor.code {
            return Ok((settled, successor));
        }

        if position != successor.start {
            successor.held = Some(Interval {
                start: successor.start,
                end: position,
                code: successor.code,
            });
            successor.start = position;
        }
        successor.code = code;

        Ok((settled, successor))
    }

    /// Transition to another state by recording a chunk boundary.
    ///
    /// Never emits and never moves the start of the open interval.
    pub fn chunk(self, position: u64) -> Result<Self, SegmentError> {
        self.seek(position)
    }

    /// Transition to the terminal state by ending the stream at `end`.
    ///
    /// Returns the remaining intervals, skipping an empty final interval, and
    /// the terminal state token.
    pub fn flush(self, end: u64) -> Result<(Closed, Flushed), SegmentError> {
        let Self {
            start, code, held, ..
        } = self.seek(end)?;

        let last = (end != start).then_some(Interval { start, end, code });

        Ok((Closed { held, last }, Flushed(())))
    }

    /// Transition to another state by processing an event.
    ///
    /// Returns the intervals closed by the event and a successor state token.
    pub fn step(self, event: Event) -> Result<(Closed, Either<Self, Flushed>), SegmentError> {
        Ok(match event {
            Event::Edge { position, code } => {
                let (settled, state) = self.advance(position, code)?;
                (settled.into(), Left(state))
            }
            Event::Chunk { position } => (Closed::default(), Left(self.chunk(position)?)),
            Event::End { position } => {
                let (closed, state) = self.flush(position)?;
                (closed, Right(state))
            }
        })
    }

    fn seek(mut self, position: u64) -> Result<Self, SegmentError> {
        if position < self.cursor {
            Err(SegmentError::OutOfOrder {
                previous: self.cursor,
                found: position,
            })?;
        }

        self.cursor = position;
        Ok(self)
    }
}

/// Terminal state token of a session.
#[derive(Debug)]
pub struct Flushed(pub(super) ());

impl Flushed {
    /// Begin a fresh session.
    pub fn reset(self) -> Uninitialized {
        Uninitialized
    }
}
