#![allow(dead_code)]

use fsmtap::{
    avec::{AnnotationSink, SampleSource, Wake},
    sans::lines::{ChannelMask, ChannelVector},
    table::{Annotation, Row},
};
use tinyvec::ArrayVec;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: u64,
    pub end: u64,
    pub class: u16,
    pub abbr: &'static str,
}

pub fn span(start: u64, end: u64, class: u16, abbr: &'static str) -> Span {
    Span {
        start,
        end,
        class,
        abbr,
    }
}

/// Sink collecting annotations without allocating.
#[derive(Debug, Default)]
pub struct Collector {
    pub spans: ArrayVec<[Span; 256]>,
    pub row: Option<&'static str>,
}

impl AnnotationSink for Collector {
    fn put(&mut self, start: u64, end: u64, row: Row, annotation: &Annotation) {
        self.row = Some(row.id);
        self.spans.push(Span {
            start,
            end,
            class: annotation.class,
            abbr: annotation.abbr(),
        });
    }
}

pub fn lines(bits: [u8; 3]) -> ChannelVector<3> {
    ChannelVector(bits.map(|b| b != 0))
}

/// Source replaying a fixed list of reports.
#[derive(Debug)]
pub struct Script {
    pub wakes: Vec<Wake<3>>,
    pub end: u64,
    pub samplerate: Option<u64>,
    pub masks: Vec<ChannelMask>,
}

impl Script {
    pub fn new(wakes: impl IntoIterator<Item = Wake<3>>, end: u64) -> Self {
        let mut wakes = wakes.into_iter().collect::<Vec<_>>();
        wakes.reverse();

        Self {
            wakes,
            end,
            samplerate: None,
            masks: vec![],
        }
    }

    fn next(&mut self) -> Wake<3> {
        self.wakes.pop().unwrap_or(Wake::End)
    }
}

pub fn sample(position: u64, bits: [u8; 3]) -> Wake<3> {
    Wake::Sample {
        position,
        lines: lines(bits),
    }
}

impl SampleSource<3> for Script {
    type Error = std::io::Error;

    fn first(&mut self) -> Result<Wake<3>, Self::Error> {
        Ok(self.next())
    }

    fn wait(&mut self, mask: ChannelMask) -> Result<Wake<3>, Self::Error> {
        self.masks.push(mask);
        Ok(self.next())
    }

    fn end_position(&self) -> u64 {
        self.end
    }

    fn samplerate(&self) -> Option<u64> {
        self.samplerate
    }
}

/// Deterministic pseudo-random numbers for generated sequences.
pub struct Lcg(pub u64);

impl Lcg {
    pub fn below(&mut self, n: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % n
    }
}
