#![cfg(all(feature = "derive", feature = "std"))]

mod support;

use std::{num::NonZeroUsize, path::Path};

use csv::ReaderBuilder;
use fsmtap::{
    avec::{
        AnnotationSink, Layout, SampleSource, Wake,
        reader::{self, ReaderSource},
        slice::{self, SliceSource},
    },
    sans::lines::ChannelMask,
    table::{Annotation, Row},
    usb::{self, UsbSession},
};
use support::lines;

const PATH: &str = "fixtures/control-transfers.csv";

#[test]
fn decode_slice_control_transfers() {
    let data = capture(PATH);
    let table = usb::table().unwrap();

    let mut session = UsbSession::new(&table).unwrap();
    session.start(Validator::new(PATH));
    usb::decode_slice(&data, &mut session).unwrap();

    session.into_sink().unwrap().finish();
}

#[test]
fn decode_slice_chunked_control_transfers() {
    let data = capture(PATH);
    let table = usb::table().unwrap();

    for chunk in [1, 7, 64, 400, 5000] {
        let mut session = UsbSession::new(&table).unwrap();
        session.start(Validator::new(PATH));

        let mut source = SliceSource::new(&data, usb::LAYOUT)
            .unwrap()
            .with_chunks(NonZeroUsize::new(chunk).unwrap());
        session.decode(&mut source).unwrap();

        session.into_sink().unwrap().finish();
    }
}

#[test]
fn decode_reader_control_transfers() {
    let data = capture(PATH);
    let table = usb::table().unwrap();

    let mut session = UsbSession::new(&table).unwrap();
    session.start(Validator::new(PATH));
    fsmtap::avec::decode_reader(&mut data.as_slice(), usb::LAYOUT, &mut session).unwrap();

    session.into_sink().unwrap().finish();
}

#[test]
fn decode_reader_blocks_control_transfers() {
    let data = capture(PATH);
    let table = usb::table().unwrap();

    for block in [1, 3, 120, 1599, 1600] {
        let mut session = UsbSession::new(&table).unwrap();
        session.start(Validator::new(PATH));

        let mut source = ReaderSource::new(data.as_slice(), usb::LAYOUT, block)
            .unwrap()
            .with_samplerate(2_000_000);
        session.decode(&mut source).unwrap();

        assert_eq!(session.samplerate(), Some(2_000_000));
        session.into_sink().unwrap().finish();
    }
}

#[test]
fn slice_source_reports_chunks_and_edges() {
    let data = [0x00, 0x00, 0x01, 0x01, 0x09, 0x03];
    let mut source = SliceSource::new(&data, usb::LAYOUT)
        .unwrap()
        .with_chunks(NonZeroUsize::new(3).unwrap());
    let all = ChannelMask::all(3);

    assert_eq!(source.first(), Ok(Wake::Sample { position: 0, lines: lines([0, 0, 0]) }));
    assert_eq!(source.wait(all), Ok(Wake::Sample { position: 2, lines: lines([1, 0, 0]) }));
    assert_eq!(source.wait(all), Ok(Wake::Chunk { position: 3 }));
    // Bit 3 is not tracked.
    assert_eq!(source.wait(all), Ok(Wake::Sample { position: 5, lines: lines([1, 1, 0]) }));
    assert_eq!(source.wait(all), Ok(Wake::End));
    assert_eq!(source.end_position(), 6);
}

#[test]
fn reader_source_reports_blocks() {
    let data = [0x04, 0x04, 0x04, 0x04, 0x05];
    let mut source = ReaderSource::new(&data[..], usb::LAYOUT, 2).unwrap();
    let all = ChannelMask::all(3);

    assert!(matches!(source.first(), Ok(Wake::Sample { position: 0, .. })));
    assert!(matches!(source.wait(all), Ok(Wake::Chunk { position: 2 })));
    assert!(matches!(source.wait(all), Ok(Wake::Chunk { position: 4 })));
    assert!(matches!(source.wait(all), Ok(Wake::Sample { position: 4, .. })));
    assert!(matches!(source.wait(all), Ok(Wake::End)));
    assert_eq!(source.end_position(), 5);
}

#[test]
fn wide_units_and_trailing_bytes() {
    // Probes on bits 8, 9, and 10 of two-byte units, plus a stray byte.
    let layout = Layout {
        unitsize: 2,
        channels: [8, 9, 10],
    };
    let data = [0xFF, 0x00, 0x00, 0x01, 0x00, 0x01, 0xAA, 0x02, 0x7F];

    let mut source = SliceSource::new(&data, layout).unwrap();
    let all = ChannelMask::all(3);

    assert_eq!(source.first(), Ok(Wake::Sample { position: 0, lines: lines([0, 0, 0]) }));
    assert_eq!(source.wait(all), Ok(Wake::Sample { position: 1, lines: lines([1, 0, 0]) }));
    assert_eq!(source.wait(all), Ok(Wake::Sample { position: 3, lines: lines([0, 1, 0]) }));
    assert_eq!(source.wait(all), Ok(Wake::End));
    assert_eq!(source.end_position(), 4);

    let mut source = ReaderSource::new(&data[..], layout, 3).unwrap();
    assert!(matches!(source.first(), Ok(Wake::Sample { position: 0, .. })));
    assert!(matches!(source.wait(all), Ok(Wake::Sample { position: 1, .. })));
    assert!(matches!(source.wait(all), Ok(Wake::Chunk { position: 3 })));
    assert!(matches!(source.wait(all), Ok(Wake::Sample { position: 3, .. })));
    assert!(matches!(source.wait(all), Ok(Wake::End)));
    assert_eq!(source.end_position(), 4);
}

#[test]
fn empty_units_and_blocks_are_rejected() {
    let layout = Layout {
        unitsize: 0,
        channels: [0, 1, 2],
    };

    assert_eq!(SliceSource::new(&[], layout).err(), Some(slice::Error::EmptyUnit));
    assert!(matches!(
        ReaderSource::new(&[0u8; 0][..], layout, 16),
        Err(reader::Error::EmptyUnit)
    ));
    assert!(matches!(
        ReaderSource::new(&[0u8; 0][..], usb::LAYOUT, 0),
        Err(reader::Error::EmptyBlock)
    ));
}

#[test]
fn oversized_blocks_are_rejected() {
    let layout = Layout {
        unitsize: 2,
        channels: [0, 1, 2],
    };

    assert!(matches!(
        ReaderSource::new(&[0u8; 0][..], layout, usize::MAX),
        Err(reader::Error::OversizedBlock {
            block: usize::MAX,
            unitsize: 2
        })
    ));

    // The largest block that fits is accepted without reserving memory for it.
    let mut source = ReaderSource::new(&[1u8, 0][..], layout, usize::MAX / 2).unwrap();
    assert!(matches!(source.first(), Ok(Wake::Sample { position: 0, .. })));
}

/// Expand a fixture of `start,end,byte` runs into one-byte sample units.
fn capture(path: impl AsRef<Path>) -> Vec<u8> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();

    let mut data = vec![];

    for record in reader.records() {
        let record = record.unwrap();
        let start: usize = record[0].parse().unwrap();
        let end: usize = record[1].parse().unwrap();
        let byte: u8 = record[2].parse().unwrap();

        assert_eq!(data.len(), start);
        data.resize(end, byte);
    }

    data
}

/// Sink checking each annotation against a fixture of expected intervals.
struct Validator(Vec<Vec<String>>);

impl Validator {
    fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().with_extension("intervals.csv");

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();

        let mut expected: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|f| f.to_string()).collect())
            .collect();
        expected.reverse();

        Self(expected)
    }

    fn finish(self) {
        assert!(self.0.is_empty(), "missing intervals: {:?}", self.0);
    }
}

impl AnnotationSink for Validator {
    fn put(&mut self, start: u64, end: u64, row: Row, annotation: &Annotation) {
        let expected = self.0.pop().expect("unexpected interval");

        assert_eq!(row.id, "states");
        assert_eq!(expected[0], start.to_string());
        assert_eq!(expected[1], end.to_string());
        assert_eq!(expected[2], annotation.class.to_string());
        assert_eq!(expected[3], annotation.abbr());
    }
}
