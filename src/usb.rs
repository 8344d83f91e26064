//! STM32F1 USB control pipe state machine, exposed on three probe lines.
//!
//! The firmware drives the state index of its control pipe onto three GPIO
//! lines. This module holds the decoder's static configuration: the declared
//! channels, the annotation table, and a convenience entrypoint decoding
//! captures in which each sample unit is one byte with the probes on bits 0
//! to 2.
//!
//! _Requires Cargo feature `derive`._

use tartan_bitfield::bitfield;

use crate::{
    avec::{self, AnnotationSink, Layout, Session},
    info::{ChannelInfo, DecoderInfo},
    sans::lines::ChannelVector,
    table::{LabelTable, StateLabel, StateTable, TableError},
};

/// Number of probe lines.
pub const CHANNELS: usize = 3;

/// Number of states encodable on the probe lines.
pub const CODES: usize = 1 << CHANNELS;

pub const DECODER: DecoderInfo = DecoderInfo {
    id: "stm32f1-usb",
    name: "STM32F1 USB",
    longname: "STM32F1 USB Device State Machine",
    desc: "Decoder for the STM32F1 USB stack's control pipe state machine.",
    license: "gplv2+",
    inputs: &["logic"],
    outputs: &["stm32f1"],
    tags: &["PhS"],
    channels: &[
        ChannelInfo {
            id: "fsm_0",
            name: "FSM#0",
            desc: "Bit #0 of UsbControlPipe::State_e",
        },
        ChannelInfo {
            id: "fsm_1",
            name: "FSM#1",
            desc: "Bit #1 of UsbControlPipe::State_e",
        },
        ChannelInfo {
            id: "fsm_2",
            name: "FSM#2",
            desc: "Bit #2 of UsbControlPipe::State_e",
        },
    ],
};

/// A session decoding the control pipe state.
pub type UsbSession<'t, S> = Session<'t, S, CHANNELS, CODES>;

/// Probes on bits 0 to 2 of a one-byte sample unit.
pub const LAYOUT: Layout<CHANNELS> = Layout {
    unitsize: 1,
    channels: [0, 1, 2],
};

/// States of the control pipe, numbered as the firmware's `State_e`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, StateTable)]
#[state(channels = 3, row = "states", description = "FSM State")]
#[repr(u8)]
pub enum ControlPipeState {
    #[state(long = "e_Undefined = 0", short = "e_Undefined", abbr = "UND")]
    Undefined = 0,
    #[state(long = "e_Idle = 1", short = "e_Idle", abbr = "IDL")]
    Idle = 1,
    #[state(long = "e_SetupReceived = 2", short = "e_SetupReceived", abbr = "SRX")]
    SetupReceived = 2,
    #[state(long = "e_DataIn = 3", short = "e_DataIn", abbr = "DIN")]
    DataIn = 3,
    #[state(long = "e_StatusOut = 4", short = "e_StatusOut", abbr = "STO")]
    StatusOut = 4,
    #[state(long = "e_DataOut = 5", short = "e_DataOut", abbr = "DOT")]
    DataOut = 5,
    #[state(long = "e_StatusIn = 6", short = "e_StatusIn", abbr = "STI")]
    StatusIn = 6,
    #[state(long = "e_Error = 7", short = "e_Error", abbr = "ERR")]
    Error = 7,
}

bitfield! {
    /// A raw sample byte with the probes on its low bits.
    pub struct ProbeLines(u8) {
        [0] fsm_0,
        [1] fsm_1,
        [2] fsm_2,
    }
}

impl ProbeLines {
    pub const fn from_byte(bits: u8) -> Self {
        Self(bits)
    }

    pub fn lines(&self) -> ChannelVector<CHANNELS> {
        ChannelVector([self.fsm_0(), self.fsm_1(), self.fsm_2()])
    }

    /// The state currently driven onto the probes.
    pub fn state(&self) -> Option<ControlPipeState> {
        ControlPipeState::from_code(self.lines().code())
    }
}

/// Build the complete, verified label table.
pub fn table() -> Result<LabelTable<CODES>, TableError> {
    DECODER.verify::<ControlPipeState>()?;
    LabelTable::from_states::<ControlPipeState>()
}

/// Decode a capture of one-byte sample units, publishing to the sink
/// registered with a session.
pub fn decode_slice<S: AnnotationSink>(
    r: &[u8],
    session: &mut UsbSession<'_, S>,
) -> Result<(), avec::slice::Error> {
    avec::slice::decode(r, LAYOUT, session)
}
