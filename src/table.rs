//! Label tables mapping state codes to annotation text.
//!
//! A table is built once, verified at start-up, and shared read-only by every
//! decode session. Tables are usually produced from an enumeration deriving
//! [`StateTable`](macro@StateTable), but can also be assembled by hand, for
//! example to leave some codes deliberately unmapped.

use thiserror::Error;

use crate::sans::lines::{MAX_CHANNELS, StateCode};

/// Derive [`StateLabel`] for a fieldless enumeration of states.
///
/// _Requires Cargo feature `derive`._
///
/// # Example
///
/// Declare the number of tracked channels and the annotation row on the
/// enumeration, and the display text on each variant. Every variant needs an
/// explicit discriminant, which is its state code. Codes must be unique and
/// fit within the declared channels; both are checked at compile time.
///
/// ```
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, StateTable)]
/// #[state(channels = 2, row = "link", description = "Link State")]
/// enum Link {
///     #[state(abbr = "OFF")]
///     Down = 0,
///     #[state(long = "Link up", short = "Up", abbr = "UP")]
///     Up = 1,
/// }
/// ```
///
/// `short` defaults to the variant name and `long` to `"<short> = <code>"`.
/// The numeric text is always the code itself.
#[cfg(feature = "derive")]
pub use fsmtap_derive::StateTable;

/// A closed set of named state codes.
///
/// See the [`StateTable`](macro@StateTable) derive macro for an automatic
/// implementation of this trait.
pub trait StateLabel: Copy + Sized + 'static {
    /// Number of channels the codes are decoded from.
    const CHANNELS: u8;
    /// Annotation row grouping every state.
    const ROW: Row;
    /// Every state, in declaration order.
    const STATES: &'static [Self];

    /// Retrieve the state for a code, if one is declared.
    fn from_code(code: StateCode) -> Option<Self>;
    /// The code of this state.
    fn code(self) -> StateCode;
    /// Display text for this state.
    fn annotation(self) -> Annotation;
}

/// An annotation row identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Row {
    pub id: &'static str,
    pub description: &'static str,
}

/// Display payload of a state code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Annotation {
    /// Annotation class index published to the host.
    pub class: u16,
    /// Long name, short name, three-letter code, and numeric text.
    pub texts: [&'static str; 4],
}

impl Annotation {
    /// Reserved label for codes without a table entry.
    pub const UNMAPPED: Self = Self {
        class: u16::MAX,
        texts: ["Unmapped state", "Unmapped", "???", "?"],
    };

    pub fn long(&self) -> &'static str {
        self.texts[0]
    }

    pub fn short(&self) -> &'static str {
        self.texts[1]
    }

    pub fn abbr(&self) -> &'static str {
        self.texts[2]
    }

    pub fn numeric(&self) -> &'static str {
        self.texts[3]
    }

    pub fn is_unmapped(&self) -> bool {
        *self == Self::UNMAPPED
    }
}

/// An error building a label table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// The table size does not match the number of channels.
    #[error("{channels} channels encode {expected} codes, but the table holds {codes}.")]
    ChannelMismatch {
        channels: u8,
        expected: usize,
        codes: usize,
    },
    /// The declared channels do not match those the codes are decoded from.
    #[error("{declared} channels are declared, but codes are decoded from {channels}.")]
    DeclaredChannels { declared: usize, channels: u8 },
    /// An entry names a code the channels cannot encode.
    #[error("Code {0} cannot be encoded by the declared channels.")]
    OutOfRange(StateCode),
    /// Two entries name the same code.
    #[error("Code {0} is mapped more than once.")]
    Duplicate(StateCode),
    /// A code has no entry in a table required to be complete.
    #[error("Code {0} has no table entry.")]
    Missing(StateCode),
}

/// Immutable map from each of `CODES` state codes to its annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelTable<const CODES: usize> {
    channels: u8,
    row: Row,
    entries: [Option<Annotation>; CODES],
}

impl<const CODES: usize> LabelTable<CODES> {
    /// Build a table from entries, leaving missing codes unmapped.
    pub fn new(
        channels: u8,
        row: Row,
        entries: &[(StateCode, Annotation)],
    ) -> Result<Self, TableError> {
        let expected = if channels as usize <= MAX_CHANNELS {
            1 << channels
        } else {
            usize::MAX
        };

        if expected != CODES {
            Err(TableError::ChannelMismatch {
                channels,
                expected,
                codes: CODES,
            })?;
        }

        let mut table = Self {
            channels,
            row,
            entries: [None; CODES],
        };

        for &(code, annotation) in entries {
            table.insert(code, annotation)?;
        }

        Ok(table)
    }

    /// Build a complete table from an enumeration of states.
    pub fn from_states<S: StateLabel>() -> Result<Self, TableError> {
        let mut table = Self::new(S::CHANNELS, S::ROW, &[])?;

        for &state in S::STATES {
            table.insert(state.code(), state.annotation())?;
        }

        table.complete()
    }

    fn insert(&mut self, code: StateCode, annotation: Annotation) -> Result<(), TableError> {
        let Some(entry) = self.entries.get_mut(code.get() as usize) else {
            Err(TableError::OutOfRange(code))?
        };

        if entry.replace(annotation).is_some() {
            Err(TableError::Duplicate(code))?;
        }

        Ok(())
    }

    /// Verify every code has an entry.
    pub fn complete(self) -> Result<Self, TableError> {
        if let Some(code) = self.entries.iter().position(Option::is_none) {
            Err(TableError::Missing(StateCode::new(code as u16)))?;
        }

        Ok(self)
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn row(&self) -> Row {
        self.row
    }

    /// Retrieve the annotation for a code, if one is mapped.
    pub fn get(&self, code: StateCode) -> Option<&Annotation> {
        self.entries.get(code.get() as usize)?.as_ref()
    }

    /// Retrieve the annotation for a code, falling back to
    /// [`Annotation::UNMAPPED`].
    pub fn lookup(&self, code: StateCode) -> &Annotation {
        self.get(code).unwrap_or(&Annotation::UNMAPPED)
    }

    /// Every mapped annotation, in code order.
    pub fn annotations(&self) -> impl Iterator<Item = (StateCode, &Annotation)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, a)| Some((StateCode::new(i as u16), a.as_ref()?)))
    }
}
