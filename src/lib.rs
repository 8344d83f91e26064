#![no_std]

//! A streaming decoder reconstructing a device's finite-state machine from
//! the state index it drives onto digital probe lines.
//!
//! The decoder watches a small bit-vector of channels, sampled only on edges,
//! and emits a gap-free timeline of intervals, each labeled with the state
//! code held for its whole duration.
//!
//! Most users should begin with a [`avec::Session`] and one of the samplers in
//! the [`avec`] module, labeling intervals from a table derived with
//! [`table::StateTable`]. The allocation-free state machine underneath is
//! exposed in the [`sans`] module for applications driving it directly.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `derive`: enable derive macros and the [`usb`] decoder (default).
//! - `std`: enable reader-based sampler (default).

extern crate self as fsmtap;

pub mod avec;
pub mod info;
pub mod sans;
pub mod table;
#[cfg(feature = "derive")]
pub mod usb;
