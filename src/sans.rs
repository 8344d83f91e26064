//! Finite-state machine segmenting a stream of observations.
//!
//! This module holds the allocation-free core of the decoder. See
//! [`crate::avec`] for sessions and samplers built on top of it.
//!
//! # Architecture
//!
//! A session is represented by a non-copy state token. Feeding an observation
//! to a token's `advance` method consumes it and returns a successor token,
//! along with any interval the observation closed:
//!
//! ```text
//! Uninitialized --advance--> Streaming --advance/chunk--> Streaming
//!                                      --flush----------> Flushed --reset--> Uninitialized
//! ```
//!
//! The label of an emitted interval always trails the boundary update by one
//! observation: the position at which a change is seen is the position at
//! which the old interval ends. The first interval opens at position 0.
//!
//! Observations at one position supersede each other. An interval closed by a
//! change is held until an observation at a later position settles it, so a
//! change reverted at the same position never splits a run of one state.
//!
//! Only the initial state, re-exported for convenience as [`Segmenter`], can
//! be constructed. Some concerns are not represented in the state machine and
//! are left to the caller:
//!
//! - Detecting edges on the tracked lines. Feeding unchanged codes is allowed
//!   and merges into the open interval.
//!
//! - Looking up annotation text for emitted codes. See [`crate::table`].

pub mod lines;
pub mod segment;

/// Entrypoint to the finite-state machine.
pub type Segmenter = segment::Uninitialized;
