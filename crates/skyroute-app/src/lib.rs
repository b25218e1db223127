//! skyroute runtime.
//!
//! Wires planning and control into a 100 Hz flight loop with a background
//! replanner. The two threads share only a world view (read by the
//! replanner) and a single-slot hand-off for replanned paths.

pub mod control_loop;
pub mod handoff;
pub mod replan;
pub mod state;

pub use skyroute_core as core;
