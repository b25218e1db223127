//! Vehicle control for skyroute.
//!
//! A point-mass vehicle that picks a lookahead target from its active path
//! and tracks it with a cascaded position/velocity PID.

pub mod pid;
pub mod vehicle;

pub use skyroute_core as core;

pub use pid::{CascadedPid, Pid, PidGains};
pub use vehicle::{PidTuning, Vehicle};
