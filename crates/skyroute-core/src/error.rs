//! Error type shared by every skyroute crate.

use thiserror::Error;

use crate::types::Vec3;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("spline needs an even number of control points, at least 6 (got {count})")]
    InvalidControlPoints { count: usize },

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("invalid bounds: min {min} exceeds max {max}")]
    InvalidBounds { min: Vec3, max: Vec3 },

    #[error("lookahead radius {lookahead} is smaller than path max step {max_step}")]
    LookaheadTooSmall { lookahead: f64, max_step: f64 },

    #[error("path has no waypoints")]
    EmptyPath,

    #[error("no path set on vehicle")]
    PathNotSet,

    #[error("no paths to merge")]
    NothingToMerge,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scene error: {0}")]
    Scene(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RouteError>;
